/// 매물 서비스
/// 1. 등록
/// 2. 조회 (단건/목록) - 항상 만료 처리 후 조회
/// 3. 끌어올리기 (무료/유료)
/// 4. 보관 (관리자)
/// 5. 결제 대기 표시 / 이미지 등록
// region:    --- Imports
use crate::clock::Clock;
use crate::config::LifecycleConfig;
use crate::error::MarketError;
use crate::lifecycle::{archive_listing, BumpEligibility, BumpPolicy, BumpRequest, ExpirySweeper};
use crate::listing::{Listing, ListingImage, ListingView, NewListing};
use crate::notify::Notifier;
use crate::profile::ProfileDirectory;
use crate::query::{ListingFilters, Viewer};
use crate::store::ListingStore;
use chrono::Duration;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Listing Page
/// 목록 조회 결과
#[derive(Debug, Clone, Serialize)]
pub struct ListingPage {
    pub listings: Vec<ListingView>,
    /// 반환 개수가 limit 과 같으면 true (정확한 존재 여부가 아닌 근사)
    pub has_more: bool,
}
// endregion: --- Listing Page

// region:    --- Marketplace Service
pub struct MarketplaceService {
    store: Arc<dyn ListingStore>,
    profiles: Arc<dyn ProfileDirectory>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    sweeper: ExpirySweeper,
    bump_policy: BumpPolicy,
    config: LifecycleConfig,
}

impl MarketplaceService {
    pub fn new(
        store: Arc<dyn ListingStore>,
        profiles: Arc<dyn ProfileDirectory>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            sweeper: ExpirySweeper::new(Arc::clone(&store)),
            bump_policy: BumpPolicy::from_config(&config),
            store,
            profiles,
            notifier,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// 1. 매물 등록
    pub async fn create(&self, user_id: i64, new_listing: NewListing) -> Result<Listing, MarketError> {
        let valid = new_listing.validate(&self.config)?;
        let now = self.clock.now();
        let expires_at = now + Duration::days(self.config.default_expiry_days);
        let listing = self.store.insert(user_id, &valid, expires_at, now).await?;
        info!(
            "{:<12} --> 매물 등록 id: {}, 사용자: {}",
            "Service", listing.id, user_id
        );
        Ok(listing)
    }

    /// 만료 처리만 수행
    pub async fn sweep_expired(&self) -> Result<u64, MarketError> {
        self.sweeper.sweep_expired(self.clock.now()).await
    }

    /// 2-1. 단건 조회
    pub async fn get(&self, listing_id: i64) -> Result<ListingView, MarketError> {
        let fresh = self.sweeper.fresh(self.clock.now()).await?;
        let listing = fresh.find(listing_id).await?;
        let seller_name = self.seller_name(listing.user_id).await;
        Ok(ListingView {
            listing,
            seller_name,
        })
    }

    /// 2-2. 목록 조회
    pub async fn list(
        &self,
        filters: ListingFilters,
        viewer: Viewer,
    ) -> Result<ListingPage, MarketError> {
        let query = filters.compose(viewer)?;
        let fresh = self.sweeper.fresh(self.clock.now()).await?;
        let listings = fresh.list(&query).await?;
        let has_more = query.has_more(listings.len());

        let mut names: HashMap<i64, Option<String>> = HashMap::new();
        let mut views = Vec::with_capacity(listings.len());
        for listing in listings {
            let seller_name = match names.get(&listing.user_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.seller_name(listing.user_id).await;
                    names.insert(listing.user_id, name.clone());
                    name
                }
            };
            views.push(ListingView {
                listing,
                seller_name,
            });
        }

        Ok(ListingPage {
            listings: views,
            has_more,
        })
    }

    /// 3-1. 끌어올리기 가능 여부
    pub async fn can_bump(
        &self,
        listing_id: i64,
        user_id: i64,
    ) -> Result<BumpEligibility, MarketError> {
        let now = self.clock.now();
        let fresh = self.sweeper.fresh(now).await?;
        let listing = fresh.find(listing_id).await?;
        Ok(self.bump_policy.eligibility(&listing, user_id, now))
    }

    /// 3-2. 끌어올리기
    /// 유료 끌어올리기는 결제 확인이 끝난 뒤에만 호출되어야 한다.
    pub async fn bump(&self, request: BumpRequest) -> Result<Listing, MarketError> {
        info!("{:<12} --> 끌어올리기 요청: {:?}", "Service", request);
        let listing = self
            .store
            .bump(&request, &self.bump_policy, self.clock.now())
            .await?;
        info!(
            "{:<12} --> 끌어올리기 완료 id: {}, 만료: {}",
            "Service", listing.id, listing.expires_at
        );
        Ok(listing)
    }

    /// 4. 보관 (관리자)
    pub async fn archive(&self, listing_id: i64, reason: &str) -> Result<Listing, MarketError> {
        archive_listing(
            self.store.as_ref(),
            self.profiles.as_ref(),
            self.notifier.as_ref(),
            listing_id,
            reason,
            self.clock.now(),
        )
        .await
    }

    /// 5-1. 결제 대기 표시
    pub async fn mark_payment_pending(
        &self,
        listing_id: i64,
        user_id: i64,
        payment_id: i64,
    ) -> Result<Listing, MarketError> {
        self.store
            .mark_payment_pending(listing_id, user_id, payment_id, self.clock.now())
            .await
    }

    /// 5-2. 이미지 등록
    pub async fn attach_image(
        &self,
        listing_id: i64,
        user_id: i64,
        storage_key: &str,
    ) -> Result<ListingImage, MarketError> {
        let storage_key = storage_key.trim();
        if storage_key.is_empty() {
            return Err(MarketError::validation("이미지 키가 비어 있습니다."));
        }
        self.store
            .attach_image(
                listing_id,
                user_id,
                storage_key,
                self.config.max_images_per_listing,
                self.clock.now(),
            )
            .await
    }

    pub async fn image_count(&self, listing_id: i64) -> Result<i64, MarketError> {
        self.store.image_count(listing_id).await
    }

    /// 요청자 권한
    pub async fn viewer_for(&self, user_id: Option<i64>) -> Result<Viewer, MarketError> {
        match user_id {
            Some(user_id) if self.profiles.is_admin(user_id).await? => Ok(Viewer::Admin),
            _ => Ok(Viewer::Public),
        }
    }

    /// 판매자 표시 이름 (조회 실패 시 None)
    async fn seller_name(&self, user_id: i64) -> Option<String> {
        match self.profiles.display_name(user_id).await {
            Ok(name) => name,
            Err(e) => {
                warn!(
                    "{:<12} --> 판매자 이름 조회 실패 user: {}, 오류: {}",
                    "Service", user_id, e
                );
                None
            }
        }
    }
}
// endregion: --- Marketplace Service
