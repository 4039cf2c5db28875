/// 만료 처리기
/// 별도 스케줄러 없이 조회 직전에 호출된다.
/// 조회는 FreshListings 를 통해서만 가능하고, FreshListings 는 sweep 을 거쳐야 얻을 수 있다.
// region:    --- Imports
use crate::error::MarketError;
use crate::listing::Listing;
use crate::query::ListingQuery;
use crate::store::ListingStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Expiry Sweeper
pub struct ExpirySweeper {
    store: Arc<dyn ListingStore>,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self { store }
    }

    /// active 이면서 만료 시각이 지난 매물을 expired 로 변경
    /// 여러 번 호출해도 안전하다 (이미 expired 인 매물은 건드리지 않는다).
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, MarketError> {
        let expired = self.store.expire_due(now).await?;
        if expired > 0 {
            info!("{:<12} --> 만료 처리된 매물: {}건", "Sweeper", expired);
        } else {
            debug!("{:<12} --> 만료 대상 매물 없음", "Sweeper");
        }
        Ok(expired)
    }

    /// sweep 후 일관된 상태의 조회 핸들 반환
    pub async fn fresh(&self, now: DateTime<Utc>) -> Result<FreshListings<'_>, MarketError> {
        let swept = self.sweep_expired(now).await?;
        Ok(FreshListings {
            store: self.store.as_ref(),
            swept,
        })
    }
}
// endregion: --- Expiry Sweeper

// region:    --- Fresh Listings
/// sweep 이 끝난 저장소에 대한 조회 핸들
pub struct FreshListings<'a> {
    store: &'a dyn ListingStore,
    swept: u64,
}

impl FreshListings<'_> {
    /// 이 조회 직전에 만료 처리된 매물 수
    pub fn swept(&self) -> u64 {
        self.swept
    }

    pub async fn find(&self, listing_id: i64) -> Result<Listing, MarketError> {
        self.store
            .find(listing_id)
            .await?
            .ok_or_else(|| MarketError::listing_not_found(listing_id))
    }

    pub async fn list(&self, query: &ListingQuery) -> Result<Vec<Listing>, MarketError> {
        self.store.list(query).await
    }
}
// endregion: --- Fresh Listings
