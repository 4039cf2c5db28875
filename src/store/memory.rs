// region:    --- Imports
use super::{ensure_image_capacity, ensure_owner_mutable, ListingStore};
use crate::error::MarketError;
use crate::lifecycle::bump::{BumpPolicy, BumpRequest};
use crate::listing::{Listing, ListingImage, ListingStatus, Transition, ValidListing};
use crate::profile::ProfileDirectory;
use crate::query::ListingQuery;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

// endregion: --- Imports

// region:    --- Memory Listing Store
#[derive(Default)]
struct MemoryState {
    next_listing_id: i64,
    next_image_id: i64,
    listings: BTreeMap<i64, Listing>,
    images: Vec<ListingImage>,
}

/// 메모리 매물 저장소
/// 하나의 뮤텍스 안에서 판단과 갱신을 함께 수행해 원자성을 보장한다.
pub struct MemoryListingStore {
    state: Mutex<MemoryState>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl MemoryListingStore {
    pub fn new(profiles: Arc<dyn ProfileDirectory>) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            profiles,
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 임의 상태의 매물 저장 (테스트 데이터 구성용)
    pub fn put(&self, listing: Listing) {
        let mut state = self.state();
        state.next_listing_id = state.next_listing_id.max(listing.id);
        state.listings.insert(listing.id, listing);
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn insert(
        &self,
        user_id: i64,
        listing: &ValidListing,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Listing, MarketError> {
        let mut state = self.state();
        state.next_listing_id += 1;
        let created = Listing {
            id: state.next_listing_id,
            user_id,
            title: listing.title.clone(),
            description: listing.description.clone(),
            price: listing.price,
            category: listing.category,
            status: ListingStatus::Active,
            expires_at,
            last_bumped_at: None,
            bump_count: 0,
            payment_id: None,
            pending_payment: false,
            created_at: now,
            updated_at: now,
        };
        state.listings.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find(&self, listing_id: i64) -> Result<Option<Listing>, MarketError> {
        Ok(self.state().listings.get(&listing_id).cloned())
    }

    async fn list(&self, query: &ListingQuery) -> Result<Vec<Listing>, MarketError> {
        let candidates: Vec<Listing> = self
            .state()
            .listings
            .values()
            .filter(|listing| query.matches(listing))
            .cloned()
            .collect();

        let mut visible = Vec::with_capacity(candidates.len());
        for listing in candidates {
            if query.exclude_banned && self.profiles.is_banned(listing.user_id).await? {
                continue;
            }
            visible.push(listing);
        }

        visible.sort_by(|a, b| query.compare(a, b));
        Ok(visible
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64, MarketError> {
        let mut state = self.state();
        let mut expired = 0;
        for listing in state.listings.values_mut() {
            if listing.is_due(now) {
                listing.status = listing.status.apply(Transition::Expire, listing.id)?;
                listing.updated_at = now;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn bump(
        &self,
        request: &BumpRequest,
        policy: &BumpPolicy,
        now: DateTime<Utc>,
    ) -> Result<Listing, MarketError> {
        let mut state = self.state();
        let listing = state
            .listings
            .get_mut(&request.listing_id)
            .ok_or_else(|| MarketError::listing_not_found(request.listing_id))?;
        let plan = policy.plan(listing, request, now)?;
        plan.apply_to(listing, request.paid);
        Ok(listing.clone())
    }

    async fn archive(&self, listing_id: i64, now: DateTime<Utc>) -> Result<Listing, MarketError> {
        let mut state = self.state();
        let listing = state
            .listings
            .get_mut(&listing_id)
            .ok_or_else(|| MarketError::listing_not_found(listing_id))?;
        listing.status = listing.status.apply(Transition::Archive, listing_id)?;
        listing.updated_at = now;
        Ok(listing.clone())
    }

    async fn mark_payment_pending(
        &self,
        listing_id: i64,
        user_id: i64,
        payment_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Listing, MarketError> {
        let mut state = self.state();
        let listing = state
            .listings
            .get_mut(&listing_id)
            .ok_or_else(|| MarketError::listing_not_found(listing_id))?;
        ensure_owner_mutable(listing, user_id)?;
        listing.payment_id = Some(payment_id);
        listing.pending_payment = true;
        listing.updated_at = now;
        Ok(listing.clone())
    }

    async fn attach_image(
        &self,
        listing_id: i64,
        user_id: i64,
        storage_key: &str,
        max_images: i64,
        now: DateTime<Utc>,
    ) -> Result<ListingImage, MarketError> {
        let mut state = self.state();
        let listing = state
            .listings
            .get(&listing_id)
            .ok_or_else(|| MarketError::listing_not_found(listing_id))?;
        ensure_owner_mutable(listing, user_id)?;

        let count = state
            .images
            .iter()
            .filter(|image| image.listing_id == listing_id)
            .count() as i64;
        ensure_image_capacity(count, max_images)?;

        state.next_image_id += 1;
        let image = ListingImage {
            id: state.next_image_id,
            listing_id,
            storage_key: storage_key.to_string(),
            position: count as i32,
            created_at: now,
        };
        state.images.push(image.clone());
        Ok(image)
    }

    async fn image_count(&self, listing_id: i64) -> Result<i64, MarketError> {
        Ok(self
            .state()
            .images
            .iter()
            .filter(|image| image.listing_id == listing_id)
            .count() as i64)
    }
}
// endregion: --- Memory Listing Store
