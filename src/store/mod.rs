// region:    --- Imports
use crate::error::MarketError;
use crate::lifecycle::bump::{BumpPolicy, BumpRequest};
use crate::listing::{Listing, ListingImage, ValidListing};
use crate::query::ListingQuery;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// endregion: --- Imports

mod memory;
mod postgres;

pub use memory::MemoryListingStore;
pub use postgres::PostgresListingStore;

// region:    --- Listing Store Trait
/// 매물 저장소 트레이트
/// 상태를 바꾸는 연산은 모두 하나의 원자적 단위로 실행되어야 한다.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn insert(
        &self,
        user_id: i64,
        listing: &ValidListing,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Listing, MarketError>;

    async fn find(&self, listing_id: i64) -> Result<Option<Listing>, MarketError>;

    /// 조건에 맞는 매물 목록 (차단 사용자 제외 포함)
    async fn list(&self, query: &ListingQuery) -> Result<Vec<Listing>, MarketError>;

    /// active 이면서 만료 시각이 지난 매물을 expired 로 변경, 변경된 개수 반환
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64, MarketError>;

    /// 자격 검증과 갱신을 한 번에 수행
    async fn bump(
        &self,
        request: &BumpRequest,
        policy: &BumpPolicy,
        now: DateTime<Utc>,
    ) -> Result<Listing, MarketError>;

    async fn archive(&self, listing_id: i64, now: DateTime<Utc>) -> Result<Listing, MarketError>;

    async fn mark_payment_pending(
        &self,
        listing_id: i64,
        user_id: i64,
        payment_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Listing, MarketError>;

    /// 개수 확인과 추가를 한 번에 수행
    async fn attach_image(
        &self,
        listing_id: i64,
        user_id: i64,
        storage_key: &str,
        max_images: i64,
        now: DateTime<Utc>,
    ) -> Result<ListingImage, MarketError>;

    async fn image_count(&self, listing_id: i64) -> Result<i64, MarketError>;
}
// endregion: --- Listing Store Trait

/// 소유자 + 보관 여부 검증 (결제/이미지 공통)
pub(crate) fn ensure_owner_mutable(listing: &Listing, user_id: i64) -> Result<(), MarketError> {
    if !listing.is_owned_by(user_id) {
        return Err(MarketError::NotOwner {
            listing_id: listing.id,
            user_id,
        });
    }
    if listing.status.is_terminal() {
        return Err(MarketError::Archived(listing.id));
    }
    Ok(())
}

/// 이미지 개수 상한 검증
pub(crate) fn ensure_image_capacity(count: i64, max_images: i64) -> Result<(), MarketError> {
    if count >= max_images {
        return Err(MarketError::validation(format!(
            "매물당 이미지는 최대 {max_images}장까지 등록할 수 있습니다."
        )));
    }
    Ok(())
}
