// region:    --- Imports
use super::{ensure_image_capacity, ensure_owner_mutable, ListingStore};
use crate::database::DatabaseManager;
use crate::error::MarketError;
use crate::lifecycle::bump::{BumpPolicy, BumpRequest};
use crate::listing::{Listing, ListingImage, ListingRow, ValidListing};
use crate::query::queries::{self, BindValue};
use crate::query::ListingQuery;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Postgres Listing Store
/// Postgres 매물 저장소
pub struct PostgresListingStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresListingStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

/// 행 잠금 후 매물 조회
async fn lock_listing(
    tx: &mut Transaction<'_, Postgres>,
    listing_id: i64,
) -> Result<Listing, MarketError> {
    let row = sqlx::query_as::<_, ListingRow>(queries::GET_LISTING_FOR_UPDATE)
        .bind(listing_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| MarketError::listing_not_found(listing_id))?;
    Listing::try_from(row)
}

#[async_trait]
impl ListingStore for PostgresListingStore {
    async fn insert(
        &self,
        user_id: i64,
        listing: &ValidListing,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Listing, MarketError> {
        let row = sqlx::query_as::<_, ListingRow>(queries::INSERT_LISTING)
            .bind(user_id)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(listing.price)
            .bind(listing.category.as_str())
            .bind(expires_at)
            .bind(now)
            .fetch_one(self.db_manager.pool())
            .await?;
        Listing::try_from(row)
    }

    async fn find(&self, listing_id: i64) -> Result<Option<Listing>, MarketError> {
        sqlx::query_as::<_, ListingRow>(queries::GET_LISTING)
            .bind(listing_id)
            .fetch_optional(self.db_manager.pool())
            .await?
            .map(Listing::try_from)
            .transpose()
    }

    async fn list(&self, query: &ListingQuery) -> Result<Vec<Listing>, MarketError> {
        let composed = queries::compose_list_query(query);
        let mut statement = sqlx::query_as::<_, ListingRow>(&composed.sql);
        for bind in composed.binds {
            statement = match bind {
                BindValue::Int(value) => statement.bind(value),
                BindValue::Text(value) => statement.bind(value),
                BindValue::TextArray(values) => statement.bind(values),
            };
        }
        statement
            .fetch_all(self.db_manager.pool())
            .await?
            .into_iter()
            .map(Listing::try_from)
            .collect()
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<u64, MarketError> {
        let result = sqlx::query(queries::EXPIRE_DUE_LISTINGS)
            .bind(now)
            .execute(self.db_manager.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn bump(
        &self,
        request: &BumpRequest,
        policy: &BumpPolicy,
        now: DateTime<Utc>,
    ) -> Result<Listing, MarketError> {
        let request = *request;
        let policy = *policy;
        self.db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    // 같은 트랜잭션 안에서 잠근 행으로 쿨다운을 판단한다
                    let current = lock_listing(tx, request.listing_id).await?;
                    let plan = policy.plan(&current, &request, now)?;

                    let row = sqlx::query_as::<_, ListingRow>(queries::APPLY_BUMP)
                        .bind(current.id)
                        .bind(plan.status.as_str())
                        .bind(plan.expires_at)
                        .bind(plan.last_bumped_at)
                        .bind(plan.bump_count)
                        .bind(plan.payment_id)
                        .bind(request.paid)
                        .fetch_one(&mut **tx)
                        .await?;

                    info!(
                        "{:<12} --> 끌어올리기 기록 id: {}, 횟수: {}",
                        "Store", row.id, row.bump_count
                    );
                    Listing::try_from(row)
                })
            })
            .await
    }

    async fn archive(&self, listing_id: i64, now: DateTime<Utc>) -> Result<Listing, MarketError> {
        let row = sqlx::query_as::<_, ListingRow>(queries::ARCHIVE_LISTING)
            .bind(listing_id)
            .bind(now)
            .fetch_optional(self.db_manager.pool())
            .await?
            .ok_or_else(|| MarketError::listing_not_found(listing_id))?;
        Listing::try_from(row)
    }

    async fn mark_payment_pending(
        &self,
        listing_id: i64,
        user_id: i64,
        payment_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Listing, MarketError> {
        self.db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    let current = lock_listing(tx, listing_id).await?;
                    ensure_owner_mutable(&current, user_id)?;

                    let row = sqlx::query_as::<_, ListingRow>(queries::MARK_PAYMENT_PENDING)
                        .bind(listing_id)
                        .bind(payment_id)
                        .bind(now)
                        .fetch_one(&mut **tx)
                        .await?;
                    Listing::try_from(row)
                })
            })
            .await
    }

    async fn attach_image(
        &self,
        listing_id: i64,
        user_id: i64,
        storage_key: &str,
        max_images: i64,
        now: DateTime<Utc>,
    ) -> Result<ListingImage, MarketError> {
        let storage_key = storage_key.to_string();
        self.db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    // 매물 행 잠금으로 동시 업로드의 개수 검사를 직렬화한다
                    let current = lock_listing(tx, listing_id).await?;
                    ensure_owner_mutable(&current, user_id)?;

                    let count: i64 = sqlx::query_scalar(queries::COUNT_LISTING_IMAGES)
                        .bind(listing_id)
                        .fetch_one(&mut **tx)
                        .await?;
                    ensure_image_capacity(count, max_images)?;

                    let image = sqlx::query_as::<_, ListingImage>(queries::INSERT_LISTING_IMAGE)
                        .bind(listing_id)
                        .bind(&storage_key)
                        .bind(count as i32)
                        .bind(now)
                        .fetch_one(&mut **tx)
                        .await?;
                    Ok(image)
                })
            })
            .await
    }

    async fn image_count(&self, listing_id: i64) -> Result<i64, MarketError> {
        let count: i64 = sqlx::query_scalar(queries::COUNT_LISTING_IMAGES)
            .bind(listing_id)
            .fetch_one(self.db_manager.pool())
            .await?;
        Ok(count)
    }
}
// endregion: --- Postgres Listing Store
