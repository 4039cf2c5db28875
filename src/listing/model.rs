use crate::config::LifecycleConfig;
use crate::error::MarketError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TITLE_MAX_CHARS: usize = 120;
pub const DESCRIPTION_MAX_CHARS: usize = 4000;

// region:    --- Status
/// 매물 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Expired,
    Archived,
}

/// 상태 전이 원인
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Expire,
    Bump,
    Archive,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "active",
            ListingStatus::Expired => "expired",
            ListingStatus::Archived => "archived",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ListingStatus::Archived)
    }

    /// 상태 전이 규칙
    /// - 만료는 active 에서만 가능
    /// - 끌어올리기는 active/expired 에서 active 로
    /// - 보관은 어느 상태에서나 가능 (archived -> archived 는 그대로)
    pub fn apply(self, transition: Transition, listing_id: i64) -> Result<Self, MarketError> {
        match (self, transition) {
            (_, Transition::Archive) => Ok(ListingStatus::Archived),
            (ListingStatus::Archived, _) => Err(MarketError::Archived(listing_id)),
            (ListingStatus::Active, Transition::Expire) => Ok(ListingStatus::Expired),
            (ListingStatus::Expired, Transition::Expire) => Err(MarketError::validation(
                "이미 만료된 매물입니다.",
            )),
            (_, Transition::Bump) => Ok(ListingStatus::Active),
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ListingStatus::Active),
            "expired" => Ok(ListingStatus::Expired),
            "archived" => Ok(ListingStatus::Archived),
            other => Err(MarketError::validation(format!(
                "알 수 없는 매물 상태: {other}"
            ))),
        }
    }
}
// endregion: --- Status

// region:    --- Category
/// 매물 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Electronics,
    Clothing,
    Books,
    Home,
    Sports,
    Toys,
    Vehicles,
    Services,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Electronics,
        Category::Clothing,
        Category::Books,
        Category::Home,
        Category::Sports,
        Category::Toys,
        Category::Vehicles,
        Category::Services,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Clothing => "clothing",
            Category::Books => "books",
            Category::Home => "home",
            Category::Sports => "sports",
            Category::Toys => "toys",
            Category::Vehicles => "vehicles",
            Category::Services => "services",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| MarketError::validation(format!("알 수 없는 카테고리: {s}")))
    }
}
// endregion: --- Category

// region:    --- Listing
/// 매물 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category: Category,
    pub status: ListingStatus,
    pub expires_at: DateTime<Utc>,
    pub last_bumped_at: Option<DateTime<Utc>>,
    pub bump_count: i64,
    pub payment_id: Option<i64>,
    pub pending_payment: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    /// 만료 시각이 지났지만 아직 sweep 되지 않은 상태
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ListingStatus::Active && self.expires_at <= now
    }
}

/// listings 테이블 행 (상태/카테고리는 TEXT)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub last_bumped_at: Option<DateTime<Utc>>,
    pub bump_count: i64,
    pub payment_id: Option<i64>,
    pub pending_payment: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ListingRow> for Listing {
    type Error = MarketError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(Listing {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            price: row.price,
            category: row.category.parse()?,
            status: row.status.parse()?,
            expires_at: row.expires_at,
            last_bumped_at: row.last_bumped_at,
            bump_count: row.bump_count,
            payment_id: row.payment_id,
            pending_payment: row.pending_payment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// 조회 결과 (판매자 표시 이름 포함)
#[derive(Debug, Clone, Serialize)]
pub struct ListingView {
    #[serde(flatten)]
    pub listing: Listing,
    pub seller_name: Option<String>,
}
// endregion: --- Listing

// region:    --- New Listing
/// 매물 등록 요청
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub category: String,
}

/// 검증을 통과한 매물 등록 요청
#[derive(Debug, Clone, PartialEq)]
pub struct ValidListing {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category: Category,
}

impl NewListing {
    pub fn validate(self, config: &LifecycleConfig) -> Result<ValidListing, MarketError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(MarketError::validation("제목을 입력해야 합니다."));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(MarketError::validation(format!(
                "제목은 {TITLE_MAX_CHARS}자를 넘을 수 없습니다."
            )));
        }

        let description = self.description.trim().to_string();
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(MarketError::validation(format!(
                "설명은 {DESCRIPTION_MAX_CHARS}자를 넘을 수 없습니다."
            )));
        }

        if self.price < config.price_min || self.price > config.price_max {
            return Err(MarketError::validation(format!(
                "가격은 {}에서 {} 사이여야 합니다.",
                config.price_min, config.price_max
            )));
        }

        Ok(ValidListing {
            title,
            description,
            price: self.price,
            category: self.category.parse()?,
        })
    }
}
// endregion: --- New Listing

// region:    --- Listing Image
/// 매물 이미지 (실제 파일은 외부 오브젝트 스토리지에 있다)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListingImage {
    pub id: i64,
    pub listing_id: i64,
    pub storage_key: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}
// endregion: --- Listing Image
