/// 매물 검색 조건 조합
/// 서로 다른 조건은 AND, 다중값 조건(상태) 안에서는 OR 로 묶는다.
// region:    --- Imports
use crate::error::MarketError;
use crate::listing::{Category, Listing, ListingStatus};
use serde::{Deserialize, Deserializer};
use std::cmp::Ordering;

// endregion: --- Imports

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

// region:    --- Sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}
// endregion: --- Sort

// region:    --- Filters
/// 호출자가 넘기는 검색 조건 (모두 선택)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilters {
    #[serde(default, deserialize_with = "comma_separated_statuses")]
    pub status: Option<Vec<ListingStatus>>,
    pub category: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub search: Option<String>,
    pub user_id: Option<i64>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// 조회하는 사용자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Public,
    Admin,
}

/// 검증과 기본값 적용이 끝난 검색 조건
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub statuses: Vec<ListingStatus>,
    pub category: Option<Category>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub search: Option<String>,
    pub user_id: Option<i64>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub limit: i64,
    pub offset: i64,
    pub exclude_banned: bool,
}

impl ListingFilters {
    /// 조건 검증 및 기본값 적용
    pub fn compose(self, viewer: Viewer) -> Result<ListingQuery, MarketError> {
        let mut statuses = match self.status {
            Some(statuses) if !statuses.is_empty() => statuses,
            // 상태 조건이 없으면 active 만 노출
            _ => vec![ListingStatus::Active],
        };
        statuses.sort_by_key(|status| status.as_str());
        statuses.dedup();

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(str::parse::<Category>)
            .transpose()?;

        if let (Some(min), Some(max)) = (self.price_min, self.price_max) {
            if min > max {
                return Err(MarketError::validation(
                    "최소 가격이 최대 가격보다 클 수 없습니다.",
                ));
            }
        }
        if self.price_min.is_some_and(|min| min < 0) || self.price_max.is_some_and(|max| max < 0)
        {
            return Err(MarketError::validation("가격 조건은 0 이상이어야 합니다."));
        }

        let search = self
            .search
            .map(|term| term.trim().to_string())
            .filter(|term| !term.is_empty());

        Ok(ListingQuery {
            statuses,
            category,
            price_min: self.price_min,
            price_max: self.price_max,
            search,
            user_id: self.user_id,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: self.offset.unwrap_or(0).max(0),
            exclude_banned: viewer != Viewer::Admin,
        })
    }
}
// endregion: --- Filters

// region:    --- In-memory evaluation
impl ListingQuery {
    /// 차단 사용자 제외를 뺀 나머지 조건 검사
    pub fn matches(&self, listing: &Listing) -> bool {
        if !self.statuses.contains(&listing.status) {
            return false;
        }
        if self.category.is_some_and(|category| category != listing.category) {
            return false;
        }
        if self.price_min.is_some_and(|min| listing.price < min) {
            return false;
        }
        if self.price_max.is_some_and(|max| listing.price > max) {
            return false;
        }
        if self.user_id.is_some_and(|user_id| user_id != listing.user_id) {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = listing.title.to_lowercase().contains(&term)
                || listing.description.to_lowercase().contains(&term)
                || listing.category.as_str().contains(&term);
            if !hit {
                return false;
            }
        }
        true
    }

    /// 정렬 순서 (동률이면 id 로 고정)
    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let primary = match self.sort_by {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Price => a.price.cmp(&b.price),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// 다음 페이지 존재 여부 (반환 개수 == limit 근사)
    pub fn has_more(&self, returned: usize) -> bool {
        returned as i64 == self.limit
    }
}
// endregion: --- In-memory evaluation

fn comma_separated_statuses<'de, D>(deserializer: D) -> Result<Option<Vec<ListingStatus>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<ListingStatus>().map_err(serde::de::Error::custom))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn listing(id: i64, price: i64, category: Category, status: ListingStatus) -> Listing {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(id);
        Listing {
            id,
            user_id: 10,
            title: format!("Item {id}"),
            description: "Good condition".to_string(),
            price,
            category,
            status,
            expires_at: created + Duration::days(3),
            last_bumped_at: None,
            bump_count: 0,
            payment_id: None,
            pending_payment: false,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_empty_filters_default_to_active_newest_first() {
        let query = ListingFilters::default().compose(Viewer::Public).unwrap();
        assert_eq!(query.statuses, vec![ListingStatus::Active]);
        assert_eq!(query.sort_by, SortField::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.offset, 0);
        assert!(query.exclude_banned);

        assert!(!query.matches(&listing(1, 10, Category::Books, ListingStatus::Expired)));
        assert!(!query.matches(&listing(1, 10, Category::Books, ListingStatus::Archived)));
        assert!(query.matches(&listing(1, 10, Category::Books, ListingStatus::Active)));
    }

    #[test]
    fn test_empty_status_set_falls_back_to_active() {
        let filters = ListingFilters {
            status: Some(vec![]),
            ..Default::default()
        };
        let query = filters.compose(Viewer::Admin).unwrap();
        assert_eq!(query.statuses, vec![ListingStatus::Active]);
        assert!(!query.exclude_banned);
    }

    #[test]
    fn test_limit_and_offset_are_bounded() {
        let filters = ListingFilters {
            limit: Some(1000),
            offset: Some(-5),
            ..Default::default()
        };
        let query = filters.compose(Viewer::Public).unwrap();
        assert_eq!(query.limit, MAX_LIMIT);
        assert_eq!(query.offset, 0);

        let filters = ListingFilters {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(filters.compose(Viewer::Public).unwrap().limit, 1);
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let filters = ListingFilters {
            price_min: Some(500),
            price_max: Some(2000),
            ..Default::default()
        };
        let query = filters.compose(Viewer::Public).unwrap();
        assert!(query.matches(&listing(1, 500, Category::Books, ListingStatus::Active)));
        assert!(query.matches(&listing(2, 2000, Category::Books, ListingStatus::Active)));
        assert!(!query.matches(&listing(3, 499, Category::Books, ListingStatus::Active)));
        assert!(!query.matches(&listing(4, 2001, Category::Books, ListingStatus::Active)));
    }

    #[test]
    fn test_inverted_price_range_is_rejected() {
        let filters = ListingFilters {
            price_min: Some(10),
            price_max: Some(5),
            ..Default::default()
        };
        assert!(matches!(
            filters.compose(Viewer::Public),
            Err(MarketError::Validation(_))
        ));
    }

    #[test]
    fn test_search_matches_title_description_or_category() {
        let filters = ListingFilters {
            search: Some("  BOOK ".to_string()),
            ..Default::default()
        };
        let query = filters.compose(Viewer::Public).unwrap();

        let mut by_title = listing(1, 10, Category::Other, ListingStatus::Active);
        by_title.title = "Notebook".to_string();
        let mut by_description = listing(2, 10, Category::Other, ListingStatus::Active);
        by_description.description = "comes with a bookmark".to_string();
        let by_category = listing(3, 10, Category::Books, ListingStatus::Active);
        let miss = listing(4, 10, Category::Toys, ListingStatus::Active);

        assert!(query.matches(&by_title));
        assert!(query.matches(&by_description));
        assert!(query.matches(&by_category));
        assert!(!query.matches(&miss));
    }

    #[test]
    fn test_compare_orders_by_price_then_id() {
        let filters = ListingFilters {
            sort_by: Some(SortField::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        };
        let query = filters.compose(Viewer::Public).unwrap();
        let mut items = vec![
            listing(3, 300, Category::Books, ListingStatus::Active),
            listing(1, 100, Category::Books, ListingStatus::Active),
            listing(2, 100, Category::Books, ListingStatus::Active),
        ];
        items.sort_by(|a, b| query.compare(a, b));
        let ids: Vec<i64> = items.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_status_list_parses_from_query_string() {
        let filters: ListingFilters =
            serde_json::from_value(serde_json::json!({"status": "active, expired,active"}))
                .unwrap();
        let query = filters.compose(Viewer::Public).unwrap();
        assert_eq!(
            query.statuses,
            vec![ListingStatus::Active, ListingStatus::Expired]
        );

        let bad: Result<ListingFilters, _> =
            serde_json::from_value(serde_json::json!({"status": "sold"}));
        assert!(bad.is_err());
    }

    #[test]
    fn test_has_more_is_count_equals_limit() {
        let filters = ListingFilters {
            limit: Some(2),
            ..Default::default()
        };
        let query = filters.compose(Viewer::Public).unwrap();
        assert!(query.has_more(2));
        assert!(!query.has_more(1));
    }
}
