/// 끌어올리기(bump) 정책
/// 1. 자격 판단 (소유자 / 보관 여부 / 쿨다운)
/// 2. 끌어올린 뒤의 상태 계산
/// 만료 시각은 남은 기간에 더하지 않고 끌어올린 시점부터 다시 계산한다.
// region:    --- Imports
use crate::config::LifecycleConfig;
use crate::error::MarketError;
use crate::listing::{Listing, ListingStatus, Transition};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Bump Request
/// 끌어올리기 요청
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BumpRequest {
    pub listing_id: i64,
    pub user_id: i64,
    pub paid: bool,
    /// 결제 완료된 유료 끌어올리기의 결제 id
    pub payment_id: Option<i64>,
}

impl BumpRequest {
    pub fn free(listing_id: i64, user_id: i64) -> Self {
        Self {
            listing_id,
            user_id,
            paid: false,
            payment_id: None,
        }
    }

    pub fn paid(listing_id: i64, user_id: i64, payment_id: Option<i64>) -> Self {
        Self {
            listing_id,
            user_id,
            paid: true,
            payment_id,
        }
    }
}
// endregion: --- Bump Request

// region:    --- Eligibility
/// 거절 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BumpDenial {
    NotOwner,
    Archived,
    Cooldown,
}

/// 끌어올리기 가능 여부
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BumpEligibility {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<BumpDenial>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_until_eligible: Option<i64>,
}

impl BumpEligibility {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            hours_until_eligible: None,
        }
    }

    fn denied(reason: BumpDenial) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            hours_until_eligible: None,
        }
    }
}
// endregion: --- Eligibility

// region:    --- Bump Plan
/// 끌어올리기 후 한 번에 기록할 값
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BumpPlan {
    pub status: ListingStatus,
    pub expires_at: DateTime<Utc>,
    pub last_bumped_at: DateTime<Utc>,
    pub bump_count: i64,
    pub payment_id: Option<i64>,
}
// endregion: --- Bump Plan

// region:    --- Bump Policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BumpPolicy {
    pub cooldown: Duration,
    pub free_extension: Duration,
    pub paid_extension: Duration,
}

impl Default for BumpPolicy {
    fn default() -> Self {
        Self::from_config(&LifecycleConfig::default())
    }
}

impl BumpPolicy {
    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self {
            cooldown: Duration::hours(config.bump_cooldown_hours),
            free_extension: Duration::days(config.free_bump_days),
            paid_extension: Duration::days(config.paid_bump_days),
        }
    }

    pub fn extension(&self, paid: bool) -> Duration {
        if paid {
            self.paid_extension
        } else {
            self.free_extension
        }
    }

    /// 쿨다운 잔여 시간 (시간 단위, 올림)
    pub fn hours_until_eligible(&self, listing: &Listing, now: DateTime<Utc>) -> Option<i64> {
        let last_bumped_at = listing.last_bumped_at?;
        let remaining = self.cooldown - (now - last_bumped_at);
        if remaining <= Duration::zero() {
            return None;
        }
        let hours = remaining.num_hours();
        if remaining > Duration::hours(hours) {
            Some(hours + 1)
        } else {
            Some(hours)
        }
    }

    /// 자격 판단: 소유자 -> 보관 여부 -> 쿨다운 순서
    pub fn eligibility(
        &self,
        listing: &Listing,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> BumpEligibility {
        if !listing.is_owned_by(user_id) {
            return BumpEligibility::denied(BumpDenial::NotOwner);
        }
        if listing.status.is_terminal() {
            return BumpEligibility::denied(BumpDenial::Archived);
        }
        match self.hours_until_eligible(listing, now) {
            Some(hours) => BumpEligibility {
                hours_until_eligible: Some(hours),
                ..BumpEligibility::denied(BumpDenial::Cooldown)
            },
            None => BumpEligibility::allowed(),
        }
    }

    /// 자격 검증 후 기록할 값 계산
    /// 저장소는 자격 판단에 사용한 행을 같은 원자적 단위 안에서 갱신해야 한다.
    pub fn plan(
        &self,
        listing: &Listing,
        request: &BumpRequest,
        now: DateTime<Utc>,
    ) -> Result<BumpPlan, MarketError> {
        let eligibility = self.eligibility(listing, request.user_id, now);
        match eligibility.reason {
            None => {}
            Some(BumpDenial::NotOwner) => {
                return Err(MarketError::NotOwner {
                    listing_id: listing.id,
                    user_id: request.user_id,
                })
            }
            Some(BumpDenial::Archived) => return Err(MarketError::Archived(listing.id)),
            Some(BumpDenial::Cooldown) => {
                return Err(MarketError::Cooldown {
                    hours_until_eligible: eligibility.hours_until_eligible.unwrap_or(1),
                })
            }
        }

        Ok(BumpPlan {
            status: listing.status.apply(Transition::Bump, listing.id)?,
            expires_at: now + self.extension(request.paid),
            last_bumped_at: now,
            bump_count: listing.bump_count + 1,
            payment_id: if request.paid {
                request.payment_id.or(listing.payment_id)
            } else {
                listing.payment_id
            },
        })
    }
}

impl BumpPlan {
    /// 메모리 상의 매물에 계획 적용
    pub fn apply_to(&self, listing: &mut Listing, paid: bool) {
        listing.status = self.status;
        listing.expires_at = self.expires_at;
        listing.last_bumped_at = Some(self.last_bumped_at);
        listing.bump_count = self.bump_count;
        listing.payment_id = self.payment_id;
        if paid {
            listing.pending_payment = false;
        }
        listing.updated_at = self.last_bumped_at;
    }
}
// endregion: --- Bump Policy
