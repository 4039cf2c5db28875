/// 보관(archive) 정책
/// 관리자 전용 강제 전환. 소유자/쿨다운 검사는 하지 않는다.
/// 알림은 보관 처리 이후에 보내며, 알림 실패는 보관 결과에 영향을 주지 않는다.
// region:    --- Imports
use crate::error::MarketError;
use crate::listing::Listing;
use crate::notify::Notifier;
use crate::profile::ProfileDirectory;
use crate::store::ListingStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Archive Notice
/// 소유자에게 보내는 보관 알림
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveNotice {
    pub owner_id: i64,
    pub listing_title: String,
    pub reason: String,
}

impl ArchiveNotice {
    pub fn for_listing(listing: &Listing, reason: &str) -> Self {
        Self {
            owner_id: listing.user_id,
            listing_title: listing.title.clone(),
            reason: reason.to_string(),
        }
    }

    pub fn message(&self, display_name: Option<&str>) -> String {
        let greeting = match display_name {
            Some(name) => format!("{name}님, "),
            None => String::new(),
        };
        format!(
            "{greeting}등록하신 매물 \"{}\"이(가) 관리자에 의해 보관 처리되었습니다.\n사유: {}",
            self.listing_title, self.reason
        )
    }
}
// endregion: --- Archive Notice

// region:    --- Archive
/// 매물 보관 처리 후 소유자에게 알림
pub async fn archive_listing(
    store: &dyn ListingStore,
    profiles: &dyn ProfileDirectory,
    notifier: &dyn Notifier,
    listing_id: i64,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<Listing, MarketError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(MarketError::validation("보관 사유를 입력해야 합니다."));
    }

    let archived = store.archive(listing_id, now).await?;
    info!(
        "{:<12} --> 매물 보관 처리 id: {}, 사유: {}",
        "Archive", listing_id, reason
    );

    let notice = ArchiveNotice::for_listing(&archived, reason);
    deliver(profiles, notifier, &notice).await;

    Ok(archived)
}

/// 알림 전송 (실패는 로그만 남긴다)
async fn deliver(profiles: &dyn ProfileDirectory, notifier: &dyn Notifier, notice: &ArchiveNotice) {
    let display_name = match profiles.display_name(notice.owner_id).await {
        Ok(name) => name,
        Err(e) => {
            warn!(
                "{:<12} --> 프로필 조회 실패, 이름 없이 알림 전송: {:?}",
                "Archive", e
            );
            None
        }
    };

    let message = notice.message(display_name.as_deref());
    if let Err(e) = notifier.notify(notice.owner_id, &message).await {
        warn!(
            "{:<12} --> 보관 알림 전송 실패 owner: {}, 오류: {}",
            "Archive", notice.owner_id, e
        );
    }
}
// endregion: --- Archive
