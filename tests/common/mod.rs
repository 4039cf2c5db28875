#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use marketplace_service::clock::ManualClock;
use marketplace_service::config::LifecycleConfig;
use marketplace_service::listing::{Listing, NewListing};
use marketplace_service::notify::{Notifier, NotifyError};
use marketplace_service::profile::{MemoryProfileDirectory, Profile};
use marketplace_service::service::MarketplaceService;
use marketplace_service::store::MemoryListingStore;
use std::sync::{Arc, Mutex};

pub const SELLER: i64 = 1001;
pub const OTHER_USER: i64 = 2002;
pub const ADMIN: i64 = 9009;

/// 전송된 알림 기록
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(i64, String)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, owner_id: i64, message: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((owner_id, message.to_string()));
        if self.fail {
            return Err(NotifyError::Rejected("503: bot unavailable".to_string()));
        }
        Ok(())
    }
}

pub struct Harness {
    pub service: Arc<MarketplaceService>,
    pub store: Arc<MemoryListingStore>,
    pub profiles: Arc<MemoryProfileDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
}

pub fn harness() -> Harness {
    harness_with_notifier(RecordingNotifier::default())
}

pub fn harness_with_notifier(notifier: RecordingNotifier) -> Harness {
    let profiles = Arc::new(MemoryProfileDirectory::new());
    profiles.upsert(Profile::new(SELLER, "판매자"));
    profiles.upsert(Profile::new(OTHER_USER, "구매자"));
    profiles.upsert(Profile {
        is_admin: true,
        ..Profile::new(ADMIN, "관리자")
    });

    let store = Arc::new(MemoryListingStore::new(profiles.clone()));
    let notifier = Arc::new(notifier);
    let clock = Arc::new(ManualClock::new(t0()));
    let service = Arc::new(MarketplaceService::new(
        store.clone(),
        profiles.clone(),
        notifier.clone(),
        clock.clone(),
        LifecycleConfig::default(),
    ));

    Harness {
        service,
        store,
        profiles,
        notifier,
        clock,
    }
}

pub fn new_listing(title: &str, price: i64, category: &str) -> NewListing {
    NewListing {
        title: title.to_string(),
        description: format!("{title} 판매합니다"),
        price,
        category: category.to_string(),
    }
}

pub async fn create(harness: &Harness, owner: i64, title: &str, price: i64, category: &str) -> Listing {
    harness
        .service
        .create(owner, new_listing(title, price, category))
        .await
        .unwrap()
}
