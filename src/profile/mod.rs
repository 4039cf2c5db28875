/// 프로필 협력자
/// 사용자 인증/세션은 외부에서 처리되고, 여기서는 차단 여부와 표시 이름만 조회한다.
// region:    --- Imports
use crate::error::MarketError;
use crate::query::queries;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// endregion: --- Imports

// region:    --- Profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub user_id: i64,
    pub display_name: Option<String>,
    pub is_banned: bool,
    pub is_admin: bool,
}

impl Profile {
    pub fn new(user_id: i64, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: Some(display_name.into()),
            is_banned: false,
            is_admin: false,
        }
    }
}
// endregion: --- Profile

// region:    --- Profile Directory Trait
/// 프로필 조회 트레이트
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn find(&self, user_id: i64) -> Result<Option<Profile>, MarketError>;

    async fn is_banned(&self, user_id: i64) -> Result<bool, MarketError> {
        Ok(self
            .find(user_id)
            .await?
            .is_some_and(|profile| profile.is_banned))
    }

    async fn is_admin(&self, user_id: i64) -> Result<bool, MarketError> {
        Ok(self
            .find(user_id)
            .await?
            .is_some_and(|profile| profile.is_admin))
    }

    async fn display_name(&self, user_id: i64) -> Result<Option<String>, MarketError> {
        Ok(self
            .find(user_id)
            .await?
            .and_then(|profile| profile.display_name))
    }
}
// endregion: --- Profile Directory Trait

// region:    --- Postgres Profile Directory
pub struct PostgresProfileDirectory {
    pool: Arc<PgPool>,
}

impl PostgresProfileDirectory {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileDirectory for PostgresProfileDirectory {
    async fn find(&self, user_id: i64) -> Result<Option<Profile>, MarketError> {
        let profile = sqlx::query_as::<_, Profile>(queries::GET_PROFILE)
            .bind(user_id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(profile)
    }
}
// endregion: --- Postgres Profile Directory

// region:    --- Memory Profile Directory
/// 메모리 프로필 저장소 (테스트/로컬 실행용)
#[derive(Default)]
pub struct MemoryProfileDirectory {
    profiles: RwLock<HashMap<i64, Profile>>,
}

impl MemoryProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, profile: Profile) {
        self.profiles
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(profile.user_id, profile);
    }

    pub fn set_banned(&self, user_id: i64, banned: bool) {
        let mut profiles = self.profiles.write().unwrap_or_else(|e| e.into_inner());
        let profile = profiles.entry(user_id).or_insert(Profile {
            user_id,
            display_name: None,
            is_banned: false,
            is_admin: false,
        });
        profile.is_banned = banned;
    }
}

#[async_trait]
impl ProfileDirectory for MemoryProfileDirectory {
    async fn find(&self, user_id: i64) -> Result<Option<Profile>, MarketError> {
        Ok(self
            .profiles
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&user_id)
            .cloned())
    }
}
// endregion: --- Memory Profile Directory

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_user_is_not_banned_and_has_no_name() {
        let directory = MemoryProfileDirectory::new();
        assert!(!directory.is_banned(1).await.unwrap());
        assert!(!directory.is_admin(1).await.unwrap());
        assert_eq!(directory.display_name(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_banned_keeps_display_name() {
        let directory = MemoryProfileDirectory::new();
        directory.upsert(Profile::new(5, "민수"));
        directory.set_banned(5, true);
        assert!(directory.is_banned(5).await.unwrap());
        assert_eq!(
            directory.display_name(5).await.unwrap().as_deref(),
            Some("민수")
        );
    }
}
