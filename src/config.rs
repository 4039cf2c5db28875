// region:    --- Imports
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

// endregion: --- Imports

// region:    --- Lifecycle Config
const MAX_PERIOD_DAYS: i64 = 3650;
const MAX_COOLDOWN_HOURS: i64 = 8760;

/// 매물 수명주기 정책 상수
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub default_expiry_days: i64,
    pub free_bump_days: i64,
    pub paid_bump_days: i64,
    pub bump_cooldown_hours: i64,
    pub price_min: i64,
    pub price_max: i64,
    pub max_images_per_listing: i64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            default_expiry_days: 3,
            free_bump_days: 3,
            paid_bump_days: 7,
            bump_cooldown_hours: 24,
            price_min: 0,
            price_max: 100_000_000,
            max_images_per_listing: 10,
        }
    }
}

impl LifecycleConfig {
    /// 환경 변수로 기본값 덮어쓰기
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            default_expiry_days: env_or("DEFAULT_EXPIRY_DAYS", defaults.default_expiry_days)?,
            free_bump_days: env_or("FREE_BUMP_DAYS", defaults.free_bump_days)?,
            paid_bump_days: env_or("PAID_BUMP_DAYS", defaults.paid_bump_days)?,
            bump_cooldown_hours: env_or("BUMP_COOLDOWN_HOURS", defaults.bump_cooldown_hours)?,
            price_min: env_or("PRICE_MIN", defaults.price_min)?,
            price_max: env_or("PRICE_MAX", defaults.price_max)?,
            max_images_per_listing: env_or(
                "MAX_IMAGES_PER_LISTING",
                defaults.max_images_per_listing,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (key, days) in [
            ("DEFAULT_EXPIRY_DAYS", self.default_expiry_days),
            ("FREE_BUMP_DAYS", self.free_bump_days),
            ("PAID_BUMP_DAYS", self.paid_bump_days),
        ] {
            anyhow::ensure!(
                (1..=MAX_PERIOD_DAYS).contains(&days),
                "{key} must be within [1, {MAX_PERIOD_DAYS}]"
            );
        }
        anyhow::ensure!(
            (0..=MAX_COOLDOWN_HOURS).contains(&self.bump_cooldown_hours),
            "BUMP_COOLDOWN_HOURS must be within [0, {MAX_COOLDOWN_HOURS}]"
        );
        anyhow::ensure!(
            0 <= self.price_min && self.price_min <= self.price_max,
            "PRICE_MIN must be within [0, PRICE_MAX]"
        );
        anyhow::ensure!(self.max_images_per_listing > 0, "MAX_IMAGES_PER_LISTING must be positive");
        Ok(())
    }
}
// endregion: --- Lifecycle Config

// region:    --- Config
/// 서비스 설정
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub kafka_brokers: String,
    pub telegram_bot_token: Option<String>,
    pub lifecycle: LifecycleConfig,
}

impl Config {
    /// 환경 변수에서 설정 로드 (.env 파일이 있으면 먼저 읽는다)
    pub fn from_env() -> Result<Self> {
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env_or("PORT", 3000)?,
            kafka_brokers: env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| "localhost:9092".to_string()),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            lifecycle: LifecycleConfig::from_env()?,
        })
    }
}
// endregion: --- Config

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a valid number")),
        Err(_) => Ok(default),
    }
}
