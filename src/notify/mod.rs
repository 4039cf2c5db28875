/// 알림 협력자
/// 알림은 보내고 잊는(fire-and-forget) 방식이다. 실패는 호출자가 로그로만 남긴다.
// region:    --- Imports
use crate::message_broker::{KafkaProducer, NOTIFICATIONS_TOPIC};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

// endregion: --- Imports

// region:    --- Notify Error
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Kafka 전송 실패: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("HTTP 전송 실패: {0}")]
    Http(#[from] reqwest::Error),

    #[error("직렬화 실패: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("텔레그램 API 거부: {0}")]
    Rejected(String),
}
// endregion: --- Notify Error

// region:    --- Notifier Trait
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, owner_id: i64, message: &str) -> Result<(), NotifyError>;
}

/// 봇으로 전달되는 알림 메시지
#[derive(Debug, Serialize)]
pub struct NotificationMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
}
// endregion: --- Notifier Trait

// region:    --- Kafka Notifier
/// notifications 토픽에 발행 (텔레그램 봇이 소비)
pub struct KafkaNotifier {
    producer: Arc<KafkaProducer>,
}

impl KafkaNotifier {
    pub fn new(producer: Arc<KafkaProducer>) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl Notifier for KafkaNotifier {
    async fn notify(&self, owner_id: i64, message: &str) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(&NotificationMessage {
            chat_id: owner_id,
            text: message,
        })?;
        self.producer
            .send_message(NOTIFICATIONS_TOPIC, &owner_id.to_string(), &payload)
            .await?;
        Ok(())
    }
}
// endregion: --- Kafka Notifier

// region:    --- Telegram Notifier
/// 텔레그램 Bot API sendMessage 직접 호출
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str) -> Self {
        Self::with_base_url("https://api.telegram.org", bot_token)
    }

    pub fn with_base_url(base_url: &str, bot_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!(
                "{}/bot{}/sendMessage",
                base_url.trim_end_matches('/'),
                bot_token
            ),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, owner_id: i64, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&NotificationMessage {
                chat_id: owner_id,
                text: message,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!("{status}: {body}")));
        }
        info!("{:<12} --> 텔레그램 알림 전송 완료: {}", "Notifier", owner_id);
        Ok(())
    }
}
// endregion: --- Telegram Notifier
