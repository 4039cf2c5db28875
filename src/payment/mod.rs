/// 결제 이벤트 소비
/// 결제 처리(인보이스, 결제 확인)는 텔레그램 봇이 담당하고,
/// 이 서비스는 결과 이벤트만 받아 매물 상태에 반영한다.
// region:    --- Imports
use crate::error::MarketError;
use crate::lifecycle::BumpRequest;
use crate::listing::Listing;
use crate::message_broker::{KafkaConsumer, PAYMENTS_TOPIC};
use crate::service::MarketplaceService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Payment Event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PaymentEvent {
    /// 결제 생성 (아직 미확인)
    Initiated {
        listing_id: i64,
        user_id: i64,
        payment_id: i64,
    },
    /// 결제 확인 완료 -> 유료 끌어올리기
    Confirmed {
        listing_id: i64,
        user_id: i64,
        payment_id: i64,
    },
}
// endregion: --- Payment Event

// region:    --- Payment Consumer
pub struct PaymentConsumer {
    service: Arc<MarketplaceService>,
    kafka_consumer: Arc<KafkaConsumer>,
}

impl PaymentConsumer {
    pub fn new(service: Arc<MarketplaceService>, kafka_consumer: Arc<KafkaConsumer>) -> Self {
        Self {
            service,
            kafka_consumer,
        }
    }

    /// payments 토픽 소비 시작
    pub async fn start(&self) {
        let service = Arc::clone(&self.service);
        if let Err(e) = self
            .kafka_consumer
            .consume(PAYMENTS_TOPIC, move |event: PaymentEvent| {
                let service = Arc::clone(&service);
                async move {
                    if let Err(e) = process_payment_event(&service, event).await {
                        error!("{:<12} --> 결제 이벤트 처리 오류: {}", "Payment", e);
                    }
                }
            })
            .await
        {
            error!("{:<12} --> 결제 이벤트 소비 오류: {:?}", "Payment", e);
        }
    }
}

/// 결제 이벤트 처리
pub async fn process_payment_event(
    service: &MarketplaceService,
    event: PaymentEvent,
) -> Result<Listing, MarketError> {
    match event {
        PaymentEvent::Initiated {
            listing_id,
            user_id,
            payment_id,
        } => {
            info!(
                "{:<12} --> 결제 대기 listing: {}, payment: {}",
                "Payment", listing_id, payment_id
            );
            service
                .mark_payment_pending(listing_id, user_id, payment_id)
                .await
        }
        PaymentEvent::Confirmed {
            listing_id,
            user_id,
            payment_id,
        } => {
            info!(
                "{:<12} --> 결제 확인 listing: {}, payment: {}",
                "Payment", listing_id, payment_id
            );
            let result = service
                .bump(BumpRequest::paid(listing_id, user_id, Some(payment_id)))
                .await;
            if let Err(MarketError::Cooldown {
                hours_until_eligible,
            }) = &result
            {
                // 결제는 이미 끝났으므로 봇 쪽에서 환불/재시도 판단이 필요하다
                warn!(
                    "{:<12} --> 결제된 끌어올리기가 쿨다운으로 거절됨 payment: {}, 남은 시간: {}",
                    "Payment", payment_id, hours_until_eligible
                );
            }
            result
        }
    }
}
// endregion: --- Payment Consumer
