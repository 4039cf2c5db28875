// region:    --- Imports
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

pub const NOTIFICATIONS_TOPIC: &str = "notifications";
pub const PAYMENTS_TOPIC: &str = "payments";
const INIT_TOPIC: &str = "marketplace-init";

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
}

impl KafkaProducer {
    pub fn new(brokers: &str) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
        })
    }

    /// 메시지 전송
    pub async fn send_message(&self, topic: &str, key: &str, value: &str) -> Result<(), KafkaError> {
        info!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", topic, key
        );
        let record = FutureRecord::to(topic).key(key).payload(value);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| e)?;

        Ok(())
    }
}

// endregion: --- Kafka Producer

// region:    --- Kafka Consumer
pub struct KafkaConsumer {
    consumer: Arc<StreamConsumer>,
}

impl KafkaConsumer {
    pub fn new(brokers: &str, group_id: &str) -> Result<Self, KafkaError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .set("allow.auto.create.topics", "true")
            .create()?;

        Ok(KafkaConsumer {
            consumer: Arc::new(consumer),
        })
    }

    /// 토픽 메시지를 T 로 역직렬화해 handler 로 전달 (종료하지 않는다)
    pub async fn consume<T, F, Fut>(&self, topic: &str, handler: F) -> Result<(), KafkaError>
    where
        T: DeserializeOwned + std::fmt::Debug,
        F: Fn(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        info!("{:<12} --> Kafka 구독 시작: topic={}", "Consumer", topic);
        self.consumer.subscribe(&[topic])?;

        loop {
            match self.consumer.recv().await {
                Ok(message) => {
                    debug!(
                        "{:<12} --> 메시지 수신: topic={}, partition={}, offset={}",
                        "Consumer",
                        message.topic(),
                        message.partition(),
                        message.offset()
                    );

                    let Some(payload) = message.payload() else {
                        warn!("{:<12} --> 빈 페이로드 수신", "Consumer");
                        continue;
                    };
                    match serde_json::from_slice::<T>(payload) {
                        Ok(event) => {
                            debug!("{:<12} --> deserialize 성공: {:?}", "Consumer", event);
                            handler(event).await;
                        }
                        Err(e) => error!("{:<12} --> deserialize 오류: {:?}", "Consumer", e),
                    }
                }
                Err(e) => error!("{:<12} --> 메시지 수신 오류: {:?}", "Consumer", e),
            }
        }
    }
}

// endregion: --- Kafka Consumer

// region:    --- Kafka Manager
pub struct KafkaManager {
    producer: Arc<KafkaProducer>,
    consumer: Arc<KafkaConsumer>,
    brokers: String,
}

impl KafkaManager {
    pub fn new(brokers: &str, group_id: &str) -> Result<Self, KafkaError> {
        Ok(KafkaManager {
            producer: Arc::new(KafkaProducer::new(brokers)?),
            consumer: Arc::new(KafkaConsumer::new(brokers, group_id)?),
            brokers: brokers.to_string(),
        })
    }

    pub fn get_producer(&self) -> Arc<KafkaProducer> {
        Arc::clone(&self.producer)
    }

    pub fn get_consumer(&self) -> Arc<KafkaConsumer> {
        Arc::clone(&self.consumer)
    }

    /// 브로커 연결 확인 (초기화 메시지 왕복)
    pub async fn initialize(&self) -> Result<(), String> {
        info!("{:<12} --> Kafka 초기화 시작", "Manager");

        self.consumer
            .consumer
            .subscribe(&[INIT_TOPIC])
            .map_err(|e| e.to_string())?;

        self.producer
            .send_message(INIT_TOPIC, "init-key", "init-message")
            .await
            .map_err(|e| e.to_string())?;

        let mut attempts = 0;
        let max_attempts = 10;
        while attempts < max_attempts {
            match time::timeout(Duration::from_secs(1), self.consumer.consumer.recv()).await {
                Ok(Ok(message)) => {
                    if message.payload() == Some(b"init-message".as_slice()) {
                        info!("{:<12} --> Kafka 초기화 메시지 수신 확인", "Manager");
                        self.consumer.consumer.unsubscribe();
                        return Ok(());
                    }
                }
                Ok(Err(e)) => error!(
                    "{:<12} --> Kafka 초기화 메시지 수신 오류: {:?}",
                    "Manager", e
                ),
                Err(_) => {
                    attempts += 1;
                    warn!(
                        "{:<12} --> Kafka 초기화 메시지 수신 대기 중... (시도: {}/{})",
                        "Manager", attempts, max_attempts
                    );
                }
            }
        }

        Err("Kafka 초기화 메시지 수신 실패".to_string())
    }

    /// 토픽 생성
    pub async fn create_topic(
        &self,
        topic_name: &str,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), KafkaError> {
        info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Manager", topic_name);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()?;

        let new_topic = NewTopic::new(
            topic_name,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        let results = admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await?;
        for result in results {
            match result {
                Ok(topic) => info!("{:<12} --> Kafka 토픽 생성 성공: {}", "Manager", topic),
                // 이미 존재하는 토픽은 그대로 사용
                Err((topic, code)) => warn!(
                    "{:<12} --> Kafka 토픽 생성 건너뜀: {} ({:?})",
                    "Manager", topic, code
                ),
            }
        }
        Ok(())
    }
}

// endregion: --- Kafka Manager
