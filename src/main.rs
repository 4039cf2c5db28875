// region:    --- Imports
use axum::extract::DefaultBodyLimit;
use marketplace_service::clock::SystemClock;
use marketplace_service::config::Config;
use marketplace_service::database::DatabaseManager;
use marketplace_service::handlers;
use marketplace_service::message_broker::{KafkaManager, NOTIFICATIONS_TOPIC, PAYMENTS_TOPIC};
use marketplace_service::notify::{KafkaNotifier, Notifier, TelegramNotifier};
use marketplace_service::payment::PaymentConsumer;
use marketplace_service::profile::PostgresProfileDirectory;
use marketplace_service::service::MarketplaceService;
use marketplace_service::store::PostgresListingStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    // DatabaseManager 생성 및 스키마 준비
    let db_manager = Arc::new(DatabaseManager::connect(&config.database_url).await?);
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 매니저 생성 및 초기화
    let kafka_manager = KafkaManager::new(&config.kafka_brokers, "marketplace-service")?;
    if let Err(e) = kafka_manager.initialize().await {
        error!("{:<12} --> Kafka 초기화 실패: {}", "Main", e);
        return Err(anyhow::anyhow!(e));
    }
    kafka_manager.create_topic(PAYMENTS_TOPIC, 3, 1).await?;
    kafka_manager.create_topic(NOTIFICATIONS_TOPIC, 3, 1).await?;
    info!("{:<12} --> Kafka 초기화 성공", "Main");

    // 알림: 봇 토큰이 있으면 텔레그램 직접 호출, 없으면 Kafka 로 봇에 전달
    let notifier: Arc<dyn Notifier> = match &config.telegram_bot_token {
        Some(token) => Arc::new(TelegramNotifier::new(token)),
        None => Arc::new(KafkaNotifier::new(kafka_manager.get_producer())),
    };

    let service = Arc::new(MarketplaceService::new(
        Arc::new(PostgresListingStore::new(Arc::clone(&db_manager))),
        Arc::new(PostgresProfileDirectory::new(db_manager.get_pool())),
        notifier,
        Arc::new(SystemClock),
        config.lifecycle.clone(),
    ));

    // 결제 이벤트 소비 시작
    let payment_consumer = PaymentConsumer::new(Arc::clone(&service), kafka_manager.get_consumer());
    tokio::spawn(async move {
        payment_consumer.start().await;
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes_all = handlers::router(service)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
