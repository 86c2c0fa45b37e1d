use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use akashi_embeddings::EmbeddingConfig;
use akashi_ratelimit::TokenBucketLimiter;
use akashi_search::{VectorIndexClient, VectorIndexConfig};
use akashi_server::auth::JwtService;
use akashi_server::broker::Broker;
use akashi_server::conflict::ConflictScorer;
use akashi_server::events::EventBuffer;
use akashi_server::ingestion::TraceService;
use akashi_server::middleware::{AuthMiddleware, RateLimit, RequestId};
use akashi_server::{AppState, Config};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_max_level(Level::INFO)
        .init();

    dotenv::dotenv().ok();
    let config = Config::from_env().expect("failed to load configuration");

    info!("starting akashi-server on {}:{}", config.host, config.port);

    let pool = akashi_database::create_pool(&config.database_url, config.database_max_connections)
        .await
        .expect("failed to create database pool");

    let pubsub = Arc::new(akashi_database::PubSubConnection::new(config.database_url.clone()));
    pubsub.subscribe("decisions").await.expect("failed to subscribe to decisions channel");
    pubsub.subscribe("conflicts").await.expect("failed to subscribe to conflicts channel");
    pubsub.connect_with_backoff().await.expect("failed to establish pub/sub connection");

    let jwt_private_key = std::fs::read(&config.jwt_private_key_path).expect("failed to read JWT private key");
    let jwt_public_key = std::fs::read(&config.jwt_public_key_path).expect("failed to read JWT public key");
    let jwt = Arc::new(
        JwtService::new(&jwt_private_key, &jwt_public_key, config.jwt_expiration_secs).expect("failed to initialize JWT service"),
    );

    let embeddings = akashi_embeddings::select_provider(&EmbeddingConfig {
        provider: config.embedding_provider.clone(),
        local_url: config.embedding_local_url.clone(),
        remote_url: config.embedding_remote_url.clone(),
        remote_api_key: config.embedding_remote_api_key.clone(),
        dimensions: config.embedding_dimensions,
        char_budget: config.embedding_char_budget,
    })
    .await;

    let vector_index: Arc<dyn akashi_search::VectorIndex> = Arc::new(
        VectorIndexClient::new(VectorIndexConfig {
            base_url: config.vector_index_url.clone(),
            api_key: config.vector_index_api_key.clone(),
            timeout_ms: 5000,
            dimensions: config.embedding_dimensions as u32,
        })
        .expect("failed to build vector index client"),
    );
    if let Err(err) = vector_index.ensure_collection().await {
        tracing::warn!(error = %err, "failed to ensure vector index collection, continuing degraded");
    }

    let rate_limiter: Arc<dyn akashi_ratelimit::RateLimiter> =
        Arc::new(TokenBucketLimiter::new(config.rate_limit_rate, config.rate_limit_burst));

    let broker = Arc::new(Broker::new());
    tokio::spawn({
        let broker = broker.clone();
        let pubsub = pubsub.clone();
        async move { broker.run(pubsub).await }
    });

    let event_buffer = Arc::new(EventBuffer::new(
        pool.clone(),
        config.event_buffer_flush_threshold,
        Duration::from_millis(config.event_buffer_flush_interval_ms),
    ));
    tokio::spawn({
        let event_buffer = event_buffer.clone();
        async move { event_buffer.run().await }
    });

    let outbox = Arc::new(akashi_server::outbox::OutboxWorker::new(
        pool.clone(),
        vector_index.clone(),
        Duration::from_millis(config.outbox_poll_interval_ms),
        config.outbox_batch_size,
        config.outbox_max_attempts,
    ));
    tokio::spawn({
        let outbox = outbox.clone();
        async move { outbox.run().await }
    });

    let conflict_scorer =
        Arc::new(ConflictScorer::new(pool.clone(), vector_index.clone(), config.conflict_significance_threshold));

    let trace_service =
        Arc::new(TraceService::new(pool.clone(), embeddings.clone(), config.embedding_char_budget, conflict_scorer.clone()));

    let config = Arc::new(config);
    let shutdown_pool = pool.clone();

    let state = AppState {
        pool,
        pubsub,
        jwt,
        embeddings,
        vector_index,
        rate_limiter,
        broker,
        event_buffer: event_buffer.clone(),
        conflict_scorer,
        trace_service,
        config: config.clone(),
    };

    let rate_limit_burst = config.rate_limit_burst;
    let jwt_for_middleware = state.jwt.clone();
    let rate_limiter_for_middleware = state.rate_limiter.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(Cors::permissive())
            .wrap(RateLimit::new(rate_limiter_for_middleware.clone(), rate_limit_burst))
            .wrap(AuthMiddleware::new(jwt_for_middleware.clone()))
            .wrap(RequestId)
            .configure(akashi_server::handlers::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    let result = server.await;

    info!("http server stopped, draining background workers");
    event_buffer.drain(Duration::from_secs(10)).await;

    match tokio::time::timeout(Duration::from_secs(10), outbox.process_batch()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(error = %err, "final outbox drain cycle failed"),
        Err(_) => tracing::warn!("outbox drain timed out, remaining entries left for the next instance"),
    }

    shutdown_pool.close().await;

    result
}
