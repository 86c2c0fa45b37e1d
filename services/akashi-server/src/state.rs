use crate::auth::JwtService;
use crate::broker::Broker;
use crate::conflict::ConflictScorer;
use crate::events::EventBuffer;
use crate::ingestion::TraceService;
use crate::Config;
use akashi_database::PubSubConnection;
use akashi_embeddings::EmbeddingProvider;
use akashi_ratelimit::RateLimiter;
use akashi_search::VectorIndex;
use sqlx::PgPool;
use std::sync::Arc;

/// The single struct of dependencies every handler closes over (§9 Design
/// Notes). Built once in `main` and shared behind `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub pubsub: Arc<PubSubConnection>,
    pub jwt: Arc<JwtService>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub broker: Arc<Broker>,
    pub event_buffer: Arc<EventBuffer>,
    pub conflict_scorer: Arc<ConflictScorer>,
    pub trace_service: Arc<TraceService>,
    pub config: Arc<Config>,
}
