use serde::Deserialize;

/// Process configuration, loaded once at startup via `envy::prefixed("AKASHI_")`
/// (teacher's `Config::from_env()` pattern). Durations and sizes carry their
/// unit in the field name rather than accepting unit-suffixed strings.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub database_url: String,
    pub database_max_connections: u32,

    /// Optional SSE backplane hint; the broker's primary transport is
    /// Postgres LISTEN/NOTIFY (§4.10, §9). Unused today, kept for config
    /// compatibility with deployments that still set it.
    pub redis_url: Option<String>,

    pub jwt_public_key_path: String,
    pub jwt_private_key_path: String,
    pub jwt_expiration_secs: i64,

    pub embedding_provider: Option<String>,
    pub embedding_local_url: Option<String>,
    pub embedding_remote_url: Option<String>,
    pub embedding_remote_api_key: Option<String>,
    pub embedding_dimensions: usize,
    pub embedding_char_budget: usize,

    pub vector_index_url: String,
    pub vector_index_api_key: Option<String>,

    pub bootstrap_admin_secret: Option<String>,

    pub rate_limit_rate: f64,
    pub rate_limit_burst: f64,

    pub event_buffer_flush_threshold: usize,
    pub event_buffer_flush_interval_ms: u64,

    pub outbox_poll_interval_ms: u64,
    pub outbox_batch_size: i64,
    pub outbox_max_attempts: i32,

    pub conflict_significance_threshold: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("AKASHI_").from_env::<Self>()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: String::new(),
            database_max_connections: 10,
            redis_url: None,
            jwt_public_key_path: String::new(),
            jwt_private_key_path: String::new(),
            jwt_expiration_secs: 3600,
            embedding_provider: None,
            embedding_local_url: None,
            embedding_remote_url: None,
            embedding_remote_api_key: None,
            embedding_dimensions: 1536,
            embedding_char_budget: 8000,
            vector_index_url: String::new(),
            vector_index_api_key: None,
            bootstrap_admin_secret: None,
            rate_limit_rate: 10.0,
            rate_limit_burst: 50.0,
            event_buffer_flush_threshold: 500,
            event_buffer_flush_interval_ms: 1000,
            outbox_poll_interval_ms: 2000,
            outbox_batch_size: 100,
            outbox_max_attempts: 10,
            conflict_significance_threshold: 0.30,
        }
    }
}
