pub mod auth;
pub mod broker;
pub mod conflict;
pub mod config;
pub mod events;
pub mod handlers;
pub mod idempotency;
pub mod ingestion;
pub mod middleware;
pub mod notify;
pub mod outbox;
pub mod query;
pub mod state;

pub use config::Config;
pub use state::AppState;
