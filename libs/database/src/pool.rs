use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;

/// Builds the pooled connection used for general query/write traffic. When
/// `database_url` points at an external pooler (pgbouncer in transaction
/// mode, say) the caller must not attempt session-scoped features — LISTEN,
/// NOTIFY, and prepared-statement caching across requests — on this pool;
/// those live exclusively on the dedicated [`crate::pubsub::PubSubConnection`].
///
/// Every acquired connection runs `CREATE EXTENSION IF NOT EXISTS vector`
/// once per connect so the `pgvector` wire codec (registered by the
/// `pgvector` crate's `sqlx` feature against the `vector` type name) has an
/// extension to bind against.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let connect_options = PgConnectOptions::from_str(database_url)?;

    PgPoolOptions::new()
        .max_connections(max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect_with(connect_options.disable_statement_logging())
        .await
}
