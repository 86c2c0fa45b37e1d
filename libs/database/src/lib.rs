pub mod bulk;
pub mod pool;
pub mod pubsub;

pub use bulk::{bulk_insert_alternatives, bulk_insert_evidence, bulk_insert_events};
pub use pool::create_pool;
pub use pubsub::PubSubConnection;
