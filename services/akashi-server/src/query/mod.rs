pub mod access;
pub mod search;
pub mod structured;

pub use access::{can_see_pair, compute_allowed_set};
pub use search::{semantic_search, SemanticQuery};
pub use structured::{structured_query, temporal_query, QueryFilters};
