pub mod api_key;
pub mod jwt;

pub use api_key::{hash_api_key, verify_api_key};
pub use jwt::{Claims, JwtService};
