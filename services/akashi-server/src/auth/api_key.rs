use akashi_common::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;

/// A hash of an unreachable key, used to equalize the timing of a login
/// attempt against an `agent_id` that doesn't exist in the org (§6:
/// "401 on mismatch with a timing-equalizing dummy verify").
static DUMMY_HASH: Lazy<String> = Lazy::new(|| hash_api_key("not-a-real-key-xxxxxxxxxxxxxxxx").expect("dummy hash"));

pub fn hash_api_key(key: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(key.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("failed to hash api key: {e}")))
}

/// Constant-time verification against a stored hash. When `stored_hash` is
/// `None` (agent not found), verifies against a fixed dummy hash instead of
/// short-circuiting, so the response latency doesn't leak whether the
/// agent_id exists.
pub fn verify_api_key(key: &str, stored_hash: Option<&str>) -> bool {
    let hash_str = stored_hash.unwrap_or(DUMMY_HASH.as_str());
    match PasswordHash::new(hash_str) {
        Ok(parsed) => {
            let matched = Argon2::default().verify_password(key.as_bytes(), &parsed).is_ok();
            matched && stored_hash.is_some()
        }
        Err(_) => false,
    }
}
