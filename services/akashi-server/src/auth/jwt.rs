use akashi_common::{AppError, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ISSUER: &str = "akashi";

/// Auth token claims: subject is the agent's human-readable `agent_id`
/// (not the row id), carried alongside `org_id` and `role` so handlers can
/// authorize without a database round trip per request (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub org_id: Uuid,
    pub agent_row_id: Uuid,
    pub role: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies asymmetric-signature tokens. Generalizes the
/// teacher's `JwtService` (symmetric HS256, `EncodingKey::from_secret`)
/// to an EdDSA keypair, as spec.md §6 requires.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtService {
    pub fn new(private_key_pem: &[u8], public_key_pem: &[u8], expiration_secs: i64) -> Result<Self> {
        let encoding_key = EncodingKey::from_ed_pem(private_key_pem)
            .map_err(|e| AppError::internal(format!("invalid JWT private key: {e}")))?;
        let decoding_key = DecodingKey::from_ed_pem(public_key_pem)
            .map_err(|e| AppError::internal(format!("invalid JWT public key: {e}")))?;

        Ok(Self { encoding_key, decoding_key, expiration_secs })
    }

    pub fn issue(&self, agent_id: &str, org_id: Uuid, agent_row_id: Uuid, role: &str) -> Result<(String, i64)> {
        let now = chrono::Utc::now().timestamp();
        let exp = now + self.expiration_secs;

        let claims = Claims {
            sub: agent_id.to_string(),
            org_id,
            agent_row_id,
            role: role.to_string(),
            iss: ISSUER.to_string(),
            iat: now,
            exp,
        };

        let header = Header::new(Algorithm::EdDSA);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("failed to sign token: {e}")))?;

        Ok((token, exp))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[ISSUER]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthenticated)
    }
}
