use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Identity, UserRole};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub must_change_password: bool,
    pub iat: usize,
    pub exp: usize,
}

pub fn create_token(
    identity: &Identity,
    secret: &[u8],
    expires_in_seconds: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::seconds(expires_in_seconds)).timestamp() as usize;
    let claims = TokenClaims {
        sub: identity.user_id.to_string(),
        email: identity.email.clone(),
        role: identity.role,
        must_change_password: identity.must_change_password,
        iat,
        exp,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

/// Decode a bearer token into an identity.
///
/// Malformed, expired, or wrongly signed tokens yield `None`; callers treat
/// that as an anonymous request.
pub fn verify_token(token: &str, secret: &[u8]) -> Option<Identity> {
    let decoded = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )
    .ok()?;

    let claims = decoded.claims;
    let user_id = Uuid::parse_str(&claims.sub).ok()?;

    Some(Identity {
        user_id,
        email: claims.email,
        role: claims.role,
        must_change_password: claims.must_change_password,
    })
}
