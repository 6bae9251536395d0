use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Structure representing JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: i64, // Issued-at (seconds since epoch)
    pub exp: i64, // Expiration timestamp
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token ttl must be at least one second")]
    InvalidTtl,
    #[error("failed to encode token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// Process-wide HMAC key used both to sign and to verify tokens.
#[derive(Clone)]
pub struct TokenSecret {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        TokenSecret {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSecret(<redacted>)")
    }
}

/// Generates a signed token for `subject_id`, valid for `ttl` from now
pub fn encode_token(
    subject_id: &str,
    role: Option<&str>,
    secret: &TokenSecret,
    ttl: Duration,
) -> Result<String, TokenError> {
    encode_token_at(subject_id, role, secret, ttl, Utc::now())
}

/// Same as [`encode_token`] with an explicit issue time.
pub fn encode_token_at(
    subject_id: &str,
    role: Option<&str>,
    secret: &TokenSecret,
    ttl: Duration,
    issued_at: DateTime<Utc>,
) -> Result<String, TokenError> {
    let expires_at = issued_at
        .checked_add_signed(ttl)
        .ok_or(TokenError::InvalidTtl)?;

    let claims = Claims {
        sub: subject_id.to_string(),
        role: role.filter(|r| !r.is_empty()).map(str::to_string),
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
    };
    // Second granularity: a sub-second ttl would produce exp == iat.
    if claims.exp <= claims.iat {
        return Err(TokenError::InvalidTtl);
    }

    encode(&Header::new(ALGORITHM), &claims, &secret.encoding).map_err(TokenError::Encode)
}

/// Validates a token and extracts its claims
pub fn decode_token(token: &str, secret: &TokenSecret) -> Result<Claims, TokenError> {
    decode_token_at(token, secret, Utc::now())
}

/// Same as [`decode_token`], judging expiry against `now`.
pub fn decode_token_at(
    token: &str,
    secret: &TokenSecret,
    now: DateTime<Utc>,
) -> Result<Claims, TokenError> {
    // Expiry is checked below against `now`; the library only verifies the
    // signature (constant-time) and the claim shape.
    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = false;
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &secret.decoding, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })?;

    if claims.exp <= claims.iat {
        return Err(TokenError::Malformed);
    }
    if now.timestamp() >= claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}
