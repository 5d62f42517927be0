use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// The authenticated caller. Passed explicitly into every job operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
}

impl Principal {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<u64>,
}

/// HS256 bearer token verification against a shared secret.
pub struct TokenVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::EmptySecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is checked when present but not demanded.
        validation.required_spec_claims.clear();

        Ok(Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Resolve a raw token to the principal named by its `sub` claim.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(AuthError::InvalidToken)?;

        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::MissingSubject);
        }
        Ok(Principal::new(data.claims.sub))
    }

    /// Mint a token for `subject`, optionally expiring after `ttl`.
    pub fn issue(&self, subject: &str, ttl: Option<Duration>) -> Result<String, AuthError> {
        let exp = match ttl {
            Some(ttl) => {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|_| AuthError::Clock)?;
                Some((now + ttl).as_secs())
            }
            None => None,
        };
        let claims = Claims {
            sub: subject.to_string(),
            exp,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::InvalidToken)
    }
}

/// Extract the token from an `Authorization` header value.
///
/// Accepts `Bearer <token>` and the older `Token <token>` scheme.
pub fn token_from_header(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    let known = scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token");
    (known && !token.is_empty()).then_some(token)
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token secret must not be empty")]
    EmptySecret,

    #[error("Invalid token: {0}")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("Token has no subject")]
    MissingSubject,

    #[error("System clock is before the Unix epoch")]
    Clock,
}
