//! Role tokens: issuing, verifying and the bearer middleware.
//!
//! Tokens are HS256 JWTs carrying the caller's role (`user_type`) and an
//! expiry (`exp`). Protected routes resolve the role once in
//! [`auth_middleware`] and read it back as an `Extension<Role>`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use common::Role;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Claims carried by a role token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_type: Role,
    pub exp: i64,
}

/// Signs and verifies role tokens with a shared secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Issues a token for `role` that expires after the configured TTL.
    pub fn issue(&self, role: Role) -> Result<String, ApiError> {
        let claims = Claims {
            user_type: role,
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, ApiError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }

    /// Verifies a token and returns the role it was issued for.
    pub fn verify(&self, token: &str) -> Result<Role, ApiError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.user_type)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                ApiError::Unauthorized("invalid or expired token".to_string())
            })
    }
}

/// Resolves the caller's role from the `Authorization: Bearer` header.
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenCodec>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let role = tokens.verify(extract_bearer(req.headers())?)?;
    req.extensions_mut().insert(role);
    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let missing = || ApiError::Unauthorized("missing bearer token".to_string());

    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(missing)?
        .to_str()
        .map_err(|_| missing())?;

    let token = value.strip_prefix("Bearer ").ok_or_else(missing)?.trim();
    if token.is_empty() {
        return Err(missing());
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", Duration::hours(1))
    }

    #[test]
    fn test_issue_then_verify() {
        let codec = codec();
        for role in [Role::Employee, Role::Moderator] {
            let token = codec.issue(role).unwrap();
            assert_eq!(codec.verify(&token).unwrap(), role);
        }
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = codec().issue(Role::Moderator).unwrap();
        let other = TokenCodec::new("other-secret", Duration::hours(1));
        assert!(matches!(other.verify(&token), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = codec();
        let token = codec
            .encode(&Claims {
                user_type: Role::Employee,
                exp: (Utc::now() - Duration::minutes(5)).timestamp(),
            })
            .unwrap();
        assert!(matches!(codec.verify(&token), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(codec().verify("not.a.token").is_err());
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def");
    }
}
