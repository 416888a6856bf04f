//! Session token issuing and verification.
//!
//! Tokens are signed JWTs carried exclusively in the `authToken` cookie.
//! Registration issues a token scoped to the user id only; login embeds
//! username and email as well.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// Name of the session cookie.
pub const AUTH_COOKIE_NAME: &str = "authToken";

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued at (unix seconds).
    pub iat: u64,
    /// Expiry (unix seconds).
    pub exp: u64,
}

/// Issues and verifies signed session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Sign a token for the given identity, expiring after the configured ttl.
    pub fn issue(
        &self,
        user_id: &str,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.map(|s| s.to_string()),
            email: email.map(|s| s.to_string()),
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode session token: {}", e);
            AppError::Internal("Failed to generate token".to_string())
        })
    }

    /// Decode and validate a token, returning its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Session token validation failed: {}", e);
                AppError::Forbidden("Forbidden".to_string())
            })
    }
}

/// Build the session cookie.
///
/// The frontend lives on a different origin, so the cookie must allow
/// cross-site requests: SameSite=None requires Secure.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .build()
}

/// Build the removal cookie for logout.
///
/// Uses the identical attribute set as `session_cookie` so the browser
/// matches and drops the stored cookie.
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .build()
}

/// Extractor for session-protected handlers.
///
/// Rejects with 401 when the cookie is missing and 403 when the token is
/// invalid or expired.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar
            .get(AUTH_COOKIE_NAME)
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

        let claims = state.tokens().verify(cookie.value())?;
        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify_round_trips_claims() {
        let issuer = TokenIssuer::new("test-secret", 3600);
        let token = issuer
            .issue("user-1", Some("alice"), Some("alice@example.com"))
            .unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn registration_token_carries_only_the_user_id() {
        let issuer = TokenIssuer::new("test-secret", 3600);
        let token = issuer.issue("user-2", None, None).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-2");
        assert!(claims.username.is_none());
        assert!(claims.email.is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", 3600);
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: "user-1".to_string(),
            username: None,
            email: None,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let result = issuer.verify(&token);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = TokenIssuer::new("secret-a", 3600);
        let other = TokenIssuer::new("secret-b", 3600);
        let token = other.issue("user-1", None, None).unwrap();

        let result = issuer.verify(&token);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let issuer = TokenIssuer::new("test-secret", 3600);
        let mut token = issuer.issue("user-1", None, None).unwrap();
        token.push('x');

        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn session_and_clear_cookies_share_attributes() {
        let set = session_cookie("tok".to_string());
        let clear = clear_session_cookie();

        assert_eq!(set.name(), AUTH_COOKIE_NAME);
        assert_eq!(set.path(), clear.path());
        assert_eq!(set.http_only(), clear.http_only());
        assert_eq!(set.secure(), clear.secure());
        assert_eq!(set.same_site(), clear.same_site());
    }
}
