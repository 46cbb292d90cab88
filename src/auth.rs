//! Bearer token verification.
//!
//! The gateway does not issue tokens; an external identity service does.
//! [`TokenVerifier`] is the seam at which an opaque credential string is
//! mapped to a validated principal or rejected, with [`JwtVerifier`] as the
//! production implementation (HS256, shared secret).

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Validated principal carried by a verified token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Subject: the authenticated username.
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Credential rejection reasons.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token's expiry has passed.
    #[error("token has expired")]
    Expired,

    /// The token is malformed or its signature does not verify.
    #[error("token is invalid")]
    Invalid,
}

/// Maps an opaque credential string to a validated principal.
pub trait TokenVerifier: Send + Sync + std::fmt::Debug {
    /// Verifies the credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the credential is expired, malformed, or
    /// fails signature verification.
    fn verify(&self, token: &str) -> Result<TokenPayload, AuthError>;
}

/// HS256 JWT verifier over a shared symmetric secret.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Creates a verifier for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier").finish_non_exhaustive()
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<TokenPayload, AuthError> {
        jsonwebtoken::decode::<TokenPayload>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;

    const SECRET: &str = "test-secret";

    fn issue(sub: &str, lifetime_secs: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let payload = TokenPayload {
            sub: sub.to_string(),
            iat: now,
            exp: now + lifetime_secs,
        };
        let Ok(token) = jsonwebtoken::encode(
            &Header::default(),
            &payload,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        ) else {
            panic!("token must encode");
        };
        token
    }

    #[test]
    fn valid_token_yields_principal() {
        let verifier = JwtVerifier::new(SECRET);
        let Ok(payload) = verifier.verify(&issue("passenger-1", 600)) else {
            panic!("token must verify");
        };
        assert_eq!(payload.sub, "passenger-1");
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let verifier = JwtVerifier::new(SECRET);
        // Well past the default validation leeway.
        let result = verifier.verify(&issue("passenger-1", -3600));
        assert!(matches!(result, Err(AuthError::Expired)));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let verifier = JwtVerifier::new(SECRET);
        let result = verifier.verify("not-a-token");
        assert!(matches!(result, Err(AuthError::Invalid)));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let verifier = JwtVerifier::new("other-secret");
        let result = verifier.verify(&issue("passenger-1", 600));
        assert!(matches!(result, Err(AuthError::Invalid)));
    }
}
