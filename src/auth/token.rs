use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::types::AuthClaims;
use crate::shared::AppError;
use crate::user::models::UserModel;

/// Token lifetime in seconds (1 hour).
const TOKEN_TTL_SECS: i64 = 3600;

/// Configuration for JWT token operations
///
/// The secret is injected from `AppConfig` so issuance and verification
/// always use the same key.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Creates a signed token carrying the user's identity claims
    #[instrument(skip(self, user))]
    pub fn issue_token(&self, user: &UserModel) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp() as usize;

        debug!(user_id = user.id, exp_timestamp = exp, "Issuing token");

        let claims = AuthClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode token");
            AppError::Token(e.to_string())
        })
    }

    /// Validates a token and returns the claims if valid
    ///
    /// Expired tokens are rejected distinctly from tampered or malformed
    /// ones; both land in the unauthorized class.
    #[instrument(skip(self, token))]
    pub fn verify_token(&self, token: &str) -> Result<AuthClaims, AppError> {
        debug!("Decoding and validating token");

        decode::<AuthClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| {
            debug!(user_id = data.claims.sub, "Token validated");
            data.claims
        })
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => {
                debug!("Token has expired");
                AppError::Token("Token has expired".to_string())
            }
            _ => {
                debug!(error = %e, "Token failed validation");
                AppError::Token("Invalid token".to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> UserModel {
        UserModel {
            id: 42,
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            password_hash: None,
            role: "user".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_verify_token() {
        let config = TokenConfig::new("test-secret");
        let user = test_user();

        let token = config.issue_token(&user).unwrap();
        assert!(!token.is_empty());

        let claims = config.verify_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.role, "user");
        assert!(claims.exp > claims.iat);
        // 1 hour validity
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS as usize);
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let config = TokenConfig::new("test-secret");
        let result = config.verify_token("invalid.token.here");
        assert!(matches!(result, Err(AppError::Token(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = TokenConfig::new("secret-a");
        let verifier = TokenConfig::new("secret-b");

        let token = issuer.issue_token(&test_user()).unwrap();
        assert!(issuer.verify_token(&token).is_ok());

        let result = verifier.verify_token(&token);
        assert!(matches!(result, Err(AppError::Token(_))));
    }

    #[test]
    fn test_expired_token_is_rejected_distinctly() {
        let config = TokenConfig::new("test-secret");
        let now = Utc::now().timestamp() as usize;

        // Hand-build claims that expired an hour ago. Validation applies
        // no leeway-defeating tricks beyond the default 60s, so two hours
        // in the past is safely expired.
        let claims = AuthClaims {
            sub: 1,
            email: "old@example.com".to_string(),
            role: "user".to_string(),
            exp: now - 7200,
            iat: now - 10800,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret".as_ref()),
        )
        .unwrap();

        let err = config.verify_token(&token).unwrap_err();
        match err {
            AppError::Token(msg) => assert!(msg.contains("expired")),
            other => panic!("expected Token error, got {:?}", other),
        }
    }
}
