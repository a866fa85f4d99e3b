//! Access token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use elevaite_core::config::AuthConfig;
use elevaite_core::error::AppError;

use super::claims::Claims;

/// Validates access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5;
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                        AppError::authentication("Invalid token issuer")
                    }
                    _ => AppError::authentication("Invalid token"),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtEncoder;
    use chrono::Utc;
    use elevaite_entity::user::User;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            firstname: None,
            lastname: None,
            is_superadmin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn config(secret: &str, issuer: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            jwt_issuer: issuer.to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_round_trip() {
        let config = config("s3cret", "elevaite");
        let user = user();
        let (token, _) = JwtEncoder::new(&config).generate_access_token(&user).unwrap();
        let claims = JwtDecoder::new(&config).decode_access_token(&token).unwrap();
        assert_eq!(claims.user_id(), user.id);
        assert_eq!(claims.email, "ada@example.com");
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_wrong_secret_or_issuer_is_rejected() {
        let user = user();
        let (token, _) = JwtEncoder::new(&config("a", "elevaite"))
            .generate_access_token(&user)
            .unwrap();

        let err = JwtDecoder::new(&config("b", "elevaite"))
            .decode_access_token(&token)
            .unwrap_err();
        assert_eq!(err.message, "Invalid token signature");

        let err = JwtDecoder::new(&config("a", "someone-else"))
            .decode_access_token(&token)
            .unwrap_err();
        assert_eq!(err.message, "Invalid token issuer");
    }
}
