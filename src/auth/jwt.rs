use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::config::JwtConfig;
use crate::error::AppError;

use super::Claims;

pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(config: &JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::default();

        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        if let Some(ref audience) = config.audience {
            validation.set_audience(&[audience]);
        }

        Self {
            decoding_key,
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Auth(format!("Invalid token: {}", e)))?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AppError::Auth("Token has no subject".to_string()));
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn create_test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            issuer: None,
            audience: None,
        }
    }

    fn create_test_token(sub: &str, exp_offset: i64, secret: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            exp: now + exp_offset,
            iat: now,
            roles: vec!["resident".to_string()],
            apartment_id: Some("apt-1".to_string()),
            extra: Default::default(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token() {
        let config = create_test_config();
        let validator = JwtValidator::new(&config);

        let token = create_test_token("user-123", 3600, &config.secret);
        let claims = validator.validate(&token).unwrap();

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.apartment_id.as_deref(), Some("apt-1"));
    }

    #[test]
    fn test_invalid_token() {
        let validator = JwtValidator::new(&create_test_config());
        assert!(validator.validate("invalid-token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let validator = JwtValidator::new(&create_test_config());
        let token = create_test_token("user-123", 3600, "another-secret");
        assert!(matches!(validator.validate(&token), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_expired_token() {
        let validator = JwtValidator::new(&create_test_config());
        // Past the default 60s leeway
        let token = create_test_token("user-123", -3600, "test-secret-key-for-testing");
        assert!(validator.validate(&token).is_err());
    }

    #[test]
    fn test_empty_subject_rejected() {
        let config = create_test_config();
        let validator = JwtValidator::new(&config);
        let token = create_test_token("", 3600, &config.secret);
        assert!(validator.validate(&token).is_err());
    }
}
