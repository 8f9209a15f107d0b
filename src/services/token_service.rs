use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::utils::AppError;

/// JWT claims: the user id plus the issuance/expiry window. Nothing else is
/// embedded; the acting user record is always reloaded from the store.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Issues a signed HS256 token embedding the user id.
pub fn issue(config: &Config, user_id: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + config.jwt_expires_in).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

/// Verifies signature and expiry. Malformed, tampered and expired tokens all
/// collapse into the same `Unauthenticated` error.
pub fn verify(config: &Config, token: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthenticated("Invalid token.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_config(expires_in: Duration) -> Config {
        Config {
            run_mode: crate::config::RunMode::Test,
            host: "127.0.0.1".to_string(),
            port: 3001,
            mongodb_uri: "mongodb://localhost:27017/test".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expires_in: expires_in,
        }
    }

    #[test]
    fn issue_then_verify_roundtrip() {
        let config = test_config(Duration::days(7));
        let token = issue(&config, "64f000000000000000000001").unwrap();
        let claims = verify(&config, &token).unwrap();
        assert_eq!(claims.sub, "64f000000000000000000001");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config(Duration::seconds(-120));
        let token = issue(&config, "64f000000000000000000001").unwrap();
        assert!(matches!(
            verify(&config, &token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config(Duration::days(1));
        let token = issue(&config, "64f000000000000000000001").unwrap();

        let mut other = test_config(Duration::days(1));
        other.jwt_secret = "another-secret".to_string();
        assert!(matches!(
            verify(&other, &token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let config = test_config(Duration::days(1));
        assert!(verify(&config, "not-a-jwt").is_err());
    }
}
