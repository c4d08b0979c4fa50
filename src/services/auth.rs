use crate::{
    config::Config,
    error::Result,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Identity of the caller as asserted by the identity provider. The
/// service never authenticates users itself; it only verifies the
/// provider-issued token and treats `id` as an opaque foreign key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub async fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        })
    }

    /// Verify a bearer token and surface the caller's identity.
    pub fn verify_token(&self, token: &str) -> Result<AuthUser> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        Ok(AuthUser {
            id: data.claims.sub,
            username: data.claims.username,
            name: data.claims.name,
            image_url: data.claims.picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn service(secret: &str) -> AuthService {
        AuthService {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    fn token(secret: &str, sub: &str, exp_offset: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (Utc::now().timestamp() + exp_offset) as usize,
            username: Some("neo".to_string()),
            name: Some("Neo".to_string()),
            picture: None,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_verify_token_roundtrip() {
        let auth = service("test-secret");
        let user = auth.verify_token(&token("test-secret", "user_1", 3600)).unwrap();

        assert_eq!(user.id, "user_1");
        assert_eq!(user.username.as_deref(), Some("neo"));
    }

    #[test]
    fn test_verify_token_rejects_wrong_secret() {
        let auth = service("test-secret");
        assert!(auth.verify_token(&token("other-secret", "user_1", 3600)).is_err());
    }

    #[test]
    fn test_verify_token_rejects_expired() {
        let auth = service("test-secret");
        assert!(auth.verify_token(&token("test-secret", "user_1", -3600)).is_err());
    }
}
