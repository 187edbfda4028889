//! Admin authentication
//!
//! A single configured admin account: argon2 password verification and
//! HS256 bearer tokens for the admin API.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::{Error, Result};

/// JWT claims for an admin token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    admin_email: String,
    admin_password_hash: String,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("admin_email", &self.admin_email)
            .finish()
    }
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.jwt_secret.is_empty() {
            return Err(Error::Internal(
                "auth.jwt_secret must be configured".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl: Duration::hours(config.token_ttl_hours),
            admin_email: config.admin_email.clone(),
            admin_password_hash: config.admin_password_hash.clone(),
        })
    }

    /// Verify admin credentials and issue a bearer token.
    pub fn login(&self, email: &str, password: &str) -> Result<String> {
        if email.trim() != self.admin_email {
            return Err(Error::Authentication("Invalid credentials".to_string()));
        }
        verify_password(password.trim(), &self.admin_password_hash)?;
        self.issue_token()
    }

    fn issue_token(&self) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: "admin".to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("Failed to sign token: {e}")))
    }

    /// Validate a bearer token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| Error::Authentication(format!("Invalid token: {e}")))
    }
}

fn verify_password(password: &str, phc_hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(phc_hash)
        .map_err(|_| Error::Authentication("Invalid credentials".to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| Error::Authentication("Invalid credentials".to_string()))
}
