use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::SecurityConfig;

/// Who a token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Customer id for customer tokens, admin email for admin tokens.
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, email: impl Into<String>, role: Role, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: sub.into(),
            email: email.into(),
            role,
            exp: (issued_at + ttl).timestamp(),
            iat: issued_at.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("Invalid JWT token: {0}")]
    Invalid(String),
}

// Ten years; anything longer is a misconfiguration.
const MAX_TTL_HOURS: u64 = 24 * 365 * 10;

/// Signing and verification keys derived once from configuration.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(expiry_hours.min(MAX_TTL_HOURS) as i64),
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        Self::new(&security.jwt_secret, security.jwt_expiry_hours)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, sub: &str, email: &str, role: Role) -> Result<String, TokenError> {
        self.issue_at(sub, email, role, Utc::now())
    }

    pub fn issue_at(&self, sub: &str, email: &str, role: Role, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::new(sub, email, role, issued_at, self.ttl);
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Verify signature and expiry and return the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

/// Lowercase hex SHA-256 digest, the format `ADMIN_PASSWORD_SHA256` is
/// configured in.
pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Check admin credentials against configuration. Returns `false` when no
/// admin account is configured.
pub fn verify_admin_credentials(security: &SecurityConfig, email: &str, password: &str) -> bool {
    let (Some(expected_email), Some(expected_hash)) = (&security.admin_email, &security.admin_password_sha256) else {
        return false;
    };
    let email_ok = expected_email.eq_ignore_ascii_case(email.trim());
    let hash_ok = constant_time_eq(expected_hash.as_bytes(), sha256_hex(password).as_bytes());
    email_ok && hash_ok
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
