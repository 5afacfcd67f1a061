//! JWT token handling for doctor authentication
//!
//! Issues and verifies the signed, time-limited identity tokens that back
//! every protected route.
//!
//! Security notes:
//! - Tokens are signed with HS256 (HMAC-SHA256)
//! - Default expiry is 1 day
//! - JWT_SECRET must be a strong random value from the environment

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::ClinicError;

/// Payload stored in JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Doctor document id (hex-encoded ObjectId)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// JWT issuer and verifier
///
/// Holds the process-wide signing secret, loaded once at startup.
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, ClinicError> {
        if secret.is_empty() {
            return Err(ClinicError::Config("JWT_SECRET is required".into()));
        }

        if secret.len() < 32 {
            return Err(ClinicError::Config(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Issue a signed token for an authenticated doctor
    pub fn issue(&self, subject: &str) -> Result<String, ClinicError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ClinicError::Internal(format!("System time error: {}", e)))?
            .as_secs();

        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ClinicError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verify and decode a token
    ///
    /// Any tampering, a signature from a different key, or a past expiry fails
    /// with `Unauthenticated`. There is no partial success.
    pub fn verify(&self, token: &str) -> Result<Claims, ClinicError> {
        let validation = Validation::default();

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            let msg = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidSignature => "Invalid signature",
                _ => "Invalid token",
            };
            ClinicError::Unauthenticated(msg.into())
        })
    }
}

/// Extract token from Authorization header.
///
/// Only the `Bearer <token>` format is accepted; a header that is empty after
/// prefix removal counts as no credential.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }

    None
}
