//! Error types for the clinic API

use hyper::StatusCode;

/// Main error type for clinic API operations
#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not authorized: {0}")]
    Unauthenticated(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClinicError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Http(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to surface to clients.
    ///
    /// Client-fault variants expose their message as-is, without the Display
    /// prefix used in logs. Database/internal detail stays in the logs; for
    /// those the client gets a generic line.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(msg)
            | Self::AlreadyExists(msg)
            | Self::Unauthenticated(msg)
            | Self::NotFound(msg)
            | Self::Http(msg) => msg.clone(),
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::Database(_) | Self::Internal(_) | Self::Config(_) => "Server error".to_string(),
        }
    }
}

// Implement From conversions for common error types

impl From<std::io::Error> for ClinicError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for ClinicError {
    fn from(err: hyper::Error) -> Self {
        Self::Http(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for ClinicError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ClinicError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthenticated(format!("JWT error: {}", err))
    }
}

/// Result type alias for clinic API operations
pub type Result<T> = std::result::Result<T, ClinicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ClinicError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ClinicError::AlreadyExists("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ClinicError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ClinicError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ClinicError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ClinicError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_database_detail() {
        let err = ClinicError::Database("connection refused at 10.0.0.5:27017".into());
        assert_eq!(err.public_message(), "Server error");

        let err = ClinicError::Internal("poisoned lock".into());
        assert_eq!(err.public_message(), "Server error");
    }

    #[test]
    fn test_public_message_is_unprefixed_for_client_faults() {
        let err = ClinicError::NotFound("Patient not found".into());
        assert_eq!(err.public_message(), "Patient not found");

        let err = ClinicError::Unauthenticated("Not authorized, no token".into());
        assert_eq!(err.public_message(), "Not authorized, no token");

        let err = ClinicError::Validation("Please provide all fields".into());
        assert_eq!(err.public_message(), "Please provide all fields");

        assert_eq!(
            ClinicError::InvalidCredentials.public_message(),
            "Invalid credentials"
        );
    }
}
