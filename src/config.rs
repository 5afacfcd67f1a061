//! Configuration for the clinic API
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Clinic management REST API
#[derive(Parser, Debug, Clone)]
#[command(name = "clinic-api")]
#[command(about = "REST API for clinic management - doctors, patients, appointments")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "clinic")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required, at least 32 characters)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds (default 1 day)
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "86400")]
    pub jwt_expiry_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration before serving
    pub fn validate(&self) -> Result<(), String> {
        match &self.jwt_secret {
            None => return Err("JWT_SECRET is required".to_string()),
            Some(secret) if secret.len() < 32 => {
                return Err("JWT_SECRET must be at least 32 characters".to_string())
            }
            Some(_) => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            listen: "0.0.0.0:5000".parse().unwrap(),
            mongodb_uri: "mongodb://localhost:27017".into(),
            mongodb_db: "clinic".into(),
            jwt_secret: Some("a-secret-that-is-at-least-32-characters!".into()),
            jwt_expiry_seconds: 86400,
            log_level: "info".into(),
        }
    }

    #[test]
    fn test_validate_requires_secret() {
        let mut args = base_args();
        assert!(args.validate().is_ok());

        args.jwt_secret = None;
        assert!(args.validate().is_err());

        args.jwt_secret = Some("short".into());
        assert!(args.validate().is_err());
    }
}
