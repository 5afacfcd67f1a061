//! Authentication for the clinic API
//!
//! Provides:
//! - JWT token issuance and verification
//! - Bearer-token request gate binding the authenticated doctor
//! - Password hashing with Argon2

pub mod gate;
pub mod jwt;
pub mod password;

pub use gate::{authenticate, AuthedDoctor};
pub use jwt::{extract_token_from_header, Claims, JwtValidator};
pub use password::{hash_password, verify_password};
