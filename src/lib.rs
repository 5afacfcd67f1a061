//! Clinic management REST API
//!
//! Doctors register and log in, manage their own patients, and schedule
//! appointments linking patients to doctors. The security core is the JWT
//! auth gate plus the per-doctor ownership scoping applied to every resource
//! query: one doctor can never observe or affect another's records.
//!
//! ## Modules
//!
//! - **auth**: JWT issuance/verification, Argon2 password hashing, bearer gate
//! - **db**: MongoDB client, typed collections, document schemas
//! - **services**: ownership-scoped patient and appointment CRUD
//! - **routes**: REST handlers mapping service results to HTTP
//! - **server**: hyper http1 server loop and shared state

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ClinicError, Result};
