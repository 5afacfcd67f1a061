//! Shared types for the clinic API

pub mod error;

pub use error::{ClinicError, Result};
