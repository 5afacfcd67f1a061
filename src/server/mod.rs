//! HTTP server for the clinic API

pub mod http;

pub use http::{run, AppState};
