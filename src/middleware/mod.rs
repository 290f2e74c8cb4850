//! Middleware for observability.

pub mod logging;

pub use logging::log_requests;
