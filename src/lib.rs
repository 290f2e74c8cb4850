//! Debate Platform Backend Library
//!
//! Shared building blocks for the two HTTP services shipped as binaries:
//! the administrator console (`debate-admin`) and the user-facing auth
//! service (`debate-user`). Both services use the same token issuer,
//! request gate and SQLite-backed stores.

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod server;
pub mod store;
pub mod user;
pub mod validation;

pub use db::Database;
pub use error::ApiError;
pub use response::ApiResponse;
