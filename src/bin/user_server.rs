//! User Auth Server
//!
//! Serves registration, login, availability checks and the signed-in
//! user's profile.
//!
//! Usage:
//!   debate-user --jwt-secret <32+ bytes> --bind-addr 0.0.0.0:8080

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::info;

use debate_backend::auth::{BcryptHasher, JwtHandler};
use debate_backend::config::UserConfig;
use debate_backend::server::{cors_layer, init_tracing, load_env, serve};
use debate_backend::user::{self, UserState};
use debate_backend::Database;

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    let config = UserConfig::parse();
    init_tracing();
    config.validate()?;

    info!("🚀 Debate user server starting");

    let db = Database::open(&config.common.database_path)?;

    let jwt = Arc::new(JwtHandler::new(
        &config.common.jwt_secret,
        config.common.jwt_expiration_ms,
    )?);
    let state = UserState::new(db, jwt, Arc::new(BcryptHasher::new(config.common.bcrypt_cost)));

    let app = user::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.common.cors_origins())?);

    serve(config.bind_addr, app, "User API").await
}
