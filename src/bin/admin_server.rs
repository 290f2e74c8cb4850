//! Admin Console Server
//!
//! Serves the administrator API: admin login and account management,
//! moderation of users, debates, comments, reports and categories,
//! dashboard statistics and image uploads.
//!
//! Usage:
//!   debate-admin --jwt-secret <32+ bytes> --bind-addr 0.0.0.0:8081
//!
//! Every flag can also be given through the environment (see `--help`).

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::info;

use debate_backend::admin::{self, admins::bootstrap_super_admin, AdminState, UploadSettings};
use debate_backend::auth::{BcryptHasher, JwtHandler};
use debate_backend::config::AdminConfig;
use debate_backend::server::{cors_layer, init_tracing, load_env, serve};
use debate_backend::Database;

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    let config = AdminConfig::parse();
    init_tracing();
    config.validate()?;

    info!("🚀 Debate admin server starting");

    let db = Database::open(&config.common.database_path)?;

    let jwt = Arc::new(JwtHandler::new(
        &config.common.jwt_secret,
        config.common.jwt_expiration_ms,
    )?);
    let state = AdminState::new(
        db,
        jwt,
        Arc::new(BcryptHasher::new(config.common.bcrypt_cost)),
        UploadSettings {
            dir: config.upload_dir.clone(),
            url_prefix: config.upload_url_prefix.clone(),
        },
    );

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.upload_dir.display()))?;
    info!(
        "📷 Uploads stored in {} and served under {}",
        config.upload_dir.display(),
        config.upload_url_prefix
    );

    if let (Some(admin_id), Some(password)) =
        (&config.bootstrap_admin_id, &config.bootstrap_password)
    {
        if bootstrap_super_admin(&state, admin_id, password)?.is_none() {
            info!("🔐 Admins already exist, bootstrap account skipped");
        }
    }

    let app = admin::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.common.cors_origins())?);

    serve(config.bind_addr, app, "Admin API").await
}
