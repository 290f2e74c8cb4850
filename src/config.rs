//! Service configuration
//!
//! Every setting can be given as a CLI flag or an environment variable
//! (`.env` files are loaded first, see `server::load_env`). Invalid values
//! abort startup.

use anyhow::{bail, Result};
use clap::{Args, Parser};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::auth::jwt::MIN_SECRET_LEN;

/// Settings shared by both services
#[derive(Args, Debug, Clone)]
pub struct CommonConfig {
    /// HS256 signing secret, at least 32 bytes
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Token lifetime in milliseconds
    #[arg(long, env = "JWT_EXPIRATION_MS", default_value_t = 86_400_000)]
    pub jwt_expiration_ms: i64,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "debate.db")]
    pub database_path: String,

    /// bcrypt work factor for new password hashes
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Allowed CORS origins (comma-separated); empty allows any origin
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub cors_allowed_origins: Vec<String>,
}

impl CommonConfig {
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            bail!(
                "JWT_SECRET must be at least {} bytes (got {})",
                MIN_SECRET_LEN,
                self.jwt_secret.len()
            );
        }
        if self.jwt_expiration_ms <= 0 {
            bail!("JWT_EXPIRATION_MS must be positive");
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31");
        }
        Ok(())
    }

    /// Configured origins with blanks dropped
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "debate-admin")]
#[command(about = "Debate platform administrator console backend")]
pub struct AdminConfig {
    #[command(flatten)]
    pub common: CommonConfig,

    #[arg(long, env = "ADMIN_BIND_ADDR", default_value = "0.0.0.0:8081")]
    pub bind_addr: SocketAddr,

    /// Directory uploaded images are written to
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// URL prefix uploaded images are served under
    #[arg(long, env = "UPLOAD_URL_PREFIX", default_value = "/uploads")]
    pub upload_url_prefix: String,

    /// Admin id of the SUPER_ADMIN created when no admin exists yet
    #[arg(long, env = "ADMIN_BOOTSTRAP_ID")]
    pub bootstrap_admin_id: Option<String>,

    #[arg(long, env = "ADMIN_BOOTSTRAP_PASSWORD", hide_env_values = true)]
    pub bootstrap_password: Option<String>,
}

impl AdminConfig {
    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;

        let prefix = &self.upload_url_prefix;
        if !prefix.starts_with('/') || prefix.ends_with('/') || prefix.len() < 2 {
            bail!("UPLOAD_URL_PREFIX must look like /uploads (got {:?})", prefix);
        }

        match (&self.bootstrap_admin_id, &self.bootstrap_password) {
            (Some(_), None) | (None, Some(_)) => {
                bail!("ADMIN_BOOTSTRAP_ID and ADMIN_BOOTSTRAP_PASSWORD must be set together")
            }
            _ => Ok(()),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "debate-user")]
#[command(about = "Debate platform user authentication backend")]
pub struct UserConfig {
    #[command(flatten)]
    pub common: CommonConfig,

    #[arg(long, env = "USER_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: SocketAddr,
}

impl UserConfig {
    pub fn validate(&self) -> Result<()> {
        self.common.validate()
    }
}
