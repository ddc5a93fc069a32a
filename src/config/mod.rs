mod file_config;

pub use file_config::{AdminConfig, AuthConfig, FileConfig};

use crate::server::RequestsLoggingLevel;
use crate::user::duration::parse_duration_secs;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_ACCESS_TOKEN_TTL: &str = "15m";
pub const DEFAULT_REFRESH_TOKEN_TTL: &str = "7d";

/// Token signing settings, lifetimes already parsed to seconds.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

/// CLI arguments that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub jwt_secret: Option<String>,
    pub access_token_ttl: Option<String>,
    pub refresh_token_ttl: Option<String>,
    pub admin: Option<AdminConfig>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub auth: AuthSettings,
    pub admin: Option<AdminConfig>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let auth_file = file.auth.unwrap_or_default();
        let jwt_secret = auth_file
            .jwt_secret
            .or_else(|| cli.jwt_secret.clone())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "A JWT secret must be specified via --jwt-secret, JWT_SECRET or in config file"
                )
            })?;

        let access_token_ttl = auth_file
            .access_token_ttl
            .or_else(|| cli.access_token_ttl.clone())
            .unwrap_or_else(|| DEFAULT_ACCESS_TOKEN_TTL.to_string());
        let refresh_token_ttl = auth_file
            .refresh_token_ttl
            .or_else(|| cli.refresh_token_ttl.clone())
            .unwrap_or_else(|| DEFAULT_REFRESH_TOKEN_TTL.to_string());

        let auth = AuthSettings {
            jwt_secret,
            access_token_ttl_secs: parse_duration_secs(&access_token_ttl)
                .with_context(|| format!("Invalid access token ttl {:?}", access_token_ttl))?,
            refresh_token_ttl_secs: parse_duration_secs(&refresh_token_ttl)
                .with_context(|| format!("Invalid refresh token ttl {:?}", refresh_token_ttl))?,
        };

        let admin = file.admin.or_else(|| cli.admin.clone());

        Ok(AppConfig {
            db_dir,
            port,
            logging_level,
            auth,
            admin,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
