use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use songbook_server::catalog::{ArtistService, SongService};
use songbook_server::catalog_store::SqliteCatalogStore;
use songbook_server::config::{AdminConfig, AppConfig, CliConfig, FileConfig};
use songbook_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use songbook_server::user::{SqliteUserStore, TokenManager, UserManager};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values found there override the CLI ones.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding catalog.db and user.db.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Secret used to sign access and refresh tokens.
    #[clap(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Access token lifetime, e.g. 15m.
    #[clap(long)]
    pub access_token_ttl: Option<String>,

    /// Refresh token lifetime, e.g. 7d.
    #[clap(long)]
    pub refresh_token_ttl: Option<String>,

    /// Email of an administrator to create (or promote) at startup.
    #[clap(long, requires = "admin_password")]
    pub admin_email: Option<String>,

    #[clap(long, requires = "admin_email", hide_env_values = true)]
    pub admin_password: Option<String>,

    #[clap(long)]
    pub admin_name: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        let admin = match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some(AdminConfig {
                email: email.clone(),
                password: password.clone(),
                name: self.admin_name.clone(),
            }),
            _ => None,
        };
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            jwt_secret: self.jwt_secret.clone(),
            access_token_ttl: self.access_token_ttl.clone(),
            refresh_token_ttl: self.refresh_token_ttl.clone(),
            admin,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!(
        "Opening SQLite catalog database at {:?}...",
        config.catalog_db_path()
    );
    let catalog_store = Arc::new(SqliteCatalogStore::new(config.catalog_db_path())?);

    info!(
        "Opening SQLite user database at {:?}...",
        config.user_db_path()
    );
    let user_store = Arc::new(SqliteUserStore::new(config.user_db_path())?);

    let user_manager = UserManager::new(user_store, TokenManager::new(&config.auth));
    if let Some(admin) = &config.admin {
        user_manager
            .ensure_admin(admin)
            .context("Failed to set up the administrator")?;
    }

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(
        server_config,
        user_manager,
        ArtistService::new(catalog_store.clone()),
        SongService::new(catalog_store),
    )
    .await
}
