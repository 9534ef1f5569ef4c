use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use waxlog_server::catalog::{CatalogClient, SpotifyClient};
use waxlog_server::config::{AppConfig, CliConfig, FileConfig};
use waxlog_server::mailer::LogMailer;
use waxlog_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use waxlog_server::user::{
    AccountManager, FullUserStore, SqliteUserStore, TokenSigner, VerificationTokenStore,
};

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
    /// Directory holding the SQLite database. May also come from the
    /// config file.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Path to an optional TOML config file; its values override CLI
    /// arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory for uploaded media (profile pictures). Defaults to db_dir.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Browser origin of the frontend, used for CORS and verification links.
    #[clap(long)]
    pub frontend_url: Option<String>,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Secret used to sign access and refresh tokens.
    #[clap(long, default_value = "change-me")]
    pub token_secret: String,

    /// Access token lifetime in seconds.
    #[clap(long, default_value_t = 3600)]
    pub access_token_ttl_secs: i64,

    /// Refresh token lifetime in seconds.
    #[clap(long, default_value_t = 7 * 24 * 3600)]
    pub refresh_token_ttl_secs: i64,

    /// Email verification token lifetime in seconds.
    #[clap(long, default_value_t = 48 * 3600)]
    pub verification_token_ttl_secs: i64,

    /// Interval in hours between verification token pruning runs.
    #[clap(long, default_value_t = 24)]
    pub verification_prune_interval_hours: u64,

    /// Client id for the external album catalog.
    #[clap(long)]
    pub spotify_client_id: Option<String>,

    /// Client secret for the external album catalog.
    #[clap(long)]
    pub spotify_client_secret: Option<String>,

    /// Timeout in seconds for catalog requests.
    #[clap(long, default_value_t = 30)]
    pub spotify_timeout_sec: u64,
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
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        db_dir: cli_args.db_dir,
        media_path: cli_args.media_path,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        frontend_url: cli_args.frontend_url,
        frontend_dir_path: cli_args.frontend_dir_path,
        token_secret: cli_args.token_secret,
        access_token_ttl_secs: cli_args.access_token_ttl_secs,
        refresh_token_ttl_secs: cli_args.refresh_token_ttl_secs,
        verification_token_ttl_secs: cli_args.verification_token_ttl_secs,
        verification_prune_interval_hours: cli_args.verification_prune_interval_hours,
        spotify_client_id: cli_args.spotify_client_id,
        spotify_client_secret: cli_args.spotify_client_secret,
        spotify_timeout_sec: cli_args.spotify_timeout_sec,
    };

    let config = AppConfig::resolve(&cli_config, file_config)?;

    if config.token_secret == "change-me" {
        info!("Using the default token secret; set --token-secret in production");
    }

    info!("Opening SQLite user database at {:?}...", config.user_db_path());
    let user_store = Arc::new(SqliteUserStore::new(config.user_db_path())?);

    // Expired verification tokens are dead rows; sweep them periodically.
    if config.verification_prune_interval_hours > 0 {
        let interval_hours = config.verification_prune_interval_hours;
        let pruning_user_store = user_store.clone();

        info!(
            "Verification token pruning enabled: every {} hours",
            interval_hours
        );

        tokio::spawn(async move {
            let interval = Duration::from_secs(interval_hours * 60 * 60);
            let mut ticker = tokio::time::interval(interval);

            // Skip the first immediate tick, wait for the first interval
            ticker.tick().await;

            loop {
                ticker.tick().await;

                match pruning_user_store.prune_expired_verification_tokens(Utc::now().timestamp())
                {
                    Ok(count) => {
                        if count > 0 {
                            info!("Pruned {} expired verification tokens", count);
                        }
                    }
                    Err(e) => {
                        error!("Failed to prune verification tokens: {}", e);
                    }
                }
            }
        });
    }

    let signer = TokenSigner::new(
        &config.token_secret,
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );

    let verification_base_url = config
        .frontend_url
        .clone()
        .unwrap_or_else(|| format!("http://localhost:{}", config.port));

    let account_manager = Arc::new(AccountManager::new(
        user_store.clone() as Arc<dyn FullUserStore>,
        signer,
        Arc::new(LogMailer),
        verification_base_url,
        config.verification_token_ttl_secs,
    ));

    let catalog: Option<Arc<dyn CatalogClient>> = config.spotify.as_ref().map(|settings| {
        info!("Catalog proxy configured");
        Arc::new(SpotifyClient::new(
            settings.client_id.clone(),
            settings.client_secret.clone(),
            settings.timeout_sec,
        )) as Arc<dyn CatalogClient>
    });
    if catalog.is_none() {
        info!("Catalog proxy not configured; album search will return empty results");
    }

    let server_config = ServerConfig {
        port: config.port,
        requests_logging_level: config.logging_level.clone(),
        media_path: config.media_path.clone(),
        frontend_url: config.frontend_url.clone(),
        frontend_dir_path: config.frontend_dir_path.clone(),
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(server_config, user_store, account_manager, catalog).await
}
