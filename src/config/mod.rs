mod file_config;

pub use file_config::{FileConfig, SpotifyFileConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that take part in config resolution. Mirrors the fields
/// a TOML config file can override.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub media_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_url: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub token_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub verification_token_ttl_secs: i64,
    pub verification_prune_interval_hours: u64,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub spotify_timeout_sec: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            media_path: None,
            port: 3001,
            logging_level: RequestsLoggingLevel::Path,
            frontend_url: None,
            frontend_dir_path: None,
            token_secret: "change-me".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 7 * 24 * 3600,
            verification_token_ttl_secs: 48 * 3600,
            verification_prune_interval_hours: 24,
            spotify_client_id: None,
            spotify_client_secret: None,
            spotify_timeout_sec: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub client_id: String,
    pub client_secret: String,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub media_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_url: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub token_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub verification_token_ttl_secs: i64,
    pub verification_prune_interval_hours: u64,

    /// Catalog proxy credentials; None leaves the proxy unconfigured and
    /// searches degrade to empty results.
    pub spotify: Option<SpotifySettings>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
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

        let media_path = file
            .media_path
            .map(PathBuf::from)
            .or_else(|| cli.media_path.clone())
            .unwrap_or_else(|| db_dir.clone());

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_url = file.frontend_url.or_else(|| cli.frontend_url.clone());
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let token_secret = file
            .token_secret
            .unwrap_or_else(|| cli.token_secret.clone());
        let access_token_ttl_secs = file
            .access_token_ttl_secs
            .unwrap_or(cli.access_token_ttl_secs);
        let refresh_token_ttl_secs = file
            .refresh_token_ttl_secs
            .unwrap_or(cli.refresh_token_ttl_secs);
        let verification_token_ttl_secs = file
            .verification_token_ttl_secs
            .unwrap_or(cli.verification_token_ttl_secs);
        let verification_prune_interval_hours = file
            .verification_prune_interval_hours
            .unwrap_or(cli.verification_prune_interval_hours);

        if access_token_ttl_secs <= 0 {
            bail!("access_token_ttl_secs must be positive");
        }
        if refresh_token_ttl_secs <= access_token_ttl_secs {
            bail!("refresh_token_ttl_secs must exceed access_token_ttl_secs");
        }

        // Catalog proxy needs both halves of the credentials; file config
        // wins wholesale when its [spotify] section is present.
        let spotify = match file.spotify {
            Some(section) => Some(SpotifySettings {
                client_id: section.client_id,
                client_secret: section.client_secret,
                timeout_sec: section.timeout_sec.unwrap_or(cli.spotify_timeout_sec),
            }),
            None => match (&cli.spotify_client_id, &cli.spotify_client_secret) {
                (Some(id), Some(secret)) => Some(SpotifySettings {
                    client_id: id.clone(),
                    client_secret: secret.clone(),
                    timeout_sec: cli.spotify_timeout_sec,
                }),
                (None, None) => None,
                _ => bail!(
                    "Both --spotify-client-id and --spotify-client-secret must be provided together"
                ),
            },
        };

        Ok(Self {
            db_dir,
            media_path,
            port,
            logging_level,
            frontend_url,
            frontend_dir_path,
            token_secret,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
            verification_token_ttl_secs,
            verification_prune_interval_hours,
            spotify,
        })
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }
}

/// Parses a logging level string using clap's ValueEnum trait.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
