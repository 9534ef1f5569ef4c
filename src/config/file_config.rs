use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML configuration file. Every field mirrors a CLI argument
/// and overrides it when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub media_path: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_url: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub token_secret: Option<String>,
    pub access_token_ttl_secs: Option<i64>,
    pub refresh_token_ttl_secs: Option<i64>,
    pub verification_token_ttl_secs: Option<i64>,
    pub verification_prune_interval_hours: Option<u64>,
    pub spotify: Option<SpotifyFileConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyFileConfig {
    pub client_id: String,
    pub client_secret: String,
    pub timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path.as_ref()))
    }
}
