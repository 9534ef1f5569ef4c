use super::RequestsLoggingLevel;
use std::path::PathBuf;

/// Everything the router assembly needs to know, detached from how the
/// process-level configuration was resolved.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub requests_logging_level: RequestsLoggingLevel,
    /// Where uploaded profile pictures live.
    pub media_path: PathBuf,
    /// Browser origin allowed by CORS; None allows any origin.
    pub frontend_url: Option<String>,
    /// When set, the frontend build is served statically from here.
    pub frontend_dir_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            requests_logging_level: RequestsLoggingLevel::None,
            media_path: PathBuf::from("."),
            frontend_url: None,
            frontend_dir_path: None,
        }
    }
}
