use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::service::favorites::SignOutPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Everything the app reads from the environment, gathered once and passed
/// to constructors. No module-level clients or other process-wide singletons.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the hosted earnings/favorites API.
    pub api_base_url: String,
    pub api_bearer: Option<String>,
    pub http_timeout: Duration,
    /// JSON file backing the anonymous favorites set.
    pub favorites_path: PathBuf,
    pub show_last_week: bool,
    /// Signed-in identity from the external auth provider, when present.
    pub identity: Option<String>,
    pub sign_out_policy: SignOutPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = env::var("EARNINGS_API_URL")
            .map_err(|_| ConfigError::MissingVar("EARNINGS_API_URL"))?;

        let http_timeout = match env::var("EARNINGS_HTTP_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .map_err(|_| ConfigError::Invalid("EARNINGS_HTTP_TIMEOUT_SECS", raw))?,
            ),
            Err(_) => Duration::from_secs(15),
        };

        let favorites_path = env::var("FAVORITES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("favorites.json"));

        let sign_out_policy = match env::var("SIGN_OUT_POLICY").ok().as_deref() {
            None | Some("keep-session") => SignOutPolicy::KeepSession,
            Some("revert-local") => SignOutPolicy::RevertToLocal,
            Some(other) => {
                return Err(ConfigError::Invalid("SIGN_OUT_POLICY", other.to_string()))
            }
        };

        Ok(Self {
            api_base_url,
            api_bearer: env::var("EARNINGS_API_BEARER").ok(),
            http_timeout,
            favorites_path,
            show_last_week: env::var("SHOW_LAST_WEEK").map(|v| v == "1").unwrap_or(false),
            identity: env::var("USER_ID").ok().filter(|v| !v.is_empty()),
            sign_out_policy,
        })
    }
}
