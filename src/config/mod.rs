//! Configuration management.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. built-in defaults (and `NCBI_EMAIL` / `NCBI_API_KEY` from the environment),
//! 2. a TOML file (`--config`, or the first file [`find_config_file`] finds),
//! 3. `PUBMED_RIS_*` environment variables, e.g. `PUBMED_RIS_PUBMED__EMAIL`,
//!    `PUBMED_RIS_RUN__DELAY_MS`,
//! 4. command-line flags (applied by the binary).

mod file_config;

pub use file_config::{ConfigFile, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::DEFAULT_EUTILS_BASE_URL;
use crate::utils::DEFAULT_TIMEOUT;

/// Smallest pause allowed between DOIs when talking to the real PubMed service
pub const MIN_REQUEST_DELAY: Duration = Duration::from_millis(300);

/// File name looked up in the config directories
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// PubMed / E-utilities settings
    #[serde(default)]
    pub pubmed: PubMedConfig,

    /// Run pacing settings
    #[serde(default)]
    pub run: RunSettings,
}

/// Settings for the NCBI E-utilities service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubMedConfig {
    /// Contact address sent with every request
    #[serde(default = "default_email")]
    pub email: Option<String>,

    /// NCBI API key (optional, for higher rate limits)
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    /// Tool name sent with every request
    #[serde(default = "default_tool")]
    pub tool: String,

    /// E-utilities base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            email: default_email(),
            api_key: default_api_key(),
            tool: default_tool(),
            base_url: default_base_url(),
        }
    }
}

fn default_email() -> Option<String> {
    std::env::var("NCBI_EMAIL").ok()
}

fn default_api_key() -> Option<String> {
    std::env::var("NCBI_API_KEY").ok()
}

fn default_tool() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_base_url() -> String {
    DEFAULT_EUTILS_BASE_URL.to_string()
}

/// Pacing and timeout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Pause after each DOI, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Per-request timeout, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_delay_ms() -> u64 {
    300
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// The settings a pipeline run needs, resolved from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Pause after every resolution attempt
    pub delay: Duration,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            delay: MIN_REQUEST_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Whether requests go to the public NCBI service
    pub fn targets_ncbi(&self) -> bool {
        self.pubmed.base_url.trim_end_matches('/') == DEFAULT_EUTILS_BASE_URL
    }

    /// Check the configuration for values that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.pubmed.base_url).map_err(|e| {
            ConfigError::Invalid(format!("pubmed.base_url '{}': {}", self.pubmed.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "pubmed.base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.pubmed.tool.trim().is_empty() {
            return Err(ConfigError::Invalid("pubmed.tool must not be empty".to_string()));
        }

        if self.run.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "run.timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve run settings, raising the delay to [`MIN_REQUEST_DELAY`] against NCBI.
    pub fn run_config(&self) -> RunConfig {
        let mut delay = Duration::from_millis(self.run.delay_ms);
        if self.targets_ncbi() && delay < MIN_REQUEST_DELAY {
            tracing::warn!(
                "run.delay_ms={} is below the NCBI minimum, using {}ms",
                self.run.delay_ms,
                MIN_REQUEST_DELAY.as_millis()
            );
            delay = MIN_REQUEST_DELAY;
        }

        RunConfig {
            delay,
            timeout: Duration::from_secs(self.run.timeout_secs),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration from an optional file plus `PUBMED_RIS_*` environment variables
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("PUBMED_RIS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Find a config file in the default locations.
///
/// Checks `./pubmed-ris.toml`, then `<config dir>/pubmed-ris/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(format!("{}.toml", env!("CARGO_PKG_NAME")));
    if local.is_file() {
        return Some(local);
    }

    default_config_path().filter(|path| path.is_file())
}

/// Where `init-config` writes by default
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join(CONFIG_FILE_NAME))
}
