//! Writing the default configuration file.
//!
//! `pubmed-ris init-config` renders [`Config`] as TOML so users have a starting point:
//!
//! ```toml
//! [pubmed]
//! email = "you@example.org"
//! tool = "pubmed-ris"
//! base_url = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils"
//!
//! [run]
//! delay_ms = 300
//! timeout_secs = 30
//! ```

use std::path::Path;

use super::Config;

const HEADER: &str = "\
# pubmed-ris configuration
#
# NCBI asks every E-utilities client to identify itself. Set pubmed.email to a
# contact address (or export NCBI_EMAIL). An api_key raises the request limit.
# run.delay_ms cannot go below 300 when talking to NCBI.

";

/// Renders and saves configuration files
#[derive(Debug)]
pub struct ConfigFile;

impl ConfigFile {
    /// Render a configuration as commented TOML
    pub fn render(config: &Config) -> Result<String, ConfigFileError> {
        let body =
            toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;
        Ok(format!("{}{}", HEADER, body))
    }

    /// Save a configuration to a TOML file, creating parent directories.
    ///
    /// Refuses to replace an existing file unless `overwrite` is set.
    pub fn save(config: &Config, path: &Path, overwrite: bool) -> Result<(), ConfigFileError> {
        if path.exists() && !overwrite {
            return Err(ConfigFileError::Exists(path.display().to_string()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }

        let content = Self::render(config)?;
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Config file already exists: {0} (use --force to replace it)")]
    Exists(String),
}
