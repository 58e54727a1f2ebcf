//! Configuration loader with 3-tier precedence
//!
//! Config file search order:
//! 1. Explicit path (`--config`)
//! 2. ./.pubchem-mcp.toml (project-specific)
//! 3. $PUBCHEM_MCP_CONFIG
//! 4. ~/.config/pubchem-mcp/config.toml (user-global)

use crate::config::{ClientSettings, UserConfig};
use crate::types::PubChemError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Final configuration after merging all tiers.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub client: ClientSettings,
    pub log_level: Option<String>,
    pub source: Option<PathBuf>,
}

pub struct ConfigLoader {
    explicit: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self { explicit }
    }

    /// Locate, parse and merge the user config over the defaults
    pub fn load(&self) -> Result<ResolvedConfig, PubChemError> {
        let mut resolved = ResolvedConfig::default();

        let Some(path) = self.find_config_file()? else {
            debug!("No user config file found, using defaults");
            return Ok(resolved);
        };

        let user_config = Self::read_user_config(&path)?;
        info!("Loaded user configuration from {}", path.display());

        if let Some(settings) = user_config.settings {
            resolved.log_level = settings.log_level;
        }

        if let Some(client) = user_config.client {
            if let Some(base_url) = client.base_url {
                resolved.client.base_url = base_url;
            }
            if let Some(timeout_secs) = client.timeout_secs {
                resolved.client.timeout_secs = timeout_secs;
            }
            if let Some(user_agent) = client.user_agent {
                resolved.client.user_agent = user_agent;
            }
        }

        resolved.source = Some(path);
        Self::validate(&resolved.client)?;

        Ok(resolved)
    }

    fn find_config_file(&self) -> Result<Option<PathBuf>, PubChemError> {
        if let Some(path) = &self.explicit {
            if !path.exists() {
                return Err(PubChemError::ConfigError(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.clone()));
        }

        let mut candidates = Vec::new();

        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(".pubchem-mcp.toml"));
        }

        if let Ok(config_path) = std::env::var("PUBCHEM_MCP_CONFIG") {
            candidates.push(PathBuf::from(config_path));
        }

        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("pubchem-mcp").join("config.toml"));
        }

        Ok(candidates.into_iter().find(|path| path.exists()))
    }

    fn read_user_config(path: &Path) -> Result<UserConfig, PubChemError> {
        debug!("Loading user config from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| PubChemError::ConfigError(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| PubChemError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Reject settings the HTTP client could never work with
    pub fn validate(client: &ClientSettings) -> Result<(), PubChemError> {
        let url = Url::parse(&client.base_url).map_err(|e| {
            PubChemError::ConfigError(format!("Invalid base_url '{}': {}", client.base_url, e))
        })?;

        if url.cannot_be_a_base() {
            return Err(PubChemError::ConfigError(format!(
                "base_url '{}' cannot carry path segments",
                client.base_url
            )));
        }

        if client.timeout_secs == 0 {
            return Err(PubChemError::ConfigError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
