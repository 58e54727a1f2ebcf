//! Built-in client defaults
//!
//! Zero-config values for talking to the public PubChem service.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Immutable upstream client configuration, fixed at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }
}

pub fn default_user_agent() -> String {
    format!("pubchem-mcp/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client_settings() {
        let settings = ClientSettings::default();
        assert_eq!(settings.base_url, "https://pubchem.ncbi.nlm.nih.gov/rest");
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.user_agent.starts_with("pubchem-mcp/"));
    }
}
