use crate::mcp::protocol::JsonRpcError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PubChemError {
    #[error("PubChem API error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Request timeout after {0}s")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response from PubChem: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Already classified as a protocol-level failure; surfaced unwrapped.
    #[error(transparent)]
    Protocol(#[from] JsonRpcError),
}

impl PubChemError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PubChemError::Upstream { status: 404, .. })
    }
}
