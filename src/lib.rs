//! pubchem-mcp - PubChem for the Model Context Protocol
//!
//! This crate exposes the PubChem PUG REST and PUG View services to MCP
//! clients as a single `pubchem` tool plus a handful of resource templates,
//! served as JSON-RPC over stdio.

pub mod config;
pub mod mcp;
pub mod methods;
pub mod pubchem;
pub mod types;

pub use config::ConfigLoader;
pub use mcp::McpServer;
pub use pubchem::PubChemClient;
pub use types::PubChemError;
