//! MCP server, protocol types, the `pubchem` tool and resources

pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use server::McpServer;
