// MCP protocol surface: JSON-RPC 2.0 envelope types and the stdio server
// loop. The same envelope types are reused by the HTTP bridge.

pub mod protocol;
pub mod server;

pub use server::StdioServer;
