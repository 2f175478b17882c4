// Toolgate core: provider trait, registry, dispatcher, and shared types
// used by both the stdio and HTTP protocol surfaces.

pub mod auth;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod types;

pub use auth::ApiKeys;
pub use dispatch::Dispatcher;
pub use error::Error;
pub use provider::{ToolProvider, ToolSet};
pub use registry::{ProviderSpec, Registry};
pub use types::{ClientConfig, ResourceHandle, ToolContent, ToolDefinition, ToolResult};
