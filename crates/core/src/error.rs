use thiserror::Error;

/// Failures that can surface from the core layer.
///
/// Tool-level failures (unknown tool name, provider errors during a call)
/// are deliberately *not* here: they are returned as structured
/// [`crate::ToolResult`] values so a single bad call can never take down a
/// protocol loop.
#[derive(Debug, Error)]
pub enum Error {
    /// A provider could not be discovered or constructed. Logged and
    /// skipped during registry load; never fatal on its own.
    #[error("failed to load provider '{name}': {reason}")]
    ProviderLoad { name: String, reason: String },

    /// Zero providers survived registry load. Fatal at startup.
    #[error("no tool providers could be loaded")]
    NoProviders,

    /// A resource URI did not match `<provider>://help` for any enabled
    /// provider.
    #[error("unknown resource: {0}")]
    ResourceNotFound(String),

    #[error("required environment variable '{0}' is not set")]
    MissingEnv(String),

    /// An API key was supplied but is not in the key table.
    #[error("invalid API key")]
    InvalidApiKey,
}
