//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The tool registry rejected its defaults.
    #[error(transparent)]
    Tools(#[from] tools::Error),

    /// The pipe transport failed.
    #[error(transparent)]
    Mcp(#[from] mcp::Error),

    /// The HTTP transport failed.
    #[error(transparent)]
    Http(#[from] sse::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
