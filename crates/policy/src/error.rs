//! Policy error types.

use thiserror::Error;

/// Policy errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The configured allowed origin is not a usable origin.
    #[error("invalid allowed origin {origin:?}: {reason}")]
    InvalidOrigin { origin: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
