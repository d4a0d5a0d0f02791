use thiserror::Error;

/// Errors building the tool registry.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid default email address: {0:?}")]
    InvalidDefault(String),
}

pub type Result<T> = std::result::Result<T, Error>;
