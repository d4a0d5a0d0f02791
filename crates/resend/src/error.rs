use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status. `body` is its error
    /// payload as received (wrapped in `{"message": ...}` when not JSON).
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: Value },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// The provider's error payload, or a `{"message": ...}` stand-in for
    /// failures that never reached the provider.
    pub fn payload(&self) -> Value {
        match self {
            Self::Api { body, .. } => body.clone(),
            other => serde_json::json!({ "message": other.to_string() }),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
