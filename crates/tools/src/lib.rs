//! Tool registry: the MCP tools this server exposes.
//!
//! - `send-email` - validate arguments, resolve sender/reply-to defaults,
//!   send through the provider.
//! - `list-audiences` - list the provider's audiences.
//!
//! Invalid arguments are rejected before the provider is called. Provider
//! failures come back as tool results with `isError` set so the client can
//! relay the provider's message.

mod address;
mod error;
mod registry;
mod schema;

pub use error::{Error, Result};
pub use registry::{EmailTools, LIST_AUDIENCES, SEND_EMAIL};
pub use schema::{Defaults, Resolution, SendEmailSchema};
