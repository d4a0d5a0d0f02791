//! Request admission policy.
//!
//! Core principle: **a browser may only reach the server from an origin we
//! trust.** Without an explicit allow-list that means loopback pages only.

mod error;
mod origin;

pub use error::{Error, Result};
pub use origin::{Decision, FALLBACK_ALLOW_ORIGIN, OriginPolicy};
