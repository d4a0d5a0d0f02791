//! Resend provider gateway.
//!
//! A thin client for the two Resend operations the tools need: sending an
//! email and listing audiences. Provider failures are returned verbatim in
//! [`Error::Api`] so callers can show them to the user.
//!
//! # Example
//!
//! ```no_run
//! use resend::{Email, Gateway, ResendClient};
//!
//! # async fn example() -> resend::Result<()> {
//! let client = ResendClient::new("re_123");
//! let sent = client
//!     .send_email(&Email {
//!         from: "me@example.com".into(),
//!         to: vec!["you@example.com".into()],
//!         subject: "Hello".into(),
//!         text: "Hi there".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("sent {}", sent.id);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod gateway;
mod types;

pub use client::{RESEND_API_URL, ResendClient, ResendClientBuilder};
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use types::{Audience, AudienceList, Email, SentEmail};
