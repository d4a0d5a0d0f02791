//! Gateway trait.

use crate::Result;
use crate::types::{AudienceList, Email, SentEmail};
use std::future::Future;

/// The email provider, as seen by the tools.
///
/// One call per operation, no retries.
pub trait Gateway: Send + Sync {
    fn send_email(&self, email: &Email) -> impl Future<Output = Result<SentEmail>> + Send;

    fn list_audiences(&self) -> impl Future<Output = Result<AudienceList>> + Send;
}
