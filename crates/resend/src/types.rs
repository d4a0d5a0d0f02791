//! Resend API wire types.

use serde::{Deserialize, Serialize};

/// An outbound email, serialized as the body of `POST /emails`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply_to: Vec<String>,
    /// Natural-language or ISO 8601 schedule, interpreted by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<String>,
}

/// Confirmation returned for an accepted email.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SentEmail {
    pub id: String,
}

/// A contact audience.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Audience {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Result of `GET /audiences`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AudienceList {
    #[serde(default)]
    pub data: Vec<Audience>,
}
