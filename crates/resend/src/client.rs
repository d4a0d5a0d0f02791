//! Resend API client.

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::gateway::Gateway;
use crate::types::{AudienceList, Email, SentEmail};
use crate::{Error, Result};

pub const RESEND_API_URL: &str = "https://api.resend.com";

/// Builder for creating a Resend client.
#[derive(Clone)]
pub struct ResendClientBuilder {
    api_key: String,
    base_url: String,
}

impl ResendClientBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: RESEND_API_URL.to_string(),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn build(self) -> ResendClient {
        ResendClient {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            base_url: self.base_url,
        }
    }
}

/// Resend API client.
pub struct ResendClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ResendClient {
    pub fn builder(api_key: impl Into<String>) -> ResendClientBuilder {
        ResendClientBuilder::new(api_key)
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).build()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<Value>(&text)
                .unwrap_or_else(|_| serde_json::json!({ "message": text }));
            warn!(status = status.as_u16(), %body, "Resend API error");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

impl std::fmt::Display for ResendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resend({})", self.base_url)
    }
}

impl Gateway for ResendClient {
    async fn send_email(&self, email: &Email) -> Result<SentEmail> {
        debug!(to = ?email.to, subject = %email.subject, "Sending email");

        let response = self
            .client
            .post(self.url("/emails"))
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .json(email)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Self::read(response).await
    }

    async fn list_audiences(&self) -> Result<AudienceList> {
        debug!("Listing audiences");

        let response = self
            .client
            .get(self.url("/audiences"))
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Self::read(response).await
    }
}
