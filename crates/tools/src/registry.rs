//! The `send-email` and `list-audiences` tools.

use mcp::{CallToolResult, Tool, ToolError, ToolHandler};
use resend::{AudienceList, Gateway};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;
use crate::schema::{Defaults, SendEmailSchema};

pub const SEND_EMAIL: &str = "send-email";
pub const LIST_AUDIENCES: &str = "list-audiences";

/// Email tools backed by a provider [`Gateway`].
pub struct EmailTools<G> {
    gateway: G,
    schema: SendEmailSchema,
    tools: Vec<Tool>,
}

impl<G: Gateway> EmailTools<G> {
    /// Build the registry. The `send-email` schema variant is fixed here.
    pub fn new(gateway: G, defaults: Defaults) -> Result<Self> {
        let schema = SendEmailSchema::new(defaults)?;
        let tools = vec![
            Tool {
                name: SEND_EMAIL.to_string(),
                description: Some("Send an email using Resend".to_string()),
                input_schema: schema.input_schema(),
            },
            Tool {
                name: LIST_AUDIENCES.to_string(),
                description: Some(
                    "List all audiences from Resend. This tool is useful for getting the audience ID to help the user find the audience they want to use for other tools. If you need an audience ID, you MUST use this tool to get all available audiences and then ask the user to select the audience they want to use."
                        .to_string(),
                ),
                input_schema: serde_json::json!({ "type": "object", "properties": {} }),
            },
        ];

        Ok(Self {
            gateway,
            schema,
            tools,
        })
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    async fn send_email(&self, arguments: Option<Value>) -> std::result::Result<CallToolResult, ToolError> {
        let email = self
            .schema
            .validate(arguments)
            .map_err(|reason| ToolError::InvalidArguments {
                tool: SEND_EMAIL.to_string(),
                reason,
            })?;

        Ok(match self.gateway.send_email(&email).await {
            Ok(sent) => {
                info!(id = %sent.id, "Email accepted by provider");
                let payload = serde_json::to_string(&sent).unwrap_or_else(|_| sent.id.clone());
                CallToolResult::text(format!("Email sent successfully! {payload}"))
            }
            Err(e) => {
                warn!(error = %e, "Email failed to send");
                CallToolResult::error(format!("Email failed to send: {}", e.payload()))
            }
        })
    }

    async fn list_audiences(&self) -> CallToolResult {
        match self.gateway.list_audiences().await {
            Ok(list) => CallToolResult::text(summarize_audiences(&list)),
            Err(e) => {
                warn!(error = %e, "Failed to list audiences");
                CallToolResult::error(format!("Failed to list audiences: {}", e.payload()))
            }
        }
    }
}

impl<G: Gateway> ToolHandler for EmailTools<G> {
    fn tools(&self) -> Vec<Tool> {
        self.tools.clone()
    }

    async fn call(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> std::result::Result<CallToolResult, ToolError> {
        match name {
            SEND_EMAIL => self.send_email(arguments).await,
            LIST_AUDIENCES => Ok(self.list_audiences().await),
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}

fn summarize_audiences(list: &AudienceList) -> String {
    if list.data.is_empty() {
        return "No audiences found.".to_string();
    }

    let mut summary = format!("Found {} audience(s):", list.data.len());
    for audience in &list.data {
        summary.push_str(&format!("\n- {} (id: {})", audience.name, audience.id));
        if let Some(created_at) = &audience.created_at {
            summary.push_str(&format!(", created {created_at}"));
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use resend::{Audience, Email, SentEmail};
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every request; answers from a canned outcome.
    #[derive(Default)]
    struct StubGateway {
        fail_with: Option<Value>,
        audiences: Vec<Audience>,
        sent: Mutex<Vec<Email>>,
        audience_calls: Mutex<usize>,
    }

    impl StubGateway {
        fn failing(payload: Value) -> Self {
            Self {
                fail_with: Some(payload),
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<Email> {
            self.sent.lock().unwrap().clone()
        }

        fn error(&self) -> Option<resend::Error> {
            self.fail_with.clone().map(|body| resend::Error::Api { status: 422, body })
        }
    }

    impl Gateway for StubGateway {
        async fn send_email(&self, email: &Email) -> resend::Result<SentEmail> {
            self.sent.lock().unwrap().push(email.clone());
            match self.error() {
                Some(e) => Err(e),
                None => Ok(SentEmail {
                    id: "4ef9a417-02e9-4d39-ad75-9611e0fcc33c".into(),
                }),
            }
        }

        async fn list_audiences(&self) -> resend::Result<AudienceList> {
            *self.audience_calls.lock().unwrap() += 1;
            match self.error() {
                Some(e) => Err(e),
                None => Ok(AudienceList {
                    data: self.audiences.clone(),
                }),
            }
        }
    }

    fn tools(gateway: StubGateway, defaults: Defaults) -> EmailTools<StubGateway> {
        EmailTools::new(gateway, defaults).unwrap()
    }

    fn configured() -> Defaults {
        Defaults {
            sender: Some("team@example.com".into()),
            reply_to: vec!["support@example.com".into()],
        }
    }

    fn valid_args() -> Value {
        json!({"to": "you@example.com", "subject": "Hi", "text": "Hello"})
    }

    #[test]
    fn declares_both_tools() {
        let registry = tools(StubGateway::default(), Defaults::default());
        let names: Vec<_> = registry.tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, [SEND_EMAIL, LIST_AUDIENCES]);
    }

    #[tokio::test]
    async fn send_success_includes_provider_id() {
        let registry = tools(StubGateway::default(), configured());
        let result = registry.call(SEND_EMAIL, Some(valid_args())).await.unwrap();

        assert!(!result.is_error);
        assert_eq!(result.content.len(), 1);
        let text = result.joined_text();
        assert!(text.starts_with("Email sent successfully!"), "{text}");
        assert!(text.contains("4ef9a417-02e9-4d39-ad75-9611e0fcc33c"), "{text}");

        let sent = registry.gateway().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "team@example.com");
    }

    #[tokio::test]
    async fn provider_error_is_a_failed_result() {
        let payload = json!({"statusCode": 422, "name": "validation_error", "message": "Invalid `to` field."});
        let registry = tools(StubGateway::failing(payload), configured());
        let result = registry.call(SEND_EMAIL, Some(valid_args())).await.unwrap();

        assert!(result.is_error);
        let text = result.joined_text();
        assert!(text.starts_with("Email failed to send"), "{text}");
        assert!(text.contains("validation_error"), "{text}");
        assert!(!text.contains("successfully"), "{text}");
    }

    #[tokio::test]
    async fn missing_from_never_reaches_gateway() {
        let registry = tools(
            StubGateway::default(),
            Defaults {
                sender: None,
                reply_to: vec!["support@example.com".into()],
            },
        );
        let err = registry.call(SEND_EMAIL, Some(valid_args())).await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidArguments { ref tool, .. } if tool == SEND_EMAIL));
        assert!(registry.gateway().sent().is_empty());
    }

    #[tokio::test]
    async fn html_is_sent_alongside_text() {
        let registry = tools(StubGateway::default(), configured());
        let mut args = valid_args();
        args["html"] = json!("<p>Hello</p>");
        registry.call(SEND_EMAIL, Some(args)).await.unwrap();

        let sent = registry.gateway().sent();
        assert_eq!(sent[0].text, "Hello");
        assert_eq!(sent[0].html.as_deref(), Some("<p>Hello</p>"));
    }

    #[tokio::test]
    async fn list_audiences_summarizes() {
        let gateway = StubGateway {
            audiences: vec![
                Audience {
                    id: "aud_1".into(),
                    name: "Newsletter".into(),
                    created_at: None,
                },
                Audience {
                    id: "aud_2".into(),
                    name: "Customers".into(),
                    created_at: Some("2024-01-01".into()),
                },
            ],
            ..Default::default()
        };
        let registry = tools(gateway, Defaults::default());
        let result = registry.call(LIST_AUDIENCES, None).await.unwrap();

        assert!(!result.is_error);
        let text = result.joined_text();
        assert!(text.starts_with("Found 2 audience(s):"), "{text}");
        assert!(text.contains("Newsletter (id: aud_1)"), "{text}");
        assert!(text.contains("created 2024-01-01"), "{text}");
    }

    #[tokio::test]
    async fn list_audiences_error_is_a_failed_result() {
        let registry = tools(
            StubGateway::failing(json!({"name": "restricted_api_key"})),
            Defaults::default(),
        );
        let result = registry.call(LIST_AUDIENCES, Some(json!({}))).await.unwrap();

        assert!(result.is_error);
        assert!(result.joined_text().contains("restricted_api_key"));
        assert_eq!(*registry.gateway().audience_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_tool() {
        let registry = tools(StubGateway::default(), Defaults::default());
        let err = registry.call("send-sms", None).await.unwrap_err();
        assert_eq!(err, ToolError::NotFound("send-sms".into()));
    }
}
