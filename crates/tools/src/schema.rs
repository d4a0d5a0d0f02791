//! Argument schema for `send-email`.
//!
//! The sender and reply-to fields either come from the call or from startup
//! configuration. Which one is fixed when the registry is built, so the
//! declared JSON schema and the validator always agree.

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::address::is_valid_address;
use crate::error::{Error, Result};

/// Where a defaultable argument comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Declared in the schema and required on every call.
    FromArguments,
    /// Not declared; this configured value is always used.
    Configured(T),
}

impl<T> Resolution<T> {
    pub fn is_argument(&self) -> bool {
        matches!(self, Self::FromArguments)
    }
}

/// Startup defaults for `send-email`.
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    pub sender: Option<String>,
    pub reply_to: Vec<String>,
}

/// The schema variant chosen at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SendEmailSchema {
    pub sender: Resolution<String>,
    pub reply_to: Resolution<Vec<String>>,
    input_schema: Value,
}

impl SendEmailSchema {
    /// Pick the variant for `defaults`, rejecting malformed default addresses.
    pub fn new(defaults: Defaults) -> Result<Self> {
        let sender = match defaults.sender {
            Some(address) if is_valid_address(&address) => Resolution::Configured(address),
            Some(address) => return Err(Error::InvalidDefault(address)),
            None => Resolution::FromArguments,
        };

        if let Some(bad) = defaults.reply_to.iter().find(|a| !is_valid_address(a)) {
            return Err(Error::InvalidDefault(bad.clone()));
        }
        let reply_to = if defaults.reply_to.is_empty() {
            Resolution::FromArguments
        } else {
            Resolution::Configured(defaults.reply_to)
        };

        let schema = match (sender.is_argument(), reply_to.is_argument()) {
            (false, false) => schema_for!(SendEmailArgs),
            (true, false) => schema_for!(WithSender<SendEmailArgs>),
            (false, true) => schema_for!(WithReplyTo<SendEmailArgs>),
            (true, true) => schema_for!(WithSender<WithReplyTo<SendEmailArgs>>),
        };
        let mut input_schema = schema.to_value();
        if let Some(object) = input_schema.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }

        Ok(Self {
            sender,
            reply_to,
            input_schema,
        })
    }

    /// JSON schema advertised in `tools/list`.
    pub fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    /// Validate `arguments` and build the provider request.
    ///
    /// Parses into the same type the advertised schema was derived from,
    /// then checks what the schema cannot express. Returns a human-readable
    /// reason on failure.
    pub fn validate(&self, arguments: Option<Value>) -> std::result::Result<resend::Email, String> {
        let arguments = arguments.unwrap_or_else(|| Value::Object(Map::new()));

        let (args, from, reply_to) = match (&self.sender, &self.reply_to) {
            (Resolution::Configured(from), Resolution::Configured(reply_to)) => {
                let args: SendEmailArgs = parse(arguments)?;
                (args, from.clone(), reply_to.clone())
            }
            (Resolution::FromArguments, Resolution::Configured(reply_to)) => {
                let parsed: WithSender<SendEmailArgs> = parse(arguments)?;
                (parsed.args, parsed.from, reply_to.clone())
            }
            (Resolution::Configured(from), Resolution::FromArguments) => {
                let parsed: WithReplyTo<SendEmailArgs> = parse(arguments)?;
                (parsed.args, from.clone(), parsed.reply_to)
            }
            (Resolution::FromArguments, Resolution::FromArguments) => {
                let parsed: WithSender<WithReplyTo<SendEmailArgs>> = parse(arguments)?;
                (parsed.args.args, parsed.from, parsed.args.reply_to)
            }
        };

        require_address("to", &args.to)?;
        require_text("subject", &args.subject)?;
        require_text("text", &args.text)?;
        let cc = optional_addresses("cc", args.cc)?;
        let bcc = optional_addresses("bcc", args.bcc)?;

        if self.sender.is_argument() {
            require_address("from", &from)?;
        }
        if self.reply_to.is_argument() {
            if reply_to.is_empty() {
                return Err("`replyTo` must contain at least one address".into());
            }
            for address in &reply_to {
                require_address("replyTo", address)?;
            }
        }

        Ok(resend::Email {
            from,
            to: vec![args.to],
            subject: args.subject,
            text: args.text,
            html: args.html,
            cc,
            bcc,
            reply_to,
            scheduled_at: args.scheduled_at,
        })
    }
}

/// `send-email` arguments common to every schema variant.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendEmailArgs {
    /// Recipient email address
    #[schemars(extend("format" = "email"))]
    pub to: String,

    /// Email subject line
    #[schemars(extend("minLength" = 1))]
    pub subject: String,

    /// Plain text email content
    #[schemars(extend("minLength" = 1))]
    pub text: String,

    /// HTML email content. Sent alongside the plain text version, never instead of it.
    #[serde(default)]
    pub html: Option<String>,

    /// Optional array of CC email addresses. You MUST ask the user for this parameter. Under no circumstance provide it yourself
    #[serde(default)]
    pub cc: Option<Vec<String>>,

    /// Optional array of BCC email addresses. You MUST ask the user for this parameter. Under no circumstance provide it yourself
    #[serde(default)]
    pub bcc: Option<Vec<String>>,

    /// Optional parameter to schedule the email. This uses natural language. Examples would be 'tomorrow at 10am' or 'in 2 hours' or 'next day at 9am PST' or 'Friday at 3pm ET'.
    #[serde(default)]
    pub scheduled_at: Option<String>,
}

/// Adds a required `from` argument to `T`.
#[derive(Debug, Deserialize, JsonSchema)]
pub(crate) struct WithSender<T> {
    #[serde(flatten)]
    pub args: T,

    /// Sender email address. You MUST ask the user for this parameter. Under no circumstance provide it yourself
    #[schemars(extend("format" = "email"))]
    pub from: String,
}

/// Adds a required `replyTo` argument to `T`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WithReplyTo<T> {
    #[serde(flatten)]
    pub args: T,

    /// Reply-to email addresses. You MUST ask the user for this parameter. Under no circumstance provide it yourself
    pub reply_to: Vec<String>,
}

fn parse<T: DeserializeOwned>(arguments: Value) -> std::result::Result<T, String> {
    serde_json::from_value(arguments).map_err(|e| e.to_string())
}

fn require_address(field: &str, address: &str) -> std::result::Result<(), String> {
    if is_valid_address(address) {
        Ok(())
    } else {
        Err(format!("`{field}` is not a valid email address: {address:?}"))
    }
}

fn require_text(field: &str, value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("`{field}` must not be empty"))
    } else {
        Ok(())
    }
}

fn optional_addresses(
    field: &str,
    addresses: Option<Vec<String>>,
) -> std::result::Result<Vec<String>, String> {
    let addresses = addresses.unwrap_or_default();
    for address in &addresses {
        require_address(field, address)?;
    }
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_defaults() -> SendEmailSchema {
        SendEmailSchema::new(Defaults::default()).unwrap()
    }

    fn with_defaults() -> SendEmailSchema {
        SendEmailSchema::new(Defaults {
            sender: Some("team@example.com".into()),
            reply_to: vec!["support@example.com".into()],
        })
        .unwrap()
    }

    fn required(schema: &SendEmailSchema) -> Vec<String> {
        let mut fields: Vec<String> =
            serde_json::from_value(schema.input_schema()["required"].clone()).unwrap();
        fields.sort();
        fields
    }

    #[test]
    fn schema_declares_from_without_defaults() {
        let schema = no_defaults();
        let json = schema.input_schema();
        assert!(json["properties"]["from"].is_object());
        assert!(json["properties"]["replyTo"].is_object());
        assert_eq!(required(&schema), ["from", "replyTo", "subject", "text", "to"]);
    }

    #[test]
    fn schema_hides_configured_fields() {
        let schema = with_defaults();
        let json = schema.input_schema();
        assert!(json["properties"].get("from").is_none());
        assert!(json["properties"].get("replyTo").is_none());
        assert_eq!(required(&schema), ["subject", "text", "to"]);
    }

    #[test]
    fn schema_variants_follow_each_default() {
        let sender_only = SendEmailSchema::new(Defaults {
            sender: Some("team@example.com".into()),
            reply_to: Vec::new(),
        })
        .unwrap();
        assert_eq!(required(&sender_only), ["replyTo", "subject", "text", "to"]);
        assert!(sender_only.input_schema()["properties"].get("from").is_none());

        let reply_to_only = SendEmailSchema::new(Defaults {
            sender: None,
            reply_to: vec!["support@example.com".into()],
        })
        .unwrap();
        assert_eq!(required(&reply_to_only), ["from", "subject", "text", "to"]);
        assert!(reply_to_only.input_schema()["properties"].get("replyTo").is_none());
    }

    #[test]
    fn schema_carries_field_docs() {
        let json = no_defaults().input_schema();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["to"]["description"], "Recipient email address");
        assert_eq!(json["properties"]["to"]["format"], "email");
        assert_eq!(json["properties"]["subject"]["minLength"], 1);
        assert!(json["properties"]["scheduledAt"]["description"]
            .as_str()
            .unwrap()
            .contains("natural language"));
        assert!(json.get("$schema").is_none());
    }

    #[test]
    fn argued_reply_to_must_be_valid_and_non_empty() {
        let schema = no_defaults();
        let base = json!({
            "to": "you@example.com", "subject": "Hi", "text": "Hello",
            "from": "me@example.com"
        });

        let mut empty = base.clone();
        empty["replyTo"] = json!([]);
        assert!(schema.validate(Some(empty)).unwrap_err().contains("replyTo"));

        let mut broken = base.clone();
        broken["replyTo"] = json!(["broken"]);
        assert!(schema.validate(Some(broken)).unwrap_err().contains("`replyTo`"));

        let mut bad_from = base;
        bad_from["from"] = json!("nobody");
        bad_from["replyTo"] = json!(["reply@example.com"]);
        assert!(schema.validate(Some(bad_from)).unwrap_err().contains("`from`"));
    }

    #[test]
    fn invalid_default_is_rejected() {
        let err = SendEmailSchema::new(Defaults {
            sender: Some("not-an-address".into()),
            reply_to: Vec::new(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDefault(a) if a == "not-an-address"));
    }

    #[test]
    fn missing_from_fails_without_default() {
        let err = no_defaults()
            .validate(Some(json!({
                "to": "you@example.com", "subject": "Hi", "text": "Hello",
                "replyTo": ["me@example.com"]
            })))
            .unwrap_err();
        assert!(err.contains("from"), "{err}");
    }

    #[test]
    fn configured_values_win_over_arguments() {
        let email = with_defaults()
            .validate(Some(json!({
                "to": "you@example.com", "subject": "Hi", "text": "Hello",
                "from": "someone-else@example.com"
            })))
            .unwrap();
        assert_eq!(email.from, "team@example.com");
        assert_eq!(email.reply_to, ["support@example.com"]);
    }

    #[test]
    fn full_arguments_map_to_provider_request() {
        let email = no_defaults()
            .validate(Some(json!({
                "to": "you@example.com",
                "subject": "Launch",
                "text": "We launched",
                "html": "<b>We launched</b>",
                "cc": ["cc@example.com"],
                "bcc": ["bcc@example.com"],
                "scheduledAt": "tomorrow at 10am",
                "from": "me@example.com",
                "replyTo": ["reply@example.com"]
            })))
            .unwrap();
        assert_eq!(email.to, ["you@example.com"]);
        assert_eq!(email.text, "We launched");
        assert_eq!(email.html.as_deref(), Some("<b>We launched</b>"));
        assert_eq!(email.scheduled_at.as_deref(), Some("tomorrow at 10am"));
        assert_eq!(email.cc, ["cc@example.com"]);
        assert_eq!(email.bcc, ["bcc@example.com"]);
    }

    #[test]
    fn rejects_bad_fields() {
        let schema = with_defaults();
        let base = json!({"to": "you@example.com", "subject": "Hi", "text": "Hello"});

        let mut bad_to = base.clone();
        bad_to["to"] = json!("nobody");
        assert!(schema.validate(Some(bad_to)).unwrap_err().contains("`to`"));

        let mut empty_subject = base.clone();
        empty_subject["subject"] = json!("  ");
        assert!(schema.validate(Some(empty_subject)).unwrap_err().contains("`subject`"));

        let mut bad_cc = base.clone();
        bad_cc["cc"] = json!(["ok@example.com", "broken"]);
        assert!(schema.validate(Some(bad_cc)).unwrap_err().contains("`cc`"));

        let mut two_recipients = base;
        two_recipients["to"] = json!(["a@example.com", "b@example.com"]);
        assert!(schema.validate(Some(two_recipients)).is_err());
    }

    #[test]
    fn missing_arguments_object() {
        let err = with_defaults().validate(None).unwrap_err();
        assert!(err.contains("missing field"), "{err}");
    }
}
