//! Startup configuration.
//!
//! Each setting is taken from the command line, then the environment (both
//! handled by clap), then the optional TOML file, then the built-in default.
//! The result is resolved once and never changes afterwards.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use policy::OriginPolicy;
use serde::Deserialize;
use tools::{Defaults, SendEmailSchema};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

/// How clients reach the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// One client over standard input/output.
    #[default]
    Pipe,
    /// Many clients over HTTP with server-sent events.
    Http,
}

#[derive(Debug, Default, Parser)]
#[command(name = "resend-mcp")]
#[command(about = "MCP server for sending email through Resend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Optional TOML file with the same settings
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Transport to serve on
    #[arg(long, env = "MCP_TRANSPORT", value_enum)]
    pub transport: Option<Transport>,

    /// HTTP bind host
    #[arg(long, env = "MCP_HOST")]
    pub host: Option<String>,

    /// HTTP bind port
    #[arg(long, env = "MCP_PORT")]
    pub port: Option<u16>,

    /// The only browser origin admitted (default: loopback origins)
    #[arg(long, env = "MCP_ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// Resend API key
    #[arg(long, env = "RESEND_API_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Default sender address; when set, `from` is not a tool argument
    #[arg(long, env = "SENDER_EMAIL_ADDRESS")]
    pub sender: Option<String>,

    /// Default reply-to addresses; when set, `replyTo` is not a tool argument
    #[arg(long = "reply-to", env = "REPLY_TO_EMAIL_ADDRESSES", value_delimiter = ',')]
    pub reply_to: Vec<String>,
}

/// Settings read from `--config`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub transport: Option<Transport>,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub resend: ResendSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResendSection {
    pub api_key: Option<String>,
    pub sender: Option<String>,
    #[serde(default)]
    pub reply_to: Vec<String>,
}

impl FileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub origin_policy: OriginPolicy,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub transport: Transport,
    pub http: HttpConfig,
    pub api_key: String,
    pub defaults: Defaults,
}

impl Config {
    /// Resolve `cli`, reading the file it names if any.
    pub fn load(cli: Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merge command line (with environment) over file over defaults.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let api_key = cli
            .key
            .or(file.resend.api_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let allowed_origin = cli.allowed_origin.or(file.http.allowed_origin);
        let origin_policy = OriginPolicy::from_config(allowed_origin.as_deref())?;

        let reply_to = if cli.reply_to.is_empty() {
            file.resend.reply_to
        } else {
            cli.reply_to
        };
        let defaults = Defaults {
            sender: cli
                .sender
                .or(file.resend.sender)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            reply_to: reply_to
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        };
        SendEmailSchema::new(defaults.clone())?;

        Ok(Self {
            transport: cli.transport.or(file.transport).unwrap_or_default(),
            http: HttpConfig {
                host: cli
                    .host
                    .or(file.http.host)
                    .unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: cli.port.or(file.http.port).unwrap_or(DEFAULT_PORT),
                origin_policy,
            },
            api_key,
            defaults,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("no Resend API key: pass --key, set RESEND_API_KEY or resend.api_key")]
    MissingApiKey,

    #[error(transparent)]
    Origin(#[from] policy::Error),

    #[error(transparent)]
    Defaults(#[from] tools::Error),
}
