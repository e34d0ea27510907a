//! Configuration loader and validator for the hotel site.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::model::Language;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub gateway: Gateway,
    pub contact: Contact,
    pub site: Site,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    pub bind_addr: String,
    /// Absolute base URL used to build gateway callback links.
    pub public_base_url: String,
    #[serde(default)]
    pub default_language: Language,
}

/// Payment gateway (Midtrans Snap) credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gateway {
    pub server_key: String,
    pub client_key: String,
    #[serde(default)]
    pub is_production: bool,
    /// Overrides the sandbox/production endpoint, mostly for testing.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Contact form notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub operator_email: String,
    pub from_email: String,
}

/// Static page settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    pub templates_dir: String,
}

fn default_timeout_secs() -> u64 {
    30
}

impl App {
    /// Data dir with a leading `~/` expanded against `$HOME`.
    pub fn resolved_data_dir(&self) -> String {
        match self.data_dir.strip_prefix("~/") {
            Some(rest) => match std::env::var("HOME") {
                Ok(home) => format!("{}/{}", home.trim_end_matches('/'), rest),
                Err(_) => self.data_dir.clone(),
            },
            None => self.data_dir.clone(),
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(self.app.resolved_data_dir())
    }

    /// Default sqlite URL inside the data dir; `DATABASE_URL` wins when set.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| format!("sqlite://{}/lonergarden.db", self.app.resolved_data_dir()))
    }

    pub fn finish_url(&self) -> String {
        format!(
            "{}/payment/finish/",
            self.app.public_base_url.trim_end_matches('/')
        )
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.app.bind_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(ConfigError::Invalid("app.bind_addr must be host:port"));
    }
    let base = cfg.app.public_base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ConfigError::Invalid(
            "app.public_base_url must be an absolute http(s) URL",
        ));
    }

    if cfg.gateway.server_key.trim().is_empty() {
        return Err(ConfigError::Invalid("gateway.server_key must be non-empty"));
    }
    if cfg.gateway.client_key.trim().is_empty() {
        return Err(ConfigError::Invalid("gateway.client_key must be non-empty"));
    }
    if cfg.gateway.timeout_secs == 0 {
        return Err(ConfigError::Invalid("gateway.timeout_secs must be > 0"));
    }

    if !cfg.contact.operator_email.contains('@') {
        return Err(ConfigError::Invalid(
            "contact.operator_email must be an email address",
        ));
    }
    if !cfg.contact.from_email.contains('@') {
        return Err(ConfigError::Invalid("contact.from_email must be an email address"));
    }

    if cfg.site.templates_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("site.templates_dir must be non-empty"));
    }

    Ok(())
}

/// Returns the example YAML shipped with the project.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  bind_addr: "127.0.0.1:8000"
  public_base_url: "http://localhost:8000"
  default_language: "en"

gateway:
  server_key: "YOUR_MIDTRANS_SERVER_KEY"
  client_key: "YOUR_MIDTRANS_CLIENT_KEY"
  is_production: false
  timeout_secs: 30

contact:
  operator_email: "frontdesk@lonergarden.example"
  from_email: "noreply@lonergarden.example"

site:
  templates_dir: "./templates"
"#
}
