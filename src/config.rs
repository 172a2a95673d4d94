use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the Telegram bot token.
pub const TOKEN_ENV: &str = "TOKEN_BOT";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub rewrite: RewriteConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RewriteConfig {
    /// Host every matched link is rewritten to
    #[serde(default = "default_canonical_host")]
    pub canonical_host: String,
    /// Other hosts serving the same posts
    #[serde(default = "default_alias_hosts")]
    pub alias_hosts: Vec<String>,
    /// Query keys dropped from rewritten links
    #[serde(default = "default_strip_params")]
    pub strip_params: Vec<String>,
    /// Query pair appended to rewritten links; empty disables it
    #[serde(default = "default_marker")]
    pub marker: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            canonical_host: default_canonical_host(),
            alias_hosts: default_alias_hosts(),
            strip_params: default_strip_params(),
            marker: default_marker(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directives, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Optional file that receives a plain-text copy of the log
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: None,
        }
    }
}

fn default_canonical_host() -> String {
    "twitter.com".to_string()
}

fn default_alias_hosts() -> Vec<String> {
    vec!["x.com".to_string()]
}

fn default_strip_params() -> Vec<String> {
    vec!["t".to_string(), "s".to_string()]
}

fn default_marker() -> String {
    "=19".to_string()
}

fn default_log_filter() -> String {
    "info,linkfixbot=debug,reqwest=warn,hyper=warn".to_string()
}

impl Config {
    /// Load the config file (if any) and resolve the bot token.
    ///
    /// A missing file is only an error when `required` is set, i.e. when the
    /// path was passed explicitly on the command line.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        let content = if path.exists() {
            Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?,
            )
        } else if required {
            bail!("Config file not found: {}", path.display());
        } else {
            None
        };

        let env_token = std::env::var(TOKEN_ENV).ok();
        Self::from_parts(content.as_deref(), env_token)
            .with_context(|| format!("Invalid configuration ({})", path.display()))
    }

    /// Build a config from optional TOML content and the token environment
    /// value. A non-empty environment token wins over `[telegram] bot_token`.
    pub fn from_parts(content: Option<&str>, env_token: Option<String>) -> Result<Self> {
        let mut config: Config = match content {
            Some(content) => toml::from_str(content).context("Failed to parse config file")?,
            None => Config::default(),
        };

        if let Some(token) = env_token.map(|t| t.trim().to_string()) {
            if !token.is_empty() {
                config.telegram.bot_token = token;
            }
        }

        if config.telegram.bot_token.trim().is_empty() {
            bail!(
                "No bot token: set {} or [telegram] bot_token in the config file",
                TOKEN_ENV
            );
        }

        if config.rewrite.canonical_host.trim().is_empty() {
            bail!("[rewrite] canonical_host must not be empty");
        }

        Ok(config)
    }
}
