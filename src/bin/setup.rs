//! linkfixbot setup wizard.
//!
//! Asks a few questions in the terminal and writes `config.toml` into
//! `$LINKFIXBOT_ROOT` (default: the current directory). The bot token may be
//! left empty, in which case the bot reads it from `TOKEN_BOT` at startup.

use anyhow::{bail, Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// ── Config formatting ──────────────────────────────────────────────────────────

struct ConfigParams<'a> {
    tg_token: &'a str,
    canonical_host: &'a str,
    alias_hosts: &'a str,
    marker: &'a str,
    log_file: &'a str,
}

/// A TOML string literal for `s`, quoted and escaped.
fn toml_str(s: &str) -> String {
    toml::Value::String(s.to_owned()).to_string()
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> String {
    let aliases: Vec<String> = p
        .alias_hosts
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(toml_str)
        .collect();
    let aliases_str = aliases.join(", ");

    let token_line = if p.tg_token.is_empty() {
        "# bot_token = \"123456:ABC...\"  # or set TOKEN_BOT".to_owned()
    } else {
        format!("bot_token = {}", toml_str(p.tg_token))
    };

    let file_line = if p.log_file.is_empty() {
        "# file = \"logs.log\"".to_owned()
    } else {
        format!("file = {}", toml_str(p.log_file))
    };

    let canonical_host = toml_str(p.canonical_host);
    let marker = toml_str(p.marker);

    format!(
        r#"[telegram]
{token_line}

[rewrite]
canonical_host = {canonical_host}
alias_hosts = [{aliases_str}]
strip_params = ["t", "s"]
marker = {marker}

[logging]
filter = "info,linkfixbot=debug,reqwest=warn,hyper=warn"
{file_line}
"#
    )
}

// ── CLI ────────────────────────────────────────────────────────────────────────

fn run_cli(project_root: &Path) -> Result<()> {
    println!("=== linkfixbot setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let or_default = |s: String, default: &str| {
        if s.is_empty() {
            default.to_owned()
        } else {
            s
        }
    };

    let config_path = project_root.join("config.toml");
    if config_path.exists() {
        let answer = read_line(&format!(
            "{} already exists. Overwrite? [y/N]: ",
            config_path.display()
        ))?;
        if !answer.eq_ignore_ascii_case("y") {
            bail!("Aborted, {} left unchanged", config_path.display());
        }
    }

    let tg_token = read_line("Telegram bot token (empty to use TOKEN_BOT): ")?;
    let canonical_host = or_default(
        read_line("Rewrite links to host [twitter.com]: ")?,
        "twitter.com",
    );
    let alias_hosts = or_default(
        read_line("Hosts to rewrite from (comma-separated) [x.com]: ")?,
        "x.com",
    );
    let marker = or_default(read_line("Marker appended to links [=19]: ")?, "=19");
    let log_file = read_line("Log file (optional, e.g. logs.log): ")?;

    let config = format_config(&ConfigParams {
        tg_token: &tg_token,
        canonical_host: &canonical_host,
        alias_hosts: &alias_hosts,
        marker: &marker,
        log_file: &log_file,
    });

    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("   Run the bot with:  cargo run");
    Ok(())
}

fn main() -> Result<()> {
    let project_root =
        PathBuf::from(std::env::var("LINKFIXBOT_ROOT").unwrap_or_else(|_| ".".to_string()));
    run_cli(&project_root)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(tg_token: &str, canonical_host: &str, alias_hosts: &str, marker: &str, log_file: &str) -> String {
        format_config(&ConfigParams {
            tg_token,
            canonical_host,
            alias_hosts,
            marker,
            log_file,
        })
    }

    #[test]
    fn test_telegram_token_written() {
        let out = cfg("mytoken", "twitter.com", "x.com", "=19", "");
        assert!(out.contains("[telegram]"));
        assert!(out.contains(r#"bot_token = "mytoken""#));
    }

    #[test]
    fn test_token_commented_when_empty() {
        let out = cfg("", "twitter.com", "x.com", "=19", "");
        assert!(out.contains("# bot_token ="));
        assert!(!out.contains("\nbot_token = "));
    }

    #[test]
    fn test_rewrite_section_present() {
        let out = cfg("t", "fxtwitter.com", "x.com", "=19", "");
        assert!(out.contains("[rewrite]"));
        assert!(out.contains(r#"canonical_host = "fxtwitter.com""#));
        assert!(out.contains(r#"strip_params = ["t", "s"]"#));
        assert!(out.contains(r#"marker = "=19""#));
    }

    #[test]
    fn test_multiple_alias_hosts_comma_separated() {
        let out = cfg("t", "twitter.com", "x.com, mobile.x.com,  vxtwitter.com", "=19", "");
        assert!(out.contains(r#"alias_hosts = ["x.com", "mobile.x.com", "vxtwitter.com"]"#));
    }

    #[test]
    fn test_log_file_included_when_set() {
        let out = cfg("t", "twitter.com", "x.com", "=19", "logs.log");
        assert!(out.contains("[logging]"));
        assert!(out.contains(r#"file = "logs.log""#));
    }

    #[test]
    fn test_log_file_commented_when_empty() {
        let out = cfg("t", "twitter.com", "x.com", "=19", "");
        assert!(out.contains("# file ="));
        assert!(!out.contains("\nfile = "));
    }

    #[test]
    fn test_output_is_valid_toml() {
        let out = cfg("t", "twitter.com", "x.com, vxtwitter.com", "", "logs.log");
        let value: toml::Value = toml::from_str(&out).unwrap();
        assert_eq!(value["rewrite"]["alias_hosts"].as_array().unwrap().len(), 2);
        assert_eq!(value["rewrite"]["marker"].as_str(), Some(""));
        assert_eq!(value["telegram"]["bot_token"].as_str(), Some("t"));
    }

    #[test]
    fn test_quotes_and_backslashes_are_escaped() {
        let out = cfg(
            r#"12:ab"c\d"#,
            "twitter.com",
            "x.com",
            r#"="19"\"#,
            r"C:\logs\bot.log",
        );
        let value: toml::Value = toml::from_str(&out).unwrap();
        assert_eq!(value["telegram"]["bot_token"].as_str(), Some(r#"12:ab"c\d"#));
        assert_eq!(value["rewrite"]["marker"].as_str(), Some(r#"="19"\"#));
        assert_eq!(value["logging"]["file"].as_str(), Some(r"C:\logs\bot.log"));
    }
}
