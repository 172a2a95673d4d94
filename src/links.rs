use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::debug;

use crate::config::RewriteConfig;

/// Sentence punctuation that ends a query string rather than belonging to it.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '\'', '"'];

/// Finds post links in message text and rewrites them onto the canonical host.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    pattern: Regex,
    canonical_host: String,
    strip_params: Vec<String>,
    marker: Option<String>,
}

impl LinkRewriter {
    pub fn new(config: &RewriteConfig) -> Result<Self> {
        let canonical_host = config.canonical_host.trim().to_ascii_lowercase();
        if canonical_host.is_empty() {
            bail!("canonical host must not be empty");
        }

        let mut hosts = vec![regex::escape(&canonical_host)];
        hosts.extend(
            config
                .alias_hosts
                .iter()
                .map(|h| h.trim())
                .filter(|h| !h.is_empty())
                .map(regex::escape),
        );

        let pattern = format!(
            r"(?i)https?://(?:www\.|mobile\.)?(?:{})/(?P<path>[^\s?#]+?)/status/(?P<id>[0-9]+)\b(?P<query>\?[^\s#]*)?",
            hosts.join("|")
        );
        let pattern = Regex::new(&pattern)
            .with_context(|| format!("Failed to compile link pattern for hosts {:?}", hosts))?;

        let marker = Some(config.marker.trim().to_string()).filter(|m| !m.is_empty());

        Ok(Self {
            pattern,
            canonical_host,
            strip_params: config.strip_params.clone(),
            marker,
        })
    }

    /// First post link in `text`, moved to the canonical host with tracking
    /// parameters removed.
    pub fn canonicalize(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let path = &caps["path"];
        let id = &caps["id"];

        let pairs = caps
            .name("query")
            .map(|q| q.as_str()[1..].trim_end_matches(TRAILING_PUNCTUATION))
            .map(|query| self.clean_query(query))
            .unwrap_or_default();

        let mut url = format!("https://{}/{}/status/{}", self.canonical_host, path, id);
        if !pairs.is_empty() {
            url.push('?');
            url.push_str(&pairs.join("&"));
        }

        debug!("Canonicalized {} -> {}", &caps[0], url);
        Some(url)
    }

    /// Like [`canonicalize`](Self::canonicalize), with the marker appended.
    /// This is the link the bot replies with.
    pub fn rewrite(&self, text: &str) -> Option<String> {
        let mut url = self.canonicalize(text)?;
        if let Some(marker) = &self.marker {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(marker);
        }
        Some(url)
    }

    /// Query pairs that survive stripping, in their original order.
    fn clean_query<'a>(&self, query: &'a str) -> Vec<&'a str> {
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter(|pair| {
                let key = pair.split_once('=').map_or(*pair, |(key, _)| key);
                !self.strip_params.iter().any(|p| p == key)
            })
            .collect()
    }
}
