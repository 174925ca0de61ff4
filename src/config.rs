// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Interception configuration

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, ErrorContext, Result};

/// Origin allowlist entry, written like a browser match pattern
/// (`https://localhost/*`). The port is not part of the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OriginPattern {
    /// `http`, `https` or `*` (either)
    pub scheme: String,
    /// Exact host, lowercased
    pub host: String,
}

impl OriginPattern {
    /// Parse a pattern such as `http://localhost`, `https://127.0.0.1/*`
    /// or `*://localhost/*`
    pub fn parse(pattern: &str) -> Result<Self> {
        let (scheme, rest) = pattern
            .split_once("://")
            .ok_or_else(|| Error::config(format!("origin pattern missing scheme: {}", pattern)))?;

        let scheme = scheme.to_ascii_lowercase();
        if !matches!(scheme.as_str(), "http" | "https" | "*") {
            return Err(Error::config(format!(
                "unsupported scheme '{}' in origin pattern {}",
                scheme, pattern
            )));
        }

        let authority = rest.split('/').next().unwrap_or("");
        if authority.is_empty() {
            return Err(Error::config(format!("origin pattern missing host: {}", pattern)));
        }

        // Let the URL parser strip ports and handle IPv6 literals
        let probe_scheme = if scheme == "*" { "http" } else { scheme.as_str() };
        let host = Url::parse(&format!("{}://{}/", probe_scheme, authority))
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
            .ok_or_else(|| Error::config(format!("invalid host in origin pattern: {}", pattern)))?;

        Ok(Self { scheme, host })
    }

    /// Check whether a URL's scheme and host match this pattern
    pub fn matches(&self, url: &Url) -> bool {
        let scheme_ok = match self.scheme.as_str() {
            "*" => matches!(url.scheme(), "http" | "https"),
            s => url.scheme() == s,
        };

        scheme_ok
            && url
                .host_str()
                .map(|h| h.eq_ignore_ascii_case(&self.host))
                .unwrap_or(false)
    }
}

impl fmt::Display for OriginPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/*", self.scheme, self.host)
    }
}

impl TryFrom<String> for OriginPattern {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<OriginPattern> for String {
    fn from(pattern: OriginPattern) -> Self {
        pattern.to_string()
    }
}

/// Interception configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptConfig {
    /// Origins whose script requests may be rewritten
    pub origins: Vec<OriginPattern>,
    /// Extension of superset-language sources (without the dot)
    pub source_suffix: String,
    /// Extension that triggers a redirect to the source suffix
    pub alternate_suffix: String,
    /// Language tag handed to the transform service
    pub loader: String,
    /// Append an inline source map trailer when one is produced
    pub embed_source_maps: bool,
    /// Timeout for the out-of-band upstream fetch, in seconds
    pub fetch_timeout_secs: u64,
    /// Accept self-signed certificates on loopback origins
    pub accept_invalid_certs: bool,
    /// Proxy for the out-of-band fetch
    pub upstream_proxy: Option<String>,
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self {
            origins: vec![
                OriginPattern {
                    scheme: "http".to_string(),
                    host: "localhost".to_string(),
                },
                OriginPattern {
                    scheme: "https".to_string(),
                    host: "localhost".to_string(),
                },
            ],
            source_suffix: "ts".to_string(),
            alternate_suffix: "js".to_string(),
            loader: "ts".to_string(),
            embed_source_maps: true,
            fetch_timeout_secs: 30,
            accept_invalid_certs: false,
            upstream_proxy: None,
        }
    }
}

impl InterceptConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .context(&format!("reading config {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Replace the origin allowlist
    pub fn origins(mut self, origins: Vec<OriginPattern>) -> Self {
        self.origins = origins;
        self
    }

    /// Add an allowed origin
    pub fn origin(mut self, pattern: &str) -> Result<Self> {
        self.origins.push(OriginPattern::parse(pattern)?);
        Ok(self)
    }

    /// Set source suffix
    pub fn source_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.source_suffix = normalize_suffix(suffix.into());
        self
    }

    /// Set alternate suffix
    pub fn alternate_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.alternate_suffix = normalize_suffix(suffix.into());
        self
    }

    /// Set transform loader
    pub fn loader(mut self, loader: impl Into<String>) -> Self {
        self.loader = loader.into();
        self
    }

    /// Enable/disable inline source maps
    pub fn embed_source_maps(mut self, embed: bool) -> Self {
        self.embed_source_maps = embed;
        self
    }

    /// Set upstream fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Accept invalid certificates (loopback dev certs)
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Route the out-of-band fetch through a proxy
    pub fn upstream_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.upstream_proxy = Some(proxy.into());
        self
    }

    /// Upstream fetch timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Reject configs the classifier cannot act on sensibly
    pub fn validate(&self) -> Result<()> {
        if self.origins.is_empty() {
            return Err(Error::config("origin allowlist is empty"));
        }
        for (name, suffix) in [
            ("source_suffix", &self.source_suffix),
            ("alternate_suffix", &self.alternate_suffix),
        ] {
            if suffix.is_empty() || suffix.contains('.') || suffix.contains('/') {
                return Err(Error::config(format!(
                    "{} must be a bare extension, got '{}'",
                    name, suffix
                )));
            }
        }
        // Equal suffixes would redirect a request onto itself
        if self.source_suffix.eq_ignore_ascii_case(&self.alternate_suffix) {
            return Err(Error::config("source_suffix and alternate_suffix must differ"));
        }
        if self.loader.is_empty() {
            return Err(Error::config("loader must not be empty"));
        }
        Ok(())
    }
}

fn normalize_suffix(suffix: String) -> String {
    suffix.trim_start_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_pattern_parse() {
        let p = OriginPattern::parse("https://LocalHost/*").unwrap();
        assert_eq!(p.scheme, "https");
        assert_eq!(p.host, "localhost");

        let p = OriginPattern::parse("http://127.0.0.1:8080").unwrap();
        assert_eq!(p.host, "127.0.0.1");

        assert!(OriginPattern::parse("localhost").is_err());
        assert!(OriginPattern::parse("ftp://localhost").is_err());
        assert!(OriginPattern::parse("http:///path").is_err());
    }

    #[test]
    fn test_origin_pattern_matches() {
        let p = OriginPattern::parse("https://localhost/*").unwrap();
        assert!(p.matches(&Url::parse("https://localhost/app.ts").unwrap()));
        assert!(p.matches(&Url::parse("https://localhost:4443/app.ts").unwrap()));
        assert!(!p.matches(&Url::parse("http://localhost/app.ts").unwrap()));
        assert!(!p.matches(&Url::parse("https://example.com/app.ts").unwrap()));

        let any = OriginPattern::parse("*://localhost").unwrap();
        assert!(any.matches(&Url::parse("http://localhost/a.ts").unwrap()));
        assert!(!any.matches(&Url::parse("ws://localhost/a.ts").unwrap()));
    }

    #[test]
    fn test_default_config() {
        let config = InterceptConfig::default();
        assert_eq!(config.source_suffix, "ts");
        assert_eq!(config.alternate_suffix, "js");
        assert!(config.embed_source_maps);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = InterceptConfig::new()
            .origin("http://127.0.0.1")
            .unwrap()
            .source_suffix(".tsx")
            .alternate_suffix("jsx")
            .embed_source_maps(false)
            .fetch_timeout(Duration::from_secs(5));

        assert_eq!(config.origins.len(), 3);
        assert_eq!(config.source_suffix, "tsx");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(!config.embed_source_maps);
    }

    #[test]
    fn test_validate_rejects_equal_suffixes() {
        let config = InterceptConfig::new().source_suffix("js");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json() {
        let config = InterceptConfig::from_json(
            r#"{"origins": ["http://127.0.0.1/*"], "embed_source_maps": false}"#,
        )
        .unwrap();

        assert_eq!(config.origins.len(), 1);
        assert_eq!(config.origins[0].host, "127.0.0.1");
        assert_eq!(config.source_suffix, "ts");
        assert!(!config.embed_source_maps);

        assert!(InterceptConfig::from_json(r#"{"origins": ["nope"]}"#).is_err());
        assert!(InterceptConfig::from_json(r#"{"origins": []}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"source_suffix": "mts", "alternate_suffix": "mjs"}}"#).unwrap();

        let config = InterceptConfig::from_file(file.path()).unwrap();
        assert_eq!(config.source_suffix, "mts");
        assert_eq!(config.alternate_suffix, "mjs");
    }
}
