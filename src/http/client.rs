// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client implementation

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::Client;
use url::Url;

use super::response::Response;
use super::{UpstreamFetcher, DEFAULT_USER_AGENT};
use crate::config::InterceptConfig;
use crate::error::{Error, Result};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// User agent string
    pub user_agent: String,
    /// Default timeout
    pub timeout: Duration,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Accept invalid certificates (loopback dev certs only)
    pub accept_invalid_certs: bool,
    /// Default headers
    pub default_headers: HeaderMap,
    /// Proxy URL
    pub proxy: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("accept", HeaderValue::from_static("*/*"));

        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            accept_invalid_certs: false,
            default_headers,
            proxy: None,
        }
    }
}

impl From<&InterceptConfig> for HttpClientConfig {
    fn from(config: &InterceptConfig) -> Self {
        Self {
            timeout: config.timeout(),
            accept_invalid_certs: config.accept_invalid_certs,
            proxy: config.upstream_proxy.clone(),
            ..Default::default()
        }
    }
}

/// HTTP client used for the out-of-band fetch
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .default_headers(config.default_headers.clone());

        if let Some(ref proxy_url) = config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?,
            );
        }

        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Execute a GET request and buffer the whole body
    pub async fn get(&self, url: &Url) -> Result<Response> {
        let start = Instant::now();

        let response = self.client.get(url.clone()).send().await?;

        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        let response_time = start.elapsed().as_millis() as u64;

        tracing::debug!(
            url = %url,
            status = %status,
            bytes = body.len(),
            time_ms = response_time,
            "Upstream fetch complete"
        );

        Ok(Response::new(status, headers, body, final_url, response_time))
    }

    /// Get client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[async_trait]
impl UpstreamFetcher for HttpClient {
    async fn fetch(&self, url: &Url) -> Result<Response> {
        self.get(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new().unwrap();
        assert_eq!(client.config().user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_config_from_intercept_config() {
        let intercept = InterceptConfig::new()
            .fetch_timeout(Duration::from_secs(7))
            .accept_invalid_certs(true)
            .upstream_proxy("http://127.0.0.1:3128");
        let config = HttpClientConfig::from(&intercept);

        assert_eq!(config.timeout, Duration::from_secs(7));
        assert!(config.accept_invalid_certs);
        assert_eq!(config.proxy.as_deref(), Some("http://127.0.0.1:3128"));
        assert!(HttpClient::with_config(config).is_ok());
    }

    #[test]
    fn test_invalid_proxy() {
        let intercept = InterceptConfig::new().upstream_proxy("::not a url::");
        let config = HttpClientConfig::from(&intercept);
        assert!(matches!(HttpClient::with_config(config), Err(Error::Config(_))));
    }
}
