// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for scriptshim
//!
//! Every failure inside the body pipeline is recoverable from the page's point
//! of view: the proxy maps these errors onto a passthrough response. The
//! variants carry enough context (URL, status) to log a useful line.

use thiserror::Error;

/// Result type alias for scriptshim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for scriptshim
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a status was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Upstream answered with something other than 200
    #[error("Upstream returned {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },

    /// Upstream body could not be decoded as source text
    #[error("Upstream body for {url} is not valid UTF-8")]
    InvalidSourceText { url: String },

    /// Transform service rejected the source
    #[error("Transform failed for {source_name}: {reason}")]
    Transform { source_name: String, reason: String },

    /// Transform service never became ready
    #[error("Transform service initialization failed: {0}")]
    Initialization(String),

    /// Writing to or closing a response filter failed
    #[error("Response filter error for request {request_id}: {reason}")]
    Filter { request_id: u64, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an upstream status error
    pub fn upstream_status(url: impl Into<String>, status: u16) -> Self {
        Error::UpstreamStatus {
            url: url.into(),
            status,
        }
    }

    /// Create a transform error
    pub fn transform(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Transform {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Create an initialization error
    pub fn initialization<S: Into<String>>(msg: S) -> Self {
        Error::Initialization(msg.into())
    }

    /// Create a filter error
    pub fn filter(request_id: u64, reason: impl Into<String>) -> Self {
        Error::Filter {
            request_id,
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::UpstreamStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add operation context to error
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            Error::Other(format!("{}: {}", msg, err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_error() {
        let err = Error::upstream_status("https://localhost/app.ts", 404);

        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.to_string(), "Upstream returned 404 for https://localhost/app.ts");
    }

    #[test]
    fn test_transform_errors() {
        let err = Error::transform("app.ts", "Unexpected token");
        assert_eq!(err.to_string(), "Transform failed for app.ts: Unexpected token");
        assert_eq!(err.status_code(), None);

        let init = Error::initialization("compiler missing");
        assert_eq!(
            init.to_string(),
            "Transform service initialization failed: compiler missing"
        );
    }

    #[test]
    fn test_context() {
        let res: std::result::Result<(), &str> = Err("boom");
        let err = res.context("loading config").unwrap_err();
        assert_eq!(err.to_string(), "loading config: boom");
    }
}
