// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP response types

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use url::Url;

use crate::error::{Error, Result};

/// Upstream response, fully buffered
#[derive(Debug, Clone)]
pub struct Response {
    /// Response status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
    /// Final URL
    pub url: Url,
    /// Response time in milliseconds
    pub response_time_ms: u64,
}

impl Response {
    /// Create a new response
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        url: Url,
        response_time_ms: u64,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            url,
            response_time_ms,
        }
    }

    /// Check for exactly 200, the only status the body proxy transforms
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Get status code as u16
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Get body as text
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|_| Error::InvalidSourceText {
            url: self.url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: StatusCode, body: &'static [u8]) -> Response {
        Response::new(
            status,
            HeaderMap::new(),
            Bytes::from_static(body),
            Url::parse("https://localhost/app.ts").unwrap(),
            3,
        )
    }

    #[test]
    fn test_response_status() {
        let resp = response(StatusCode::OK, b"");
        assert!(resp.is_ok());
        assert_eq!(resp.status_code(), 200);

        // 2xx other than 200 is not transformable
        let resp = response(StatusCode::NO_CONTENT, b"");
        assert!(!resp.is_ok());
    }

    #[test]
    fn test_response_text() {
        let resp = response(StatusCode::OK, b"const x = 1;");
        assert_eq!(resp.text().unwrap(), "const x = 1;");

        let resp = response(StatusCode::OK, &[0xff, 0xfe, 0x00]);
        assert!(matches!(resp.text(), Err(Error::InvalidSourceText { .. })));
    }
}
