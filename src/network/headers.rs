// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Headers-received phase handler

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};

use super::classifier::Classifier;
use super::request::InterceptedRequest;

/// Content type served for every rewritten body
pub const SCRIPT_CONTENT_TYPE: &str = "application/javascript";

/// Replaces `Content-Type` on eligible responses
#[derive(Debug, Clone)]
pub struct HeaderRewriter {
    classifier: Arc<Classifier>,
}

impl HeaderRewriter {
    pub fn new(classifier: Arc<Classifier>) -> Self {
        Self { classifier }
    }

    /// Returns the replacement header set, or `None` to leave headers as they are
    ///
    /// Any upstream `Content-Type` values are dropped rather than merged.
    /// `Content-Length` is dropped too since the body is about to change size.
    pub fn on_headers_received(
        &self,
        request: &InterceptedRequest,
        headers: &HeaderMap,
    ) -> Option<HeaderMap> {
        if !self.classifier.classify_request(request).is_eligible() {
            return None;
        }

        let mut rewritten = headers.clone();
        rewritten.remove(CONTENT_TYPE);
        rewritten.remove(CONTENT_LENGTH);
        rewritten.insert(CONTENT_TYPE, HeaderValue::from_static(SCRIPT_CONTENT_TYPE));

        tracing::debug!(
            request_id = %request.id,
            url = %request.url,
            "Rewrote content type"
        );

        Some(rewritten)
    }
}
