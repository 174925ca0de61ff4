// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Identity transform

use async_trait::async_trait;

use super::{TransformRequest, TransformResult, TransformService};
use crate::error::Result;

/// Emits the source unchanged apart from ending it with exactly one newline
///
/// Serves sources that are already valid target-language text, and stands in
/// for a real compiler in tests and when no compiler is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransform;

impl PassthroughTransform {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransformService for PassthroughTransform {
    async fn transform(&self, request: TransformRequest) -> Result<TransformResult> {
        let body = request.source_text.trim_end_matches(['\n', '\r']);
        let code = if body.is_empty() {
            String::new()
        } else {
            format!("{}\n", body)
        };
        Ok(TransformResult::code(code))
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: &str) -> TransformRequest {
        TransformRequest {
            source_text: source.to_string(),
            source_name: "app.ts".to_string(),
            loader: "ts".to_string(),
            sourcemap: true,
        }
    }

    #[tokio::test]
    async fn test_appends_single_newline() {
        let t = PassthroughTransform::new();
        assert_eq!(t.transform(request("const x = 1;")).await.unwrap().code, "const x = 1;\n");
        assert_eq!(t.transform(request("const x = 1;\n\n")).await.unwrap().code, "const x = 1;\n");
        assert_eq!(t.transform(request("")).await.unwrap().code, "");
    }

    #[test]
    fn test_deterministic() {
        let t = PassthroughTransform::new();
        let a = tokio_test::block_on(t.transform(request("let a = 1;\r\n"))).unwrap();
        let b = tokio_test::block_on(t.transform(request("let a = 1;\r\n"))).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.code, "let a = 1;\n");
        assert!(a.map.is_none());
    }
}
