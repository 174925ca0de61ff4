// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Body transform proxy
//!
//! Handles the before-request phase of an eligible request: fetches the same
//! URL out of band, transforms the source on a 200, and writes the result into
//! the request's response filter. Whatever happens on the way, the filter is
//! closed exactly once and the page gets a body, transformed or not.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use super::classifier::Classifier;
use super::filter::ResponseFilter;
use super::request::InterceptedRequest;
use crate::config::InterceptConfig;
use crate::error::{Error, Result};
use crate::http::{Response, UpstreamFetcher};
use crate::transform::{render_output, TransformEngine, TransformRequest};

/// How a request left the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transformed body delivered
    Transformed { warnings: usize },
    /// Upstream failed; raw bytes (possibly none) delivered
    UpstreamFailure { status: Option<u16> },
    /// Transform or its initialization failed; raw bytes delivered
    TransformFailure,
    /// Request was not eligible; filter closed without a body
    Passthrough,
    /// Host tore the request down before delivery
    Abandoned,
}

/// Per-request state carried through the pipeline stages
///
/// Owns the response filter. If the context is dropped without delivering
/// (task aborted, panic), the filter is closed on drop.
pub struct RequestContext {
    request: InterceptedRequest,
    source_name: String,
    filter: Option<Box<dyn ResponseFilter>>,
}

impl RequestContext {
    /// Bind a filter to a request
    pub fn new(request: InterceptedRequest, filter: Box<dyn ResponseFilter>, suffix: &str) -> Self {
        let source_name = request
            .file_name()
            .map(String::from)
            .unwrap_or_else(|| format!("input.{}", suffix));

        Self {
            request,
            source_name,
            filter: Some(filter),
        }
    }

    /// Name handed to the transform service
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// False once the host has torn the request down
    pub fn is_open(&self) -> bool {
        self.filter.as_ref().map(|f| f.is_open()).unwrap_or(false)
    }

    /// Write the body and close the filter; returns whether the host got it
    fn deliver(&mut self, body: Bytes) -> bool {
        let Some(mut filter) = self.filter.take() else {
            return false;
        };

        let mut delivered = filter.is_open();
        if delivered && !body.is_empty() {
            if let Err(e) = filter.write(body) {
                tracing::debug!(request_id = %self.request.id, error = %e, "Filter write dropped");
                delivered = false;
            }
        }

        if let Err(e) = filter.close() {
            tracing::debug!(request_id = %self.request.id, error = %e, "Filter close dropped");
            delivered = false;
        }

        delivered
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        if let Some(filter) = self.filter.take() {
            tracing::debug!(request_id = %self.request.id, "Closing filter of abandoned request");
            let _ = filter.close();
        }
    }
}

/// Before-request phase handler for eligible requests
pub struct BodyTransformProxy {
    classifier: Arc<Classifier>,
    fetcher: Arc<dyn UpstreamFetcher>,
    engine: Arc<TransformEngine>,
    loader: String,
    embed_source_maps: bool,
}

impl BodyTransformProxy {
    pub fn new(
        config: &InterceptConfig,
        classifier: Arc<Classifier>,
        fetcher: Arc<dyn UpstreamFetcher>,
        engine: Arc<TransformEngine>,
    ) -> Self {
        Self {
            classifier,
            fetcher,
            engine,
            loader: config.loader.clone(),
            embed_source_maps: config.embed_source_maps,
        }
    }

    /// Whether a filter should be bound for this request at all
    pub fn wants_filter(&self, request: &InterceptedRequest) -> bool {
        self.classifier.classify_request(request).is_eligible()
    }

    /// Bind a filter to a request ahead of processing
    ///
    /// From here on the filter is closed even if the context is dropped
    /// before [`process_context`](Self::process_context) ever runs.
    pub fn context(&self, request: InterceptedRequest, filter: Box<dyn ResponseFilter>) -> RequestContext {
        RequestContext::new(request, filter, self.classifier.source_suffix())
    }

    /// Run the pipeline for one request, consuming its filter
    pub async fn process(
        &self,
        request: InterceptedRequest,
        filter: Box<dyn ResponseFilter>,
    ) -> Outcome {
        self.process_context(self.context(request, filter)).await
    }

    /// Run the pipeline for a request already bound to its filter
    pub async fn process_context(&self, mut ctx: RequestContext) -> Outcome {
        let start = Instant::now();

        let (body, outcome) = self.produce(&ctx).await;

        let outcome = if ctx.deliver(body) {
            outcome
        } else {
            Outcome::Abandoned
        };

        tracing::info!(
            request_id = %ctx.request.id,
            url = %ctx.request.url,
            outcome = ?outcome,
            time_ms = start.elapsed().as_millis() as u64,
            "Script request finished"
        );

        outcome
    }

    /// Body to deliver and the path taken; never fails
    async fn produce(&self, ctx: &RequestContext) -> (Bytes, Outcome) {
        let request = &ctx.request;

        if !self.wants_filter(request) {
            tracing::warn!(request_id = %request.id, url = %request.url, "Filter bound to ineligible request");
            return (Bytes::new(), Outcome::Passthrough);
        }

        let response = match self.fetcher.fetch(&request.url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    request_id = %request.id,
                    url = %request.url,
                    error = %e,
                    "Upstream fetch failed"
                );
                return (Bytes::new(), Outcome::UpstreamFailure { status: e.status_code() });
            }
        };

        if !response.is_ok() {
            let e = Error::upstream_status(request.url.as_str(), response.status_code());
            tracing::info!(request_id = %request.id, error = %e, "Passing body through");
            return (response.body, Outcome::UpstreamFailure { status: e.status_code() });
        }

        if !ctx.is_open() {
            return (Bytes::new(), Outcome::Abandoned);
        }

        match self.transform(ctx, &response).await {
            Ok((body, warnings)) => (body, Outcome::Transformed { warnings }),
            Err(e) => {
                tracing::error!(
                    request_id = %request.id,
                    url = %request.url,
                    service = self.engine.service_name(),
                    error = %e,
                    "Transform failed, passing source through"
                );
                (response.body, Outcome::TransformFailure)
            }
        }
    }

    async fn transform(&self, ctx: &RequestContext, response: &Response) -> Result<(Bytes, usize)> {
        let transform_request = TransformRequest {
            source_text: response.text()?,
            source_name: ctx.source_name.clone(),
            loader: self.loader.clone(),
            sourcemap: self.embed_source_maps,
        };

        let result = self.engine.transform(transform_request).await?;

        for warning in &result.warnings {
            tracing::warn!(
                request_id = %ctx.request.id,
                source = %ctx.source_name,
                "{}",
                warning
            );
        }

        Ok((render_output(&result, self.embed_source_maps), result.warnings.len()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use reqwest::header::HeaderMap;
    use reqwest::StatusCode;
    use url::Url;

    use super::*;
    use crate::network::filter::{MemoryFilter, MemoryFilterHandle};
    use crate::network::request::{RequestId, ResourceType};
    use crate::transform::{
        PassthroughTransform, TransformResult, TransformService, TransformWarning,
    };

    struct StaticFetcher {
        status: StatusCode,
        body: &'static [u8],
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn new(status: StatusCode, body: &'static [u8]) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl UpstreamFetcher for StaticFetcher {
        async fn fetch(&self, url: &Url) -> Result<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Response::new(
                self.status,
                HeaderMap::new(),
                Bytes::from_static(self.body),
                url.clone(),
                1,
            ))
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl UpstreamFetcher for FailingFetcher {
        async fn fetch(&self, _url: &Url) -> Result<Response> {
            Err(Error::other("connection refused"))
        }
    }

    struct Rejecting;

    #[async_trait]
    impl TransformService for Rejecting {
        async fn transform(&self, request: TransformRequest) -> Result<TransformResult> {
            Err(Error::transform(request.source_name, "Expected ';'"))
        }
    }

    struct BrokenInit;

    #[async_trait]
    impl TransformService for BrokenInit {
        async fn initialize(&self) -> Result<()> {
            Err(Error::other("wasm module missing"))
        }

        async fn transform(&self, _request: TransformRequest) -> Result<TransformResult> {
            unreachable!("transform called without successful initialization")
        }
    }

    struct Mapped;

    #[async_trait]
    impl TransformService for Mapped {
        async fn transform(&self, request: TransformRequest) -> Result<TransformResult> {
            assert_eq!(request.source_name, "app.ts");
            assert_eq!(request.loader, "ts");
            Ok(TransformResult {
                code: "var x = 1;\n".to_string(),
                warnings: vec![TransformWarning::new("unused type")],
                map: Some(r#"{"version":3}"#.to_string()),
            })
        }
    }

    fn proxy(fetcher: Arc<dyn UpstreamFetcher>, service: Arc<dyn TransformService>) -> BodyTransformProxy {
        let config = InterceptConfig::default();
        BodyTransformProxy::new(
            &config,
            Arc::new(Classifier::new(&config)),
            fetcher,
            Arc::new(TransformEngine::new(service)),
        )
    }

    fn request(url: &str) -> InterceptedRequest {
        InterceptedRequest::parse(9, url, ResourceType::Script).unwrap()
    }

    fn filter() -> (Box<dyn ResponseFilter>, MemoryFilterHandle) {
        let (filter, handle) = MemoryFilter::new(RequestId(9));
        (Box::new(filter), handle)
    }

    #[tokio::test]
    async fn test_success_transforms() {
        let p = proxy(
            StaticFetcher::new(StatusCode::OK, b"const x = 1;"),
            Arc::new(PassthroughTransform::new()),
        );
        let (f, handle) = filter();

        let outcome = p.process(request("https://localhost/app.ts"), f).await;

        assert_eq!(outcome, Outcome::Transformed { warnings: 0 });
        assert_eq!(handle.body(), Bytes::from_static(b"const x = 1;\n"));
        assert_eq!(handle.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_source_map_and_warnings() {
        let p = proxy(StaticFetcher::new(StatusCode::OK, b"let x: number = 1;"), Arc::new(Mapped));
        let (f, handle) = filter();

        let outcome = p.process(request("https://localhost/app.ts"), f).await;

        assert_eq!(outcome, Outcome::Transformed { warnings: 1 });
        let body = String::from_utf8(handle.body().to_vec()).unwrap();
        assert!(body.starts_with("var x = 1;\n//# sourceMappingURL=data:application/json;base64,"));
        assert!(body.ends_with('\n'));
        assert_eq!(handle.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_non_200_passes_raw_bytes_and_stops() {
        let fetcher = StaticFetcher::new(StatusCode::NOT_FOUND, b"<h1>Not Found</h1>");
        let p = proxy(fetcher.clone(), Arc::new(Rejecting));
        let (f, handle) = filter();

        let outcome = p.process(request("https://localhost/app.ts"), f).await;

        // Rejecting would have produced TransformFailure had the pipeline continued
        assert_eq!(outcome, Outcome::UpstreamFailure { status: Some(404) });
        assert_eq!(handle.body(), Bytes::from_static(b"<h1>Not Found</h1>"));
        assert_eq!(handle.close_calls(), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_closes_empty() {
        let p = proxy(Arc::new(FailingFetcher), Arc::new(PassthroughTransform::new()));
        let (f, handle) = filter();

        let outcome = p.process(request("https://localhost/app.ts"), f).await;

        assert_eq!(outcome, Outcome::UpstreamFailure { status: None });
        assert!(handle.body().is_empty());
        assert_eq!(handle.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_transform_failure_falls_back() {
        let p = proxy(StaticFetcher::new(StatusCode::OK, b"let x: = ;"), Arc::new(Rejecting));
        let (f, handle) = filter();

        let outcome = p.process(request("https://localhost/app.ts"), f).await;

        assert_eq!(outcome, Outcome::TransformFailure);
        assert_eq!(handle.body(), Bytes::from_static(b"let x: = ;"));
        assert_eq!(handle.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_initialization_failure_falls_back() {
        let p = proxy(StaticFetcher::new(StatusCode::OK, b"const a = 1;"), Arc::new(BrokenInit));

        for _ in 0..2 {
            let (f, handle) = filter();
            let outcome = p.process(request("https://localhost/app.ts"), f).await;
            assert_eq!(outcome, Outcome::TransformFailure);
            assert_eq!(handle.body(), Bytes::from_static(b"const a = 1;"));
            assert_eq!(handle.close_calls(), 1);
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_falls_back() {
        let p = proxy(
            StaticFetcher::new(StatusCode::OK, &[0xc3, 0x28]),
            Arc::new(PassthroughTransform::new()),
        );
        let (f, handle) = filter();

        assert_eq!(p.process(request("https://localhost/app.ts"), f).await, Outcome::TransformFailure);
        assert_eq!(handle.body(), Bytes::from_static(&[0xc3, 0x28]));
    }

    #[tokio::test]
    async fn test_torn_down_filter_is_tolerated() {
        let p = proxy(
            StaticFetcher::new(StatusCode::OK, b"const x = 1;"),
            Arc::new(PassthroughTransform::new()),
        );
        let (f, handle) = filter();
        handle.tear_down();

        let outcome = p.process(request("https://localhost/app.ts"), f).await;

        assert_eq!(outcome, Outcome::Abandoned);
        assert_eq!(handle.writes(), 0);
        assert_eq!(handle.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_dropped_context_closes_filter() {
        let (f, handle) = filter();
        let ctx = RequestContext::new(request("https://localhost/app.ts"), f, "ts");
        assert_eq!(ctx.source_name(), "app.ts");
        drop(ctx);
        assert_eq!(handle.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_ineligible_request_is_not_fetched() {
        let fetcher = StaticFetcher::new(StatusCode::OK, b"body { }");
        let p = proxy(fetcher.clone(), Arc::new(PassthroughTransform::new()));
        let req = request("https://localhost/site.css");
        assert!(!p.wants_filter(&req));

        let (f, handle) = filter();
        assert_eq!(p.process(req, f).await, Outcome::Passthrough);
        assert!(handle.body().is_empty());
        assert_eq!(handle.close_calls(), 1);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unpolled_context_closes_filter() {
        let p = proxy(
            StaticFetcher::new(StatusCode::OK, b"const x = 1;"),
            Arc::new(PassthroughTransform::new()),
        );
        let (f, handle) = filter();

        let pending = p.process_context(p.context(request("https://localhost/app.ts"), f));
        drop(pending);

        assert_eq!(handle.close_calls(), 1);
        assert!(handle.body().is_empty());
    }
}
