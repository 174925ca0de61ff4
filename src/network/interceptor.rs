// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Phase dispatcher wiring the classifier, header rewriter and body proxy
//! to the host's two lifecycle events

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use reqwest::header::HeaderMap;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::{AbortHandle, JoinHandle};
use url::Url;

use super::classifier::{Classification, Classifier};
use super::filter::{channel, FilterStream, ResponseFilter};
use super::headers::HeaderRewriter;
use super::proxy::{BodyTransformProxy, Outcome};
use super::request::{InterceptedRequest, RequestId, ResourceType};
use crate::config::{InterceptConfig, OriginPattern};
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig, UpstreamFetcher};
use crate::transform::{TransformEngine, TransformService};

/// What the host should do with a request at the before-request phase
pub enum BeforeRequestAction {
    /// Proceed untouched
    Continue,
    /// Redirect before any network activity
    Redirect(Url),
    /// Serve the body from this stream instead of the network
    Filter(FilterStream),
}

impl BeforeRequestAction {
    pub fn is_continue(&self) -> bool {
        matches!(self, BeforeRequestAction::Continue)
    }
}

/// URL/type filter the host registers both listeners with
#[derive(Debug, Clone)]
pub struct ListenerFilter {
    pub origins: Vec<OriginPattern>,
    pub types: Vec<ResourceType>,
}

impl ListenerFilter {
    /// Check whether the host would invoke the listeners for this request
    pub fn matches(&self, request: &InterceptedRequest) -> bool {
        self.types.contains(&request.resource_type)
            && self.origins.iter().any(|o| o.matches(&request.url))
    }

    /// Match patterns in host registration form (`https://localhost/*`)
    pub fn url_patterns(&self) -> Vec<String> {
        self.origins.iter().map(|o| o.to_string()).collect()
    }
}

/// Running counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct InterceptStats {
    pub requests_seen: u64,
    pub ignored: u64,
    pub redirected: u64,
    pub headers_rewritten: u64,
    pub transformed: u64,
    pub upstream_failures: u64,
    pub transform_failures: u64,
    pub passthrough: u64,
    pub abandoned: u64,
    pub aborted: u64,
}

impl InterceptStats {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Transformed { .. } => self.transformed += 1,
            Outcome::UpstreamFailure { .. } => self.upstream_failures += 1,
            Outcome::TransformFailure => self.transform_failures += 1,
            Outcome::Passthrough => self.passthrough += 1,
            Outcome::Abandoned => self.abandoned += 1,
        }
    }
}

/// Entry point for a host's interception events
pub struct Interceptor {
    config: InterceptConfig,
    classifier: Arc<Classifier>,
    headers: HeaderRewriter,
    proxy: Arc<BodyTransformProxy>,
    engine: Arc<TransformEngine>,
    listener: ListenerFilter,
    /// Abort handles of eligible requests still being processed
    in_flight: Arc<DashMap<RequestId, AbortHandle>>,
    next_id: AtomicU64,
    stats: Arc<RwLock<InterceptStats>>,
}

impl Interceptor {
    /// Create an interceptor fetching upstream over HTTP
    pub fn new(config: InterceptConfig, service: Arc<dyn TransformService>) -> Result<Self> {
        let client = HttpClient::with_config(HttpClientConfig::from(&config))?;
        Self::with_fetcher(config, Arc::new(client), service)
    }

    /// Create an interceptor with a custom upstream fetcher
    pub fn with_fetcher(
        config: InterceptConfig,
        fetcher: Arc<dyn UpstreamFetcher>,
        service: Arc<dyn TransformService>,
    ) -> Result<Self> {
        config.validate()?;

        let classifier = Arc::new(Classifier::new(&config));
        let engine = Arc::new(TransformEngine::new(service));
        let proxy = Arc::new(BodyTransformProxy::new(
            &config,
            classifier.clone(),
            fetcher,
            engine.clone(),
        ));
        let listener = ListenerFilter {
            origins: config.origins.clone(),
            types: vec![ResourceType::Script],
        };

        Ok(Self {
            headers: HeaderRewriter::new(classifier.clone()),
            classifier,
            proxy,
            engine,
            listener,
            in_flight: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
            stats: Arc::new(RwLock::new(InterceptStats::default())),
            config,
        })
    }

    /// Allocate a request id
    pub fn next_request_id(&self) -> RequestId {
        RequestId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Build a request with a fresh id
    pub fn request(&self, url: &str, resource_type: ResourceType) -> Result<InterceptedRequest> {
        Ok(InterceptedRequest::new(
            self.next_request_id(),
            Url::parse(url)?,
            resource_type,
        ))
    }

    /// Filter to register the host listeners with
    pub fn listener_filter(&self) -> &ListenerFilter {
        &self.listener
    }

    /// Classify a request
    pub fn classify(&self, request: &InterceptedRequest) -> Classification {
        self.classifier.classify_request(request)
    }

    /// Start transform service initialization ahead of the first request
    pub async fn warm_up(&self) -> Result<()> {
        self.engine.ready().await
    }

    /// Before-request phase
    ///
    /// Must be called from within a Tokio runtime: eligible requests are
    /// processed on a spawned task whose output arrives on the returned stream.
    pub fn on_before_request(&self, request: InterceptedRequest) -> BeforeRequestAction {
        self.stats.write().requests_seen += 1;

        if !self.listener.matches(&request) {
            self.stats.write().ignored += 1;
            return BeforeRequestAction::Continue;
        }

        match self.classifier.classify_request(&request) {
            Classification::Redirect(target) => {
                tracing::info!(
                    request_id = %request.id,
                    from = %request.url,
                    to = %target,
                    "Redirecting to source file"
                );
                self.stats.write().redirected += 1;
                BeforeRequestAction::Redirect(target)
            }
            Classification::Eligible => {
                let (filter, stream) = channel(request.id);
                self.spawn(request, Box::new(filter));
                BeforeRequestAction::Filter(stream)
            }
            Classification::Ignore => {
                self.stats.write().ignored += 1;
                BeforeRequestAction::Continue
            }
        }
    }

    /// Before-request phase for hosts that supply their own filter
    ///
    /// Hands the filter back untouched when the request is not eligible or
    /// the filter belongs to a different request.
    pub fn attach_filter(
        &self,
        request: InterceptedRequest,
        filter: Box<dyn ResponseFilter>,
    ) -> std::result::Result<JoinHandle<Outcome>, Box<dyn ResponseFilter>> {
        if filter.request_id() != request.id {
            tracing::warn!(
                request_id = %request.id,
                filter_id = %filter.request_id(),
                "Filter belongs to another request"
            );
            return Err(filter);
        }
        if !self.listener.matches(&request) || !self.proxy.wants_filter(&request) {
            return Err(filter);
        }
        Ok(self.spawn(request, filter))
    }

    /// Headers-received phase
    pub fn on_headers_received(
        &self,
        request: &InterceptedRequest,
        headers: &HeaderMap,
    ) -> Option<HeaderMap> {
        if !self.listener.matches(request) {
            return None;
        }

        let rewritten = self.headers.on_headers_received(request, headers);
        if rewritten.is_some() {
            self.stats.write().headers_rewritten += 1;
        }
        rewritten
    }

    /// Host aborted a request; drop its in-flight fetch/transform
    pub fn abort(&self, id: RequestId) -> bool {
        match self.in_flight.remove(&id) {
            Some((_, handle)) => {
                handle.abort();
                self.stats.write().aborted += 1;
                tracing::debug!(request_id = %id, "Aborted in-flight request");
                true
            }
            None => false,
        }
    }

    /// Number of eligible requests still being processed
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> InterceptStats {
        self.stats.read().clone()
    }

    /// Active configuration
    pub fn config(&self) -> &InterceptConfig {
        &self.config
    }

    fn spawn(&self, request: InterceptedRequest, filter: Box<dyn ResponseFilter>) -> JoinHandle<Outcome> {
        let id = request.id;
        let proxy = self.proxy.clone();
        let stats = self.stats.clone();
        let in_flight = self.in_flight.clone();
        // Bound before spawning so an abort ahead of the first poll still closes the filter
        let ctx = self.proxy.context(request, filter);
        let (registered_tx, registered_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let outcome = proxy.process_context(ctx).await;
            // Deregister only after the spawner has registered
            let _ = registered_rx.await;
            in_flight.remove(&id);
            stats.write().record(&outcome);
            outcome
        });

        self.in_flight.insert(id, handle.abort_handle());
        let _ = registered_tx.send(());

        handle
    }
}
