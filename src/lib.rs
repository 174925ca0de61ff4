// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # scriptshim - Serve TypeScript as Script, No Build Step
//!
//! Intercepts script requests to loopback origins, rewrites their content
//! type and replaces their body with the output of a transform service, so a
//! page can load superset-language sources (`.ts`) directly.
//!
//! ## Features
//!
//! - Request classification: eligible / redirect / ignore, shared by both phases
//! - Header rewriting: `Content-Type: application/javascript` on eligible responses
//! - Body transform proxy: out-of-band fetch, transform, inline source maps
//! - Fallback: upstream or transform failures pass the original bytes through
//! - Extension redirect: `foo.js` resolves to `foo.ts`
//! - One-time shared transform service initialization
//! - Cancellation of in-flight requests
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use scriptshim::{BeforeRequestAction, InterceptConfig, Interceptor, PassthroughTransform};
//! use scriptshim::network::ResourceType;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let interceptor = Interceptor::new(
//!         InterceptConfig::default(),
//!         Arc::new(PassthroughTransform::new()),
//!     )?;
//!
//!     let request = interceptor.request("https://localhost/app.ts", ResourceType::Script)?;
//!     if let BeforeRequestAction::Filter(stream) = interceptor.on_before_request(request) {
//!         let output = stream.collect().await;
//!         println!("{}", String::from_utf8_lossy(&output.body));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod transform;

// Re-exports for convenience

// Configuration
pub use config::{InterceptConfig, OriginPattern};

// Errors
pub use error::{Error, ErrorContext, Result};

// HTTP
pub use http::{HttpClient, HttpClientConfig, Response, UpstreamFetcher};

// Network
pub use network::{BeforeRequestAction, Classification, Classifier, Interceptor, Outcome};
pub use network::{HeaderRewriter, BodyTransformProxy, ResponseFilter, FilterStream};

// Transform
pub use transform::{CommandTransform, PassthroughTransform, TransformEngine, TransformService};
pub use transform::{TransformRequest, TransformResult, TransformWarning};

/// scriptshim version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
