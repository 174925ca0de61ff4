// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP layer for the out-of-band upstream fetch
//!
//! The body proxy never reads the intercepted response stream itself; it
//! re-issues the request through an [`UpstreamFetcher`] and works from that
//! copy.

mod client;
mod response;

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

pub use client::{HttpClient, HttpClientConfig};
pub use response::Response;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("scriptshim/", env!("CARGO_PKG_VERSION"));

/// Source of the secondary copy of an intercepted response
///
/// Non-success statuses are returned as `Ok`; only transport failures are
/// errors.
#[async_trait]
pub trait UpstreamFetcher: Send + Sync {
    /// Fetch the exact URL of an intercepted request
    async fn fetch(&self, url: &Url) -> Result<Response>;
}
