// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request interception pipeline
//!
//! Two phase handlers share one classifier: the header rewriter runs when
//! response headers arrive, the body proxy when the request starts. Requests
//! for the alternate extension are redirected before either runs.

mod classifier;
mod filter;
mod headers;
mod interceptor;
mod proxy;
mod redirect;
mod request;

pub use classifier::{Classification, Classifier};
pub use filter::{
    channel, ChannelFilter, FilterEvent, FilterOutput, FilterStream, MemoryFilter,
    MemoryFilterHandle, ResponseFilter,
};
pub use headers::{HeaderRewriter, SCRIPT_CONTENT_TYPE};
pub use interceptor::{BeforeRequestAction, InterceptStats, Interceptor, ListenerFilter};
pub use proxy::{BodyTransformProxy, Outcome, RequestContext};
pub use redirect::resolve_redirect;
pub use request::{file_name, InterceptedRequest, Phase, RequestId, ResourceType};
