// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Shared one-time initialization of the transform service

use std::sync::{Arc, OnceLock};

use futures::future::{BoxFuture, FutureExt, Shared};

use super::{TransformRequest, TransformResult, TransformService};
use crate::error::{Error, Result};

type InitFuture = Shared<BoxFuture<'static, std::result::Result<(), String>>>;

/// Transform service plus its initialization guard
///
/// The first caller of [`ready`](Self::ready) creates the initialization
/// future; every later or concurrent caller awaits a clone of that same
/// future. The outcome, success or failure, is kept for the engine's
/// lifetime and initialization is never started again.
pub struct TransformEngine {
    service: Arc<dyn TransformService>,
    init: OnceLock<InitFuture>,
}

impl TransformEngine {
    /// Wrap a transform service
    pub fn new(service: Arc<dyn TransformService>) -> Self {
        Self {
            service,
            init: OnceLock::new(),
        }
    }

    /// Wait until the service is initialized, starting it if nobody has yet
    pub async fn ready(&self) -> Result<()> {
        self.init_future().await.map_err(Error::initialization)
    }

    /// `None` while initialization is unstarted or pending
    pub fn is_ready(&self) -> Option<bool> {
        self.init
            .get()
            .and_then(|fut| fut.peek())
            .map(|state| state.is_ok())
    }

    /// Initialize if needed, then transform
    pub async fn transform(&self, request: TransformRequest) -> Result<TransformResult> {
        self.ready().await?;
        self.service.transform(request).await
    }

    /// Service name for log lines
    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    fn init_future(&self) -> InitFuture {
        self.init
            .get_or_init(|| {
                let service = self.service.clone();
                async move {
                    tracing::info!(service = service.name(), "Initializing transform service");
                    match service.initialize().await {
                        Ok(()) => {
                            tracing::info!(service = service.name(), "Transform service ready");
                            Ok(())
                        }
                        Err(e) => {
                            tracing::error!(
                                service = service.name(),
                                error = %e,
                                "Transform service failed to initialize"
                            );
                            Err(e.to_string())
                        }
                    }
                }
                .boxed()
                .shared()
            })
            .clone()
    }
}
