// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Response filters: writable, closable sinks for replacement body bytes
//!
//! `close` consumes the filter, so a filter can never be closed twice. The
//! body proxy is responsible for the other half: closing it at least once.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::request::RequestId;
use crate::error::{Error, Result};

/// Sink bound 1:1 to an intercepted request's response body
///
/// Once the host tears the request down, `write` and `close` return errors;
/// callers are expected to tolerate that. Filters are shared by reference
/// across await points of the pipeline task, hence `Sync`.
pub trait ResponseFilter: Send + Sync {
    /// Request this filter belongs to
    fn request_id(&self) -> RequestId;

    /// Append bytes to the replacement body
    fn write(&mut self, data: Bytes) -> Result<()>;

    /// Finish the body; the host delivers the response after this
    fn close(self: Box<Self>) -> Result<()>;

    /// False once the host has torn the request down
    fn is_open(&self) -> bool {
        true
    }
}

/// Event delivered to the host side of a [`ChannelFilter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    Data(Bytes),
    Close,
}

/// Filter that forwards writes over a channel to a [`FilterStream`]
pub struct ChannelFilter {
    id: RequestId,
    tx: mpsc::UnboundedSender<FilterEvent>,
}

/// Host side of a [`ChannelFilter`]
pub struct FilterStream {
    rx: mpsc::UnboundedReceiver<FilterEvent>,
}

/// Everything a filter produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutput {
    pub body: Bytes,
    /// Whether `close` was called, as opposed to the filter being dropped
    pub closed: bool,
}

/// Create a connected filter/stream pair
pub fn channel(id: RequestId) -> (ChannelFilter, FilterStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelFilter { id, tx }, FilterStream { rx })
}

impl ResponseFilter for ChannelFilter {
    fn request_id(&self) -> RequestId {
        self.id
    }

    fn write(&mut self, data: Bytes) -> Result<()> {
        self.tx
            .send(FilterEvent::Data(data))
            .map_err(|_| Error::filter(self.id.0, "request torn down"))
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.tx
            .send(FilterEvent::Close)
            .map_err(|_| Error::filter(self.id.0, "request torn down"))
    }

    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl FilterStream {
    /// Read until the filter is closed or dropped
    pub async fn collect(mut self) -> FilterOutput {
        let mut body = BytesMut::new();
        let mut closed = false;

        while let Some(event) = self.rx.recv().await {
            match event {
                FilterEvent::Data(data) => body.extend_from_slice(&data),
                FilterEvent::Close => {
                    closed = true;
                    break;
                }
            }
        }

        FilterOutput {
            body: body.freeze(),
            closed,
        }
    }

    /// Tear the request down; further writes on the filter fail
    pub fn tear_down(self) {
        drop(self);
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    body: Vec<u8>,
    writes: usize,
    close_calls: usize,
    torn_down: bool,
}

/// Filter buffering into shared memory, inspectable through a [`MemoryFilterHandle`]
pub struct MemoryFilter {
    id: RequestId,
    state: Arc<Mutex<MemoryState>>,
}

/// Inspection side of a [`MemoryFilter`]
#[derive(Clone)]
pub struct MemoryFilterHandle {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFilter {
    pub fn new(id: RequestId) -> (Self, MemoryFilterHandle) {
        let state = Arc::new(Mutex::new(MemoryState::default()));
        (
            Self {
                id,
                state: state.clone(),
            },
            MemoryFilterHandle { state },
        )
    }
}

impl ResponseFilter for MemoryFilter {
    fn request_id(&self) -> RequestId {
        self.id
    }

    fn write(&mut self, data: Bytes) -> Result<()> {
        let mut state = self.state.lock();
        if state.torn_down {
            return Err(Error::filter(self.id.0, "request torn down"));
        }
        state.writes += 1;
        state.body.extend_from_slice(&data);
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        let mut state = self.state.lock();
        state.close_calls += 1;
        if state.torn_down {
            return Err(Error::filter(self.id.0, "request torn down"));
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.state.lock().torn_down
    }
}

impl MemoryFilterHandle {
    /// Bytes written so far
    pub fn body(&self) -> Bytes {
        Bytes::copy_from_slice(&self.state.lock().body)
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.state.lock().writes
    }

    /// Number of times `close` was called
    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }

    /// Simulate the host aborting the request
    pub fn tear_down(&self) {
        self.state.lock().torn_down = true;
    }
}
