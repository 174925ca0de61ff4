// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Intercepted request types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Host-assigned handle, unique per network request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req_{}", self.0)
    }
}

/// Declared resource type of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// Script tag or module import
    Script,
    /// Top-level document
    MainFrame,
    /// Iframe document
    SubFrame,
    /// Link stylesheet
    Stylesheet,
    /// Image
    Image,
    /// XMLHttpRequest / fetch
    XmlHttpRequest,
    /// Anything else
    Other,
}

impl ResourceType {
    /// Host-facing name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Script => "script",
            ResourceType::MainFrame => "main_frame",
            ResourceType::SubFrame => "sub_frame",
            ResourceType::Stylesheet => "stylesheet",
            ResourceType::Image => "image",
            ResourceType::XmlHttpRequest => "xmlhttprequest",
            ResourceType::Other => "other",
        }
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "script" => Ok(ResourceType::Script),
            "main_frame" | "document" => Ok(ResourceType::MainFrame),
            "sub_frame" | "iframe" => Ok(ResourceType::SubFrame),
            "stylesheet" => Ok(ResourceType::Stylesheet),
            "image" => Ok(ResourceType::Image),
            "xmlhttprequest" | "xhr" | "fetch" => Ok(ResourceType::XmlHttpRequest),
            "other" => Ok(ResourceType::Other),
            other => Err(Error::other(format!("unknown resource type: {}", other))),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase a handler is invoked at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Before any network activity; the body filter is bound here
    BeforeRequest,
    /// Response headers arrived, body not yet delivered
    HeadersReceived,
}

/// Request as seen by the phase handlers; read-only to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    pub id: RequestId,
    pub url: Url,
    pub resource_type: ResourceType,
    pub phase: Phase,
}

impl InterceptedRequest {
    /// Create a request at the before-request phase
    pub fn new(id: RequestId, url: Url, resource_type: ResourceType) -> Self {
        Self {
            id,
            url,
            resource_type,
            phase: Phase::BeforeRequest,
        }
    }

    /// Parse the URL and create a request
    pub fn parse(id: u64, url: &str, resource_type: ResourceType) -> Result<Self> {
        Ok(Self::new(RequestId(id), Url::parse(url)?, resource_type))
    }

    /// Same request at another phase
    pub fn at(&self, phase: Phase) -> Self {
        Self {
            phase,
            ..self.clone()
        }
    }

    /// Final path segment, if the path has a non-empty one
    pub fn file_name(&self) -> Option<&str> {
        file_name(&self.url)
    }
}

/// Final non-empty path segment of a URL
pub fn file_name(url: &Url) -> Option<&str> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
}
