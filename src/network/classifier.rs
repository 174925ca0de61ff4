// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request classification
//!
//! Pure predicate shared by both phase handlers. The header rewriter and the
//! body proxy must reach the same verdict for a request, so neither keeps its
//! own copy of the matching rules.

use url::Url;

use super::redirect::{file_stem, resolve_redirect};
use super::request::{file_name, InterceptedRequest, ResourceType};
use crate::config::{InterceptConfig, OriginPattern};

/// Verdict for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Rewrite headers and body
    Eligible,
    /// Redirect to the same-named source file
    Redirect(Url),
    /// Leave completely untouched
    Ignore,
}

impl Classification {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Classification::Eligible)
    }

    pub fn is_ignore(&self) -> bool {
        matches!(self, Classification::Ignore)
    }

    /// Redirect target, if any
    pub fn redirect_target(&self) -> Option<&Url> {
        match self {
            Classification::Redirect(url) => Some(url),
            _ => None,
        }
    }
}

/// Request classifier
#[derive(Debug, Clone)]
pub struct Classifier {
    origins: Vec<OriginPattern>,
    source_suffix: String,
    alternate_suffix: String,
}

impl Classifier {
    /// Create a classifier from config
    pub fn new(config: &InterceptConfig) -> Self {
        Self {
            origins: config.origins.clone(),
            source_suffix: config.source_suffix.clone(),
            alternate_suffix: config.alternate_suffix.clone(),
        }
    }

    /// Classify a URL and resource type
    pub fn classify(&self, url: &Url, resource_type: ResourceType) -> Classification {
        if resource_type != ResourceType::Script || !self.origin_allowed(url) {
            return Classification::Ignore;
        }

        let Some(name) = file_name(url) else {
            return Classification::Ignore;
        };
        let Some(ext) = extension(name) else {
            return Classification::Ignore;
        };

        if ext == self.source_suffix {
            Classification::Eligible
        } else if ext == self.alternate_suffix {
            resolve_redirect(url, &self.source_suffix)
                .map(Classification::Redirect)
                .unwrap_or(Classification::Ignore)
        } else {
            Classification::Ignore
        }
    }

    /// Classify an intercepted request
    pub fn classify_request(&self, request: &InterceptedRequest) -> Classification {
        self.classify(&request.url, request.resource_type)
    }

    /// Check the URL's scheme and host against the allowlist
    pub fn origin_allowed(&self, url: &Url) -> bool {
        self.origins.iter().any(|origin| origin.matches(url))
    }

    /// Configured origin allowlist
    pub fn origins(&self) -> &[OriginPattern] {
        &self.origins
    }

    /// Suffix of transformable sources
    pub fn source_suffix(&self) -> &str {
        &self.source_suffix
    }
}

/// Extension of a file name; `None` when there is no stem or no extension
fn extension(name: &str) -> Option<&str> {
    file_stem(name)?;
    name.rsplit_once('.').map(|(_, ext)| ext)
}
