// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transform service boundary
//!
//! The compiler that turns superset-language source into plain script is an
//! external collaborator. This module defines the contract it must satisfy,
//! the one-time initialization guard shared by every request, and the
//! encoding of a result into response bytes.

mod command;
mod engine;
mod output;
mod passthrough;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use command::CommandTransform;
pub use engine::TransformEngine;
pub use output::{render_output, SOURCE_MAP_PREFIX};
pub use passthrough::PassthroughTransform;

/// Input to a single transform call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Raw source text as served upstream
    pub source_text: String,
    /// Name reported in diagnostics and source maps (final URL path segment)
    pub source_name: String,
    /// Language tag, e.g. `ts`
    pub loader: String,
    /// Whether a source map should be produced
    pub sourcemap: bool,
}

/// Output of a single transform call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformResult {
    /// Target-language text
    pub code: String,
    /// Non-fatal diagnostics
    #[serde(default)]
    pub warnings: Vec<TransformWarning>,
    /// Source map JSON document
    #[serde(default)]
    pub map: Option<String>,
}

impl TransformResult {
    /// Result with code only
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            warnings: Vec::new(),
            map: None,
        }
    }
}

/// Non-fatal diagnostic from a successful transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformWarning {
    /// Diagnostic message
    pub text: String,
    /// 1-based line, if known
    #[serde(default)]
    pub line: Option<u32>,
    /// 0-based column, if known
    #[serde(default)]
    pub column: Option<u32>,
}

impl TransformWarning {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            line: None,
            column: None,
        }
    }
}

impl fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(f, "{}:{}: {}", line, col, self.text),
            (Some(line), None) => write!(f, "{}: {}", line, self.text),
            _ => f.write_str(&self.text),
        }
    }
}

/// Compiler collaborator
///
/// `initialize` is called at most once per [`TransformEngine`]; `transform`
/// only after it succeeded. Both may fail, which the body proxy turns into a
/// passthrough of the original bytes.
#[async_trait]
pub trait TransformService: Send + Sync {
    /// One-time startup (load a compiler, check a binary exists, ...)
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Transform one source file
    async fn transform(&self, request: TransformRequest) -> Result<TransformResult>;

    /// Name used in log lines
    fn name(&self) -> &str {
        "transform"
    }
}
