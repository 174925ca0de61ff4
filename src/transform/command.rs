// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transform service backed by an external compiler process
//!
//! Protocol: the request is written to the child's stdin as a JSON
//! [`TransformRequest`]; the child prints a JSON [`TransformResult`] on stdout
//! and exits 0. Any other exit status is a transform failure whose message is
//! the child's stderr.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{TransformRequest, TransformResult, TransformService};
use crate::error::{Error, Result};

/// External compiler invoked once per transform
#[derive(Debug, Clone)]
pub struct CommandTransform {
    program: PathBuf,
    args: Vec<String>,
    probe_args: Vec<String>,
    timeout: Duration,
}

impl CommandTransform {
    /// Run `program` with no extra arguments; probed with `--version`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            probe_args: vec!["--version".to_string()],
            timeout: Duration::from_secs(30),
        }
    }

    /// Arguments passed on every transform
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Arguments used by `initialize` to check the program runs
    pub fn probe_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.probe_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Per-transform timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    async fn run(&self, input: Vec<u8>, source_name: &str) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::transform(source_name, format!("failed to spawn {}: {}", self.program_name(), e))
            })?;

        // Feed stdin from its own task so a chatty child cannot deadlock on a full stdout pipe
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                let result = stdin.write_all(&input).await;
                drop(stdin);
                result
            })
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                Error::transform(
                    source_name,
                    format!("{} timed out after {:?}", self.program_name(), self.timeout),
                )
            })??;

        if let Some(writer) = writer {
            if let Ok(Err(e)) = writer.await {
                tracing::debug!(error = %e, "Compiler closed stdin early");
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::transform(
                source_name,
                format!("{} exited with {}: {}", self.program_name(), output.status, stderr.trim()),
            ));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl TransformService for CommandTransform {
    async fn initialize(&self) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.probe_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| Error::initialization(format!("{}: {}", self.program_name(), e)))?;

        if !status.success() {
            return Err(Error::initialization(format!(
                "{} probe exited with {}",
                self.program_name(),
                status
            )));
        }
        Ok(())
    }

    async fn transform(&self, request: TransformRequest) -> Result<TransformResult> {
        let input = serde_json::to_vec(&request)?;
        let stdout = self.run(input, &request.source_name).await?;

        serde_json::from_slice(&stdout).map_err(|e| {
            Error::transform(&request.source_name, format!("malformed compiler output: {}", e))
        })
    }

    fn name(&self) -> &str {
        "command"
    }
}
