//! The external extraction engine.
//!
//! Production runs shell out to the `kwgn` executable:
//!
//! ```text
//! kwgn extract -f <path> [--config <cfg>] --statement-type <TYPE>
//! ```
//!
//! and read one JSON document from stdout. Arguments are passed as a vector,
//! never through a shell.

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

use kwgn_core::{ExtractResult, ExtractionStrategy};

use crate::error::EngineFault;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Anything that can turn a file on disk into a statement payload.
pub trait ExtractionEngine {
    fn extract(
        &self,
        path: &Path,
        strategy: ExtractionStrategy,
    ) -> impl Future<Output = Result<ExtractResult, EngineFault>> + Send;
}

/// Subprocess engine backed by the `kwgn` CLI
#[derive(Debug, Clone)]
pub struct KwgnCli {
    command: PathBuf,
    config_path: Option<PathBuf>,
    timeout: Duration,
}

impl KwgnCli {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            config_path: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_config(mut self, config_path: Option<PathBuf>) -> Self {
        self.config_path = config_path;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn args(&self, path: &Path, strategy: ExtractionStrategy) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["extract".into(), "-f".into(), path.into()];
        if let Some(cfg) = &self.config_path {
            args.push("--config".into());
            args.push(cfg.into());
        }
        args.push("--statement-type".into());
        args.push(strategy.key().into());
        args
    }
}

impl Default for KwgnCli {
    fn default() -> Self {
        Self::new("kwgn")
    }
}

impl ExtractionEngine for KwgnCli {
    async fn extract(
        &self,
        path: &Path,
        strategy: ExtractionStrategy,
    ) -> Result<ExtractResult, EngineFault> {
        let command = self.command.display().to_string();
        let args = self.args(path, strategy);
        debug!(%command, ?args, "invoking engine");

        let mut cmd = tokio::process::Command::new(&self.command);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(res) => res.map_err(|source| EngineFault::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => return Err(EngineFault::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(EngineFault::Exit {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}
