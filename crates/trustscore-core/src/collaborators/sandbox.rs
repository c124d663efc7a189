//! Subprocess sandbox for running model-card demo code.
//!
//! Each run gets a fresh temporary working directory that is removed when
//! the run finishes. The interpreter is killed if it outlives the timeout.

use super::{ExecutionOutcome, Sandbox};
use crate::error::{Result, TrustScoreError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

const DEMO_FILENAME: &str = "demo.py";

/// Runs Python snippets in a throwaway directory.
#[derive(Debug, Clone)]
pub struct PythonSandbox {
    interpreter: String,
}

impl PythonSandbox {
    pub fn new() -> Self {
        Self::with_interpreter("python3")
    }

    pub fn with_interpreter(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for PythonSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sandbox for PythonSandbox {
    async fn run_isolated(&self, code: &str, timeout: Duration) -> Result<ExecutionOutcome> {
        let workdir = TempDir::new()?;
        let script = workdir.path().join(DEMO_FILENAME);
        tokio::fs::write(&script, code)
            .await
            .map_err(|e| TrustScoreError::io_with_path(e, &script))?;

        let mut child = Command::new(&self.interpreter)
            .arg(&script)
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TrustScoreError::Execution {
                message: format!("Failed to spawn {}: {e}", self.interpreter),
            })?;

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                debug!("Demo code exited with {:?}", status.code());
                Ok(ExecutionOutcome {
                    exit_code: status.code(),
                    timed_out: false,
                })
            }
            Ok(Err(e)) => Err(TrustScoreError::Execution {
                message: format!("{} process error: {e}", self.interpreter),
            }),
            Err(_) => {
                warn!("Demo code exceeded {:?}, killing interpreter", timeout);
                child.kill().await.ok();
                Ok(ExecutionOutcome {
                    exit_code: None,
                    timed_out: true,
                })
            }
        }
    }
}
