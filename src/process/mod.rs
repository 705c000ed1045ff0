//! External process launching
//!
//! This module isolates everything that touches a child process:
//! - `Invocation`: program plus a vector of discrete argument tokens
//! - `ProcessLauncher`: the capability used by the orchestrator
//! - `TokioProcessLauncher`: direct spawn via `tokio::process`
//!
//! Implementations must be cancellation safe: dropping the future returned by
//! [`ProcessLauncher::run`] has to terminate the child it started, along with
//! anything that child forked.

pub mod tokio_launcher;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub use tokio_launcher::TokioProcessLauncher;

/// A program and its argument vector. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Everything a finished child produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the child was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launch failures, before any exit status is known
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("spawn failed: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("i/o with child failed: {0}")]
    Io(#[source] std::io::Error),

    #[error("stdout exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },
}

/// Capability to run an external program to completion
#[async_trait]
pub trait ProcessLauncher: Send + Sync + Debug {
    /// Run `invocation` and collect its output.
    ///
    /// Dropping the returned future before it resolves must kill the child.
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, LaunchError>;
}
