//! Test doubles for process launching.
//!
//! - `ScriptedLauncher::exit(..)` replays a fixed exit code and output
//! - `ScriptedLauncher::spawn_error()` fails like a missing binary
//! - `ScriptedLauncher::hang()` never finishes, for timeout and cancellation
//!
//! Every invocation is recorded so tests can inspect the argument vector.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Invocation, LaunchError, ProcessLauncher, ProcessOutput};

#[derive(Debug, Clone)]
pub enum Script {
    Exit(ProcessOutput),
    SpawnError,
    Hang,
}

#[derive(Debug)]
pub struct ScriptedLauncher {
    script: Script,
    invocations: Mutex<Vec<Invocation>>,
    runs: AtomicUsize,
    /// Set once a `Hang` run has been dropped.
    released: Arc<AtomicBool>,
}

impl ScriptedLauncher {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            invocations: Mutex::new(Vec::new()),
            runs: AtomicUsize::new(0),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn exit(code: i32, stdout: &str, stderr: &str) -> Self {
        Self::new(Script::Exit(ProcessOutput {
            exit_code: Some(code),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }))
    }

    pub fn spawn_error() -> Self {
        Self::new(Script::SpawnError)
    }

    pub fn hang() -> Self {
        Self::new(Script::Hang)
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn last_invocation(&self) -> Option<Invocation> {
        self.invocations.lock().unwrap().last().cloned()
    }

    /// True once a hanging run was dropped by its caller.
    pub fn was_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Flips a flag when dropped
struct ReleaseGuard(Arc<AtomicBool>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProcessLauncher for ScriptedLauncher {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, LaunchError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.invocations.lock().unwrap().push(invocation.clone());

        match &self.script {
            Script::Exit(output) => Ok(output.clone()),
            Script::SpawnError => Err(LaunchError::Spawn(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No such file or directory",
            ))),
            Script::Hang => {
                let _guard = ReleaseGuard(Arc::clone(&self.released));
                std::future::pending().await
            }
        }
    }
}

/// Whether `pid` names a live, non-zombie process.
#[cfg(target_os = "linux")]
pub fn pid_is_running(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
        // The state letter follows the parenthesised command name.
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .map(|rest| !rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
        Err(_) => false,
    }
}

/// Poll until `pid` is gone or a zombie. Returns false if it is still
/// running after `grace`.
#[cfg(target_os = "linux")]
pub async fn wait_for_exit(pid: u32, grace: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + grace;
    while tokio::time::Instant::now() < deadline {
        if !pid_is_running(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    !pid_is_running(pid)
}

/// Poll until a child script has written its pid to `path`.
pub async fn wait_for_pid_file(path: &Path) -> u32 {
    loop {
        if let Ok(content) = tokio::fs::read_to_string(path).await {
            if let Ok(pid) = content.trim().parse() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
