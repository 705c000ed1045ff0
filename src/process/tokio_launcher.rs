//! Direct argument-vector spawn on top of `tokio::process`

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::{Invocation, LaunchError, ProcessLauncher, ProcessOutput};

/// Stderr bytes kept in memory per child. The rest is read and discarded.
pub const STDERR_CAPTURE_LIMIT: usize = 64 * 1024;

/// Default ceiling on stdout per child. Going past it fails the run.
pub const STDOUT_CAPTURE_LIMIT: usize = 16 * 1024 * 1024;

/// Spawns the program directly, without a shell.
///
/// On unix the child leads its own process group, and the whole group is
/// killed once the child exits or the run is dropped. Helpers the tool
/// forked therefore never outlive the call.
#[derive(Debug, Clone)]
pub struct TokioProcessLauncher {
    stdout_limit: usize,
    stderr_limit: usize,
}

impl TokioProcessLauncher {
    pub fn new() -> Self {
        Self {
            stdout_limit: STDOUT_CAPTURE_LIMIT,
            stderr_limit: STDERR_CAPTURE_LIMIT,
        }
    }

    /// Fail runs that print more than `limit` bytes on stdout.
    pub fn with_stdout_limit(mut self, limit: usize) -> Self {
        self.stdout_limit = limit;
        self
    }
}

impl Default for TokioProcessLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessLauncher for TokioProcessLauncher {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, LaunchError> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(LaunchError::Spawn)?;
        // Dropped with this future on timeout or cancellation.
        let mut group = ProcessGroup::new(child.id());

        tracing::debug!(pid = child.id(), program = %invocation.program, "extractor spawned");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let wait = async {
            let status = child.wait().await.map_err(LaunchError::Io)?;
            // Forked helpers may still hold the pipes open.
            group.kill();
            Ok::<_, LaunchError>(status)
        };

        // Both pipes are drained while waiting, otherwise a full stderr
        // buffer blocks the child forever.
        let (status, stdout, stderr) = tokio::try_join!(
            wait,
            read_capped(stdout, self.stdout_limit),
            read_bounded(stderr, self.stderr_limit),
        )?;

        Ok(ProcessOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Process group led by the spawned child. Killed at most once.
#[derive(Debug)]
struct ProcessGroup {
    #[cfg(unix)]
    pgid: Option<libc::pid_t>,
}

impl ProcessGroup {
    #[cfg(unix)]
    fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|pid| libc::pid_t::try_from(pid).ok()),
        }
    }

    #[cfg(not(unix))]
    fn new(_pid: Option<u32>) -> Self {
        Self {}
    }

    #[cfg(unix)]
    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            // SAFETY: killpg has no memory effects; ESRCH for an empty group is fine.
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
        }
    }

    #[cfg(not(unix))]
    fn kill(&mut self) {}
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Read until EOF, failing once more than `limit` bytes arrived.
async fn read_capped<R: AsyncRead + Unpin>(
    reader: Option<R>,
    limit: usize,
) -> Result<Vec<u8>, LaunchError> {
    let mut buf = Vec::new();
    let Some(reader) = reader else {
        return Ok(buf);
    };

    // One byte past the limit is enough to tell.
    let mut reader = reader.take(limit as u64 + 1);
    reader.read_to_end(&mut buf).await.map_err(LaunchError::Io)?;
    if buf.len() > limit {
        return Err(LaunchError::OutputTooLarge { limit });
    }
    Ok(buf)
}

/// Read until EOF, keeping at most `limit` bytes.
async fn read_bounded<R: AsyncRead + Unpin>(
    reader: Option<R>,
    limit: usize,
) -> Result<Vec<u8>, LaunchError> {
    let mut kept = Vec::new();
    let Some(mut reader) = reader else {
        return Ok(kept);
    };

    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await.map_err(LaunchError::Io)?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
    Ok(kept)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::process::mock::{wait_for_exit, wait_for_pid_file};
    use std::time::Duration;

    fn sh(script: &str) -> Invocation {
        Invocation {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        }
    }

    #[tokio::test]
    async fn test_collects_stdout_and_exit_code() {
        let output = TokioProcessLauncher::new()
            .run(&sh("printf hello; printf oops >&2; exit 3"))
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, b"hello");
        assert_eq!(output.stderr, b"oops");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let invocation = Invocation {
            program: "/nonexistent/yt-dlp".to_string(),
            args: vec![],
        };
        let result = TokioProcessLauncher::new().run(&invocation).await;
        assert!(matches!(result, Err(LaunchError::Spawn(_))));
    }

    #[tokio::test]
    async fn test_large_stderr_does_not_block() {
        // ~200 KiB on stderr, well past a pipe buffer.
        let script = "i=0; while [ $i -lt 2000 ]; do \
                      printf '%0100d\\n' 0 >&2; i=$((i+1)); done; echo done";
        let output = tokio::time::timeout(
            Duration::from_secs(20),
            TokioProcessLauncher {
                stderr_limit: 1024,
                ..TokioProcessLauncher::new()
            }
            .run(&sh(script)),
        )
        .await
        .expect("child blocked on a full stderr pipe")
        .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, b"done\n");
        assert_eq!(output.stderr.len(), 1024);
    }

    #[tokio::test]
    async fn test_arguments_are_not_shell_parsed() {
        let invocation = Invocation {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"for a in "$@"; do printf '[%s]\n' "$a"; done"#.to_string(),
                "sh".to_string(),
                "a b".to_string(),
                "$(echo pwned)".to_string(),
            ],
        };
        let output = TokioProcessLauncher::new().run(&invocation).await.unwrap();

        assert_eq!(
            String::from_utf8(output.stdout).unwrap(),
            "[a b]\n[$(echo pwned)]\n"
        );
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_dropping_run_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());

        let launcher = TokioProcessLauncher::new();
        let invocation = sh(&script);
        let mut run = Box::pin(launcher.run(&invocation));

        let pid = tokio::select! {
            _ = &mut run => panic!("sleep finished early"),
            pid = wait_for_pid_file(&pid_file) => pid,
        };
        drop(run);

        assert!(wait_for_exit(pid, Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_stdout_over_limit_fails() {
        let result = TokioProcessLauncher::new()
            .with_stdout_limit(16)
            .run(&sh("printf '%0100d' 0"))
            .await;
        assert!(matches!(
            result,
            Err(LaunchError::OutputTooLarge { limit: 16 })
        ));

        let output = TokioProcessLauncher::new()
            .with_stdout_limit(16)
            .run(&sh("printf '%016d' 0"))
            .await
            .unwrap();
        assert_eq!(output.stdout.len(), 16);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_background_helper_does_not_hold_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        // The backgrounded sleep inherits stdout and would keep it open.
        let script = format!(
            "printf hello; sleep 30 & echo $! > '{}'; exit 0",
            pid_file.display()
        );

        let output = tokio::time::timeout(
            Duration::from_secs(10),
            TokioProcessLauncher::new().run(&sh(&script)),
        )
        .await
        .expect("run waited for the background helper")
        .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, b"hello");

        let helper = wait_for_pid_file(&pid_file).await;
        assert!(wait_for_exit(helper, Duration::from_secs(5)).await);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_dropping_run_kills_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("sleep 30 & echo $! > '{}'; wait", pid_file.display());

        let launcher = TokioProcessLauncher::new();
        let invocation = sh(&script);
        let mut run = Box::pin(launcher.run(&invocation));

        let helper = tokio::select! {
            _ = &mut run => panic!("sleep finished early"),
            pid = wait_for_pid_file(&pid_file) => pid,
        };
        drop(run);

        assert!(wait_for_exit(helper, Duration::from_secs(5)).await);
    }
}
