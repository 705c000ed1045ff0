//! Runs one extraction end to end: validate, launch, classify.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ExtractorConfig;
use crate::error::ExtractionError;
use crate::process::{LaunchError, ProcessLauncher, ProcessOutput};

use super::args::build_invocation;
use super::request::{ExtractionRequest, ExtractionResult};

/// Drives the external extraction tool for one request at a time.
///
/// Holds no per-request state, so a single instance is shared by all
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    launcher: Arc<dyn ProcessLauncher>,
    config: ExtractorConfig,
}

impl Orchestrator {
    pub fn new(launcher: Arc<dyn ProcessLauncher>, config: ExtractorConfig) -> Self {
        Self { launcher, config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Request for `url` using configured defaults where the caller gave nothing.
    pub fn request_for(
        &self,
        url: impl Into<String>,
        languages: Option<Vec<String>>,
    ) -> ExtractionRequest {
        let languages = languages
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| self.config.default_languages.clone());
        ExtractionRequest::new(url, languages, self.config.timeout())
    }

    /// Extract subtitles for `request`.
    ///
    /// Spawns at most one child. The child is killed when the timeout fires
    /// or when this future is dropped.
    pub async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResult, ExtractionError> {
        let span = tracing::info_span!("extract", request_id = %Uuid::new_v4(), url = %request.url);
        self.extract_inner(request).instrument(span).await
    }

    async fn extract_inner(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResult, ExtractionError> {
        let started = Instant::now();

        let validated = match request.validate(self.config.max_languages) {
            Ok(validated) => validated,
            Err(e) => {
                log_outcome(&Err(e.clone()), started.elapsed());
                return Err(e);
            }
        };

        let invocation = build_invocation(&self.config, &validated);
        tracing::debug!(program = %invocation.program, args = ?invocation.args, "launching extractor");

        let outcome = match tokio::time::timeout(validated.timeout, self.launcher.run(&invocation))
            .await
        {
            Err(_elapsed) => Err(ExtractionError::ProcessTimedOut {
                timeout_ms: validated.timeout.as_millis() as u64,
            }),
            Ok(Err(LaunchError::Spawn(e))) => Err(ExtractionError::ProcessSpawnFailed {
                program: invocation.program.clone(),
                reason: e.to_string(),
            }),
            Ok(Err(LaunchError::Io(e))) => Err(ExtractionError::ProcessIoFailed(e.to_string())),
            Ok(Err(e @ LaunchError::OutputTooLarge { .. })) => {
                Err(ExtractionError::ProcessIoFailed(e.to_string()))
            }
            Ok(Ok(output)) => classify(output, self.config.stderr_excerpt_bytes),
        };

        log_outcome(&outcome, started.elapsed());
        outcome
    }
}

/// Turn a finished child's output into a result.
pub fn classify(
    output: ProcessOutput,
    stderr_excerpt_bytes: usize,
) -> Result<ExtractionResult, ExtractionError> {
    if !output.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractionError::ProcessExitedNonZero {
            // Killed by a signal: no code.
            exit_code: output.exit_code.unwrap_or(-1),
            stderr: excerpt(&stderr, stderr_excerpt_bytes),
        });
    }

    let raw_text = String::from_utf8_lossy(&output.stdout).into_owned();
    if raw_text.trim().is_empty() {
        return Err(ExtractionError::NoSubtitleFound);
    }
    Ok(ExtractionResult { raw_text })
}

/// Trimmed prefix of `text`, at most `limit` bytes, cut on a char boundary.
fn excerpt(text: &str, limit: usize) -> String {
    let text = text.trim();
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

fn log_outcome(outcome: &Result<ExtractionResult, ExtractionError>, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match outcome {
        Ok(result) => {
            tracing::info!(elapsed_ms, bytes = result.raw_text.len(), "subtitle extracted")
        }
        Err(e) => {
            let kind = e.kind();
            match e {
                ExtractionError::ProcessSpawnFailed { .. } | ExtractionError::ProcessIoFailed(_) => {
                    tracing::error!(kind, elapsed_ms, "{}", e)
                }
                ExtractionError::ProcessExitedNonZero { exit_code, stderr } => {
                    tracing::warn!(kind, elapsed_ms, exit_code, "extractor failed");
                    tracing::debug!(stderr = %stderr, "extractor stderr");
                }
                ExtractionError::NoSubtitleFound => tracing::info!(kind, elapsed_ms, "{}", e),
                ExtractionError::InvalidInput(_) | ExtractionError::ProcessTimedOut { .. } => {
                    tracing::warn!(kind, elapsed_ms, "{}", e)
                }
            }
        }
    }
}
