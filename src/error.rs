use thiserror::Error;

/// Failure of a single extraction request.
///
/// The `Display` output is meant for logs. Anything sent back to a client
/// must go through [`ExtractionError::user_message`], which never includes
/// the tool's stderr.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to spawn `{program}`: {reason}")]
    ProcessSpawnFailed { program: String, reason: String },

    #[error("Extraction timed out after {timeout_ms} ms")]
    ProcessTimedOut { timeout_ms: u64 },

    #[error("Extractor exited with code {exit_code}: {stderr}")]
    ProcessExitedNonZero { exit_code: i32, stderr: String },

    #[error("No subtitle found")]
    NoSubtitleFound,

    #[error("Failed to collect extractor output: {0}")]
    ProcessIoFailed(String),
}

impl ExtractionError {
    /// Stable identifier used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::InvalidInput(_) => "invalid_input",
            ExtractionError::ProcessSpawnFailed { .. } => "process_spawn_failed",
            ExtractionError::ProcessTimedOut { .. } => "process_timed_out",
            ExtractionError::ProcessExitedNonZero { .. } => "process_exited_non_zero",
            ExtractionError::NoSubtitleFound => "no_subtitle_found",
            ExtractionError::ProcessIoFailed(_) => "process_io_failed",
        }
    }

    /// Whether the caller can fix the request and try again.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ExtractionError::InvalidInput(_))
    }

    /// Message that is safe to hand to an HTTP client.
    pub fn user_message(&self) -> String {
        match self {
            ExtractionError::InvalidInput(reason) => format!("Invalid request: {}", reason),
            ExtractionError::ProcessSpawnFailed { .. } | ExtractionError::ProcessIoFailed(_) => {
                "Subtitle extractor is unavailable".to_string()
            }
            ExtractionError::ProcessTimedOut { .. } => {
                "Subtitle extraction timed out, please retry later".to_string()
            }
            ExtractionError::ProcessExitedNonZero { .. } => {
                "Unable to extract subtitles for this URL".to_string()
            }
            ExtractionError::NoSubtitleFound => {
                "No subtitles are available for this video".to_string()
            }
        }
    }
}

/// Errors that stop the server itself
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ServerError>;
