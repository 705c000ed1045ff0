//! Server configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::extract::is_valid_language_tag;

/// External extractor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Executable to launch (looked up on PATH when not absolute)
    pub program: String,

    /// Arguments placed before the generated ones, e.g. `["-m", "yt_dlp"]`
    /// when `program` is a Python interpreter. Operator-controlled only.
    pub program_args: Vec<String>,

    /// Subtitle languages requested when the caller gives none
    pub default_languages: Vec<String>,

    /// Time allowed for one extraction in milliseconds
    pub timeout_ms: u64,

    /// Maximum number of stderr bytes kept for error reports
    pub stderr_excerpt_bytes: usize,

    /// Stdout ceiling per run, larger output fails the extraction
    pub max_stdout_bytes: usize,

    /// Allow callers to pick their own languages
    pub allow_language_override: bool,

    /// Upper bound on the number of languages in one request
    pub max_languages: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            program_args: Vec::new(),
            default_languages: vec!["zh-Hans".to_string(), "en".to_string()],
            timeout_ms: 60_000,
            stderr_excerpt_bytes: 512,
            max_stdout_bytes: 16 * 1024 * 1024,
            allow_language_override: true,
            max_languages: 8,
        }
    }
}

impl ExtractorConfig {
    /// Get the timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Extractor configuration
    pub extractor: ExtractorConfig,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Maximum concurrent extractions, unlimited when `None`
    pub max_concurrent_extractions: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            extractor: ExtractorConfig::default(),
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            max_concurrent_extractions: Some(16),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check values that would make every request fail
    pub fn validate(&self) -> Result<(), String> {
        if self.extractor.program.trim().is_empty() {
            return Err("extractor.program must not be empty".to_string());
        }
        if self.extractor.timeout_ms == 0 {
            return Err("extractor.timeout_ms must be greater than zero".to_string());
        }
        if self.extractor.max_stdout_bytes == 0 {
            return Err("extractor.max_stdout_bytes must be greater than zero".to_string());
        }
        if self.extractor.max_languages == 0 {
            return Err("extractor.max_languages must be greater than zero".to_string());
        }
        if self.extractor.default_languages.is_empty() {
            return Err("extractor.default_languages must not be empty".to_string());
        }
        if self.extractor.default_languages.len() > self.extractor.max_languages {
            return Err(format!(
                "extractor.default_languages has {} entries, max_languages is {}",
                self.extractor.default_languages.len(),
                self.extractor.max_languages
            ));
        }
        if let Some(tag) = self
            .extractor
            .default_languages
            .iter()
            .find(|tag| !is_valid_language_tag(tag.trim()))
        {
            return Err(format!(
                "extractor.default_languages has an invalid tag: {:?}",
                tag
            ));
        }
        if self.max_concurrent_extractions == Some(0) {
            return Err("limits.max_concurrent_extractions must be greater than zero".to_string());
        }
        Ok(())
    }
}
