//! Configuration file support
//!
//! Loads server configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{ExtractorConfig, ServerConfig};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Extractor settings
    pub extractor: ExtractorSettings,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Limits settings
    pub limits: Option<LimitsSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorSettings {
    /// Executable to launch
    pub program: String,
    /// Arguments placed before the generated ones
    pub program_args: Option<Vec<String>>,
    /// Languages requested when the caller gives none
    pub default_languages: Option<Vec<String>>,
    /// Timeout per extraction in milliseconds
    pub timeout_ms: u64,
    /// Maximum stderr bytes kept for error reports
    pub stderr_excerpt_bytes: Option<usize>,
    /// Stdout ceiling per run
    pub max_stdout_bytes: Option<usize>,
    /// Allow callers to pick their own languages
    pub allow_language_override: Option<bool>,
    /// Upper bound on languages per request
    pub max_languages: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSettings {
    /// Maximum concurrent extractions
    pub max_concurrent_extractions: Option<usize>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let extractor = ExtractorConfig::default();
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_enabled: Some(true),
            },
            extractor: ExtractorSettings {
                program: extractor.program,
                program_args: Some(extractor.program_args),
                default_languages: Some(extractor.default_languages),
                timeout_ms: extractor.timeout_ms,
                stderr_excerpt_bytes: Some(extractor.stderr_excerpt_bytes),
                max_stdout_bytes: Some(extractor.max_stdout_bytes),
                allow_language_override: Some(extractor.allow_language_override),
                max_languages: Some(extractor.max_languages),
            },
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
            limits: Some(LimitsSettings {
                max_concurrent_extractions: Some(16),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ExtractorConfig::default();
        let logging = self.logging;
        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            extractor: ExtractorConfig {
                program: self.extractor.program,
                program_args: self.extractor.program_args.unwrap_or_default(),
                default_languages: self
                    .extractor
                    .default_languages
                    .unwrap_or(defaults.default_languages),
                timeout_ms: self.extractor.timeout_ms,
                stderr_excerpt_bytes: self
                    .extractor
                    .stderr_excerpt_bytes
                    .unwrap_or(defaults.stderr_excerpt_bytes),
                max_stdout_bytes: self
                    .extractor
                    .max_stdout_bytes
                    .unwrap_or(defaults.max_stdout_bytes),
                allow_language_override: self
                    .extractor
                    .allow_language_override
                    .unwrap_or(defaults.allow_language_override),
                max_languages: self
                    .extractor
                    .max_languages
                    .unwrap_or(defaults.max_languages),
            },
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level: logging
                .as_ref()
                .map(|l| l.level.clone())
                .unwrap_or_else(|| "info".to_string()),
            log_format: logging
                .and_then(|l| l.format)
                .unwrap_or_else(|| "pretty".to_string()),
            max_concurrent_extractions: self
                .limits
                .and_then(|l| l.max_concurrent_extractions),
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
