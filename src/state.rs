//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - Server configuration
//! - The extraction orchestrator shared by all requests
//! - The optional concurrency cap on running extractions

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::config::ServerConfig;
use crate::extract::Orchestrator;
use crate::process::{ProcessLauncher, TokioProcessLauncher};

/// Application state shared across all handlers
#[derive(Debug)]
pub struct AppState {
    /// Extraction orchestrator
    pub orchestrator: Orchestrator,

    /// Permits for running extractions, `None` when unlimited
    pub extraction_slots: Option<Arc<Semaphore>>,

    /// Server configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Create a new AppState that spawns the configured program directly
    pub fn new(config: ServerConfig) -> Self {
        let launcher =
            TokioProcessLauncher::new().with_stdout_limit(config.extractor.max_stdout_bytes);
        Self::with_launcher(config, Arc::new(launcher))
    }

    /// Create AppState with a custom process launcher
    pub fn with_launcher(config: ServerConfig, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            orchestrator: Orchestrator::new(launcher, config.extractor.clone()),
            extraction_slots: config
                .max_concurrent_extractions
                .map(|n| Arc::new(Semaphore::new(n))),
            config,
        }
    }

    /// Take an extraction slot.
    ///
    /// Returns `Ok(None)` when there is no limit. The permit must be held
    /// until the extraction finishes.
    pub fn try_acquire_slot(&self) -> Result<Option<OwnedSemaphorePermit>, TryAcquireError> {
        match &self.extraction_slots {
            None => Ok(None),
            Some(slots) => Arc::clone(slots).try_acquire_owned().map(Some),
        }
    }

    /// Number of extractions currently holding a slot
    pub fn extractions_in_flight(&self) -> Option<usize> {
        let limit = self.config.max_concurrent_extractions?;
        let available = self.extraction_slots.as_ref()?.available_permits();
        Some(limit.saturating_sub(available))
    }
}
