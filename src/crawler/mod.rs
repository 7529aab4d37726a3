//! Crawl execution
//!
//! This module contains the per-task crawl machinery:
//! - Request payload construction and the pagination cursor
//! - Result-row interpretation (fragment extraction)
//! - The pagination engine that drives one court/window task
//! - The per-run context shared (immutably) by all workers

mod engine;
pub mod payload;
pub mod rows;

pub use engine::{PaginationEngine, WindowOutcome};

use crate::captcha::TextRecognizer;
use crate::config::{Config, Endpoints};
use crate::courts::CourtRegistry;
use crate::progress::ProgressTracker;
use crate::storage::ObjectStore;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Everything one run shares across its workers
///
/// Constructed once per invocation and handed to the orchestrator; nothing in
/// here is mutable from workers except the progress tracker, which serializes
/// its own writes internally.
pub struct RunContext {
    pub config: Config,
    pub endpoints: Endpoints,
    pub registry: CourtRegistry,
    pub tracker: ProgressTracker,
    pub recognizer: Arc<dyn TextRecognizer>,
    pub object_store: Option<Arc<dyn ObjectStore>>,
    shutdown: AtomicBool,
}

impl RunContext {
    pub fn new(
        config: Config,
        registry: CourtRegistry,
        recognizer: Arc<dyn TextRecognizer>,
        object_store: Option<Arc<dyn ObjectStore>>,
    ) -> Result<Self> {
        let endpoints = config.portal.endpoints()?;
        let tracker = ProgressTracker::new(config.output.progress_path.clone());
        Ok(Self {
            config,
            endpoints,
            registry,
            tracker,
            recognizer,
            object_store,
            shutdown: AtomicBool::new(false),
        })
    }

    /// Asks in-flight workers to stop at their next row/page boundary
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}
