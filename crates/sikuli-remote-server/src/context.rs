//! Library context shared by every keyword
//!
//! All process-wide state lives here: runtime settings, the active screen
//! and ROI, the capture sink and the highlight map. Each piece has its own
//! short lock that is never held across an await, so calls from different
//! connections interleave freely and mutations are last-write-wins.

use crate::capture::CaptureSink;
use crate::constants::{
    DEFAULT_MIN_SIMILARITY, DEFAULT_MOVE_MOUSE_DELAY, DEFAULT_OCR_LANGUAGE, DEFAULT_TIMEOUT_SECS,
    DEFAULT_WAIT_SCAN_RATE,
};
use crate::errors::{KeywordError, KeywordResult};
use crate::highlight::HighlightTracker;
use crate::locator::{self, Locator};
use crate::region::RegionModel;
use parking_lot::Mutex;
use sikuli_remote_engine::{EngineError, ScreenEngine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Runtime settings changed through keywords
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Default wait timeout in seconds
    pub timeout: f64,
    pub min_similarity: f64,
    pub ocr_text_read: bool,
    pub ocr_language: String,
    pub show_actions: bool,
    pub move_mouse_delay: f64,
    pub slow_motion_delay: f64,
    /// Search cycles per second while waiting
    pub wait_scan_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            min_similarity: DEFAULT_MIN_SIMILARITY,
            ocr_text_read: false,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            show_actions: false,
            move_mouse_delay: DEFAULT_MOVE_MOUSE_DELAY,
            slow_motion_delay: 2.0,
            wait_scan_rate: DEFAULT_WAIT_SCAN_RATE,
        }
    }
}

impl Settings {
    /// Sleep between two search cycles of a wait
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.wait_scan_rate)
            .unwrap_or_else(|_| Duration::from_secs_f64(1.0 / DEFAULT_WAIT_SCAN_RATE))
    }
}

/// Everything a keyword needs to run
pub struct LibraryContext {
    engine: Arc<dyn ScreenEngine>,
    settings: Mutex<Settings>,
    pub region: RegionModel,
    pub capture: CaptureSink,
    pub highlights: HighlightTracker,
}

impl LibraryContext {
    /// Bind to the engine's first screen; fails when the engine reports none
    pub async fn new(
        engine: Arc<dyn ScreenEngine>,
        capture_base: impl Into<PathBuf>,
    ) -> KeywordResult<Self> {
        let screens = engine.screens().await?;
        let primary = screens.first().copied().ok_or_else(|| {
            KeywordError::Engine(EngineError::Unavailable(
                "engine reports no screens".to_string(),
            ))
        })?;
        tracing::info!(
            "Screen engine ready with {} screen(s), primary at {}",
            screens.len(),
            primary.bounds
        );

        Ok(Self {
            engine,
            settings: Mutex::new(Settings::default()),
            region: RegionModel::new(primary),
            capture: CaptureSink::new(capture_base),
            highlights: HighlightTracker::new(),
        })
    }

    pub fn engine(&self) -> &dyn ScreenEngine {
        self.engine.as_ref()
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> Settings {
        self.settings.lock().clone()
    }

    /// Mutate the settings under the lock
    pub fn update_settings<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> R {
        f(&mut self.settings.lock())
    }

    pub fn timeout(&self) -> f64 {
        self.settings.lock().timeout
    }

    /// Parse a locator with the current minimum similarity as default
    pub fn resolve(&self, raw: &str) -> KeywordResult<Locator> {
        let min_similarity = self.settings.lock().min_similarity;
        locator::resolve(raw, min_similarity)
    }
}
