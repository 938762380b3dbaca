//! Diagnostic screen captures
//!
//! Captures land in `<base>/sikuli_captured/` and are announced to the test
//! report with a `*DEBUG*` line carrying the absolute path and an `*HTML*`
//! line embedding the image relative to the report folder.

use crate::constants::CAPTURE_SUB_FOLDER;
use crate::report;
use parking_lot::Mutex;
use sikuli_remote_engine::{EngineError, ScreenEngine};
use sikuli_remote_protocol::Rect;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use thiserror::Error;

/// Errors while producing a capture
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to capture screen: {0}")]
    Engine(#[from] EngineError),
    #[error("Failed to write capture: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes screenshots for the test report
pub struct CaptureSink {
    base: Mutex<PathBuf>,
    capture_matched: AtomicBool,
    sequence: AtomicU64,
}

impl CaptureSink {
    /// The capture folder is created lazily on the first capture
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Mutex::new(base.into()),
            capture_matched: AtomicBool::new(true),
            sequence: AtomicU64::new(0),
        }
    }

    /// Folder captures are written to
    pub fn directory(&self) -> PathBuf {
        self.base.lock().join(CAPTURE_SUB_FOLDER)
    }

    /// Point captures at `<base>/sikuli_captured/`, creating it right away
    pub fn set_folder(&self, base: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let dir = base.as_ref().join(CAPTURE_SUB_FOLDER);
        std::fs::create_dir_all(&dir)?;
        *self.base.lock() = base.as_ref().to_path_buf();
        Ok(dir)
    }

    /// Toggle captures of matched regions; returns the previous value
    pub fn set_capture_matched(&self, enabled: bool) -> bool {
        self.capture_matched.swap(enabled, Ordering::Relaxed)
    }

    pub fn captures_matched(&self) -> bool {
        self.capture_matched.load(Ordering::Relaxed)
    }

    /// Best-effort capture of a matched region, skipped when matched captures are off
    pub async fn capture_match(&self, engine: &dyn ScreenEngine, region: Rect) -> Option<PathBuf> {
        if !self.captures_matched() {
            return None;
        }
        self.capture(engine, region).await
    }

    /// Best-effort capture: failures are logged and swallowed
    pub async fn capture(&self, engine: &dyn ScreenEngine, region: Rect) -> Option<PathBuf> {
        match self.try_capture(engine, region).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Diagnostic capture of {} skipped: {}", region, e);
                None
            }
        }
    }

    /// Capture `region`, save it and announce it to the report
    pub async fn try_capture(
        &self,
        engine: &dyn ScreenEngine,
        region: Rect,
    ) -> Result<PathBuf, CaptureError> {
        let data = engine.capture(region).await?;
        let extension = image::guess_format(&data)
            .ok()
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("png");

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let file_name = format!("capture-{}-{:04}.{}", timestamp, seq, extension);

        let dir = self.directory();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &data).await?;

        let absolute = std::path::absolute(&path).unwrap_or_else(|_| path.clone());
        report::debug(format!("Saved path: {}", absolute.display()));
        report::html(format!("<img src='{}/{}'/>", CAPTURE_SUB_FOLDER, file_name));
        Ok(absolute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Output;
    use sikuli_remote_engine::VirtualScreen;

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .map(|entries| entries.map(|e| e.unwrap().path()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_capture_writes_file_and_report_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = CaptureSink::new(tmp.path());
        let engine = VirtualScreen::with_size(640, 480);
        let output = Output::new();

        let path = output
            .scope(sink.capture(&engine, Rect::new(0, 0, 64, 32)))
            .await
            .unwrap();

        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "png");
        assert_eq!(files_in(&tmp.path().join(CAPTURE_SUB_FOLDER)).len(), 1);

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let lines = output.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("*DEBUG* Saved path: "));
        assert_eq!(
            lines[1],
            format!("*HTML* <img src='sikuli_captured/{}'/>", name)
        );
    }

    #[tokio::test]
    async fn test_capture_failure_is_swallowed() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = CaptureSink::new(tmp.path());
        let engine = VirtualScreen::with_size(640, 480);
        engine.set_capture_failure(true);

        assert!(sink.capture(&engine, Rect::new(0, 0, 8, 8)).await.is_none());
        assert!(sink.try_capture(&engine, Rect::new(0, 0, 8, 8)).await.is_err());
        assert!(files_in(&sink.directory()).is_empty());
    }

    #[tokio::test]
    async fn test_matched_captures_can_be_disabled() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = CaptureSink::new(tmp.path());
        let engine = VirtualScreen::with_size(640, 480);

        assert!(sink.set_capture_matched(false));
        assert!(
            sink.capture_match(&engine, Rect::new(0, 0, 8, 8))
                .await
                .is_none()
        );
        assert_eq!(engine.captures(), 0);

        sink.set_capture_matched(true);
        assert!(
            sink.capture_match(&engine, Rect::new(0, 0, 8, 8))
                .await
                .is_some()
        );
    }

    #[test]
    fn test_set_folder_creates_sub_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = CaptureSink::new(".");
        let dir = sink.set_folder(tmp.path().join("run1")).unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir, tmp.path().join("run1").join(CAPTURE_SUB_FOLDER));
        assert_eq!(sink.directory(), dir);
    }
}
