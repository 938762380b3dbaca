//! In-memory screen
//!
//! `VirtualScreen` answers every [`ScreenEngine`] call from a script of
//! placed images and text instead of real pixels. Placements can appear and
//! vanish after a delay measured from the screen's creation, which makes it
//! usable both for dry runs of a keyword suite and as a test collaborator.

use crate::{EngineError, ScreenEngine};
use async_trait::async_trait;
use parking_lot::Mutex;
use sikuli_remote_protocol::{Action, EngineSetting, MatchInfo, Rect, ScreenInfo, Target};
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

/// An image drawn on the virtual screen
#[derive(Debug, Clone)]
pub struct Placement {
    pub image: String,
    pub region: Rect,
    pub score: f64,
    pub appears_after: Duration,
    pub vanishes_after: Option<Duration>,
}

impl Placement {
    pub fn new(image: impl Into<String>, region: Rect) -> Self {
        Self {
            image: image.into(),
            region,
            score: 0.95,
            appears_after: Duration::ZERO,
            vanishes_after: None,
        }
    }

    /// Score reported when the image is matched
    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Only visible once this much time has passed
    pub fn appearing_after(mut self, delay: Duration) -> Self {
        self.appears_after = delay;
        self
    }

    /// Gone once this much time has passed
    pub fn vanishing_after(mut self, delay: Duration) -> Self {
        self.vanishes_after = Some(delay);
        self
    }

    fn visible_at(&self, elapsed: Duration) -> bool {
        elapsed >= self.appears_after && self.vanishes_after.is_none_or(|until| elapsed < until)
    }
}

struct VirtualState {
    screens: Vec<ScreenInfo>,
    placements: Vec<Placement>,
    texts: Vec<(Rect, String)>,
    image_paths: Vec<String>,
    settings: Vec<EngineSetting>,
    actions: Vec<Action>,
    action_code: i32,
    fail_captures: bool,
    failing_clear: Option<Rect>,
    selection: Option<Rect>,
    active_highlights: Vec<Rect>,
    timed_highlights: Vec<(Rect, f64)>,
    locate_calls: usize,
    captures: usize,
}

/// A scripted, in-memory [`ScreenEngine`]
pub struct VirtualScreen {
    origin: Instant,
    state: Mutex<VirtualState>,
}

impl VirtualScreen {
    /// Create a screen with one monitor per rectangle, ids assigned in order
    pub fn new(monitors: Vec<Rect>) -> Self {
        let screens = monitors
            .into_iter()
            .enumerate()
            .map(|(id, bounds)| ScreenInfo {
                id: id as u32,
                bounds,
            })
            .collect();
        Self {
            origin: Instant::now(),
            state: Mutex::new(VirtualState {
                screens,
                placements: Vec::new(),
                texts: Vec::new(),
                image_paths: Vec::new(),
                settings: Vec::new(),
                actions: Vec::new(),
                action_code: 1,
                fail_captures: false,
                failing_clear: None,
                selection: None,
                active_highlights: Vec::new(),
                timed_highlights: Vec::new(),
                locate_calls: 0,
                captures: 0,
            }),
        }
    }

    /// A single monitor of the given size at the origin
    pub fn with_size(width: i32, height: i32) -> Self {
        Self::new(vec![Rect::new(0, 0, width, height)])
    }

    pub fn place(&self, placement: Placement) {
        self.state.lock().placements.push(placement);
    }

    /// Remove every placement of `image`
    pub fn remove(&self, image: &str) {
        self.state
            .lock()
            .placements
            .retain(|p| !same_image(&p.image, image));
    }

    pub fn place_text(&self, region: Rect, text: impl Into<String>) {
        self.state.lock().texts.push((region, text.into()));
    }

    /// Result code returned by every subsequent action; zero simulates failure
    pub fn set_action_code(&self, code: i32) {
        self.state.lock().action_code = code;
    }

    pub fn set_capture_failure(&self, fail: bool) {
        self.state.lock().fail_captures = fail;
    }

    /// Make clearing the highlight of `region` fail until reset with `None`
    pub fn set_clear_failure(&self, region: Option<Rect>) {
        self.state.lock().failing_clear = region;
    }

    /// Region returned by the next interactive selection
    pub fn set_selection(&self, region: Option<Rect>) {
        self.state.lock().selection = region;
    }

    pub fn locate_calls(&self) -> usize {
        self.state.lock().locate_calls
    }

    pub fn captures(&self) -> usize {
        self.state.lock().captures
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().actions.clone()
    }

    pub fn active_highlights(&self) -> Vec<Rect> {
        self.state.lock().active_highlights.clone()
    }

    pub fn timed_highlights(&self) -> Vec<(Rect, f64)> {
        self.state.lock().timed_highlights.clone()
    }

    pub fn settings(&self) -> Vec<EngineSetting> {
        self.state.lock().settings.clone()
    }

    pub fn image_paths(&self) -> Vec<String> {
        self.state.lock().image_paths.clone()
    }

    fn elapsed(&self) -> Duration {
        Instant::now().duration_since(self.origin)
    }

    fn matches_in(&self, target: &Target, region: Rect) -> Vec<MatchInfo> {
        let elapsed = self.elapsed();
        let mut state = self.state.lock();
        state.locate_calls += 1;

        match target {
            Target::Image { path, similarity } => state
                .placements
                .iter()
                .filter(|p| p.visible_at(elapsed))
                .filter(|p| same_image(&p.image, path))
                .filter(|p| p.score >= *similarity && region.contains(&p.region))
                .map(|p| MatchInfo::new(p.region, p.score))
                .collect(),
            Target::Text { text } => state
                .texts
                .iter()
                .filter(|(r, t)| region.contains(r) && t.contains(text.as_str()))
                .map(|(r, _)| MatchInfo::new(*r, 1.0))
                .collect(),
        }
    }
}

/// Images are identified by file name so that image-path lookups resolve
fn same_image(a: &str, b: &str) -> bool {
    let name = |s: &str| {
        Path::new(s)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| s.to_string())
    };
    name(a) == name(b)
}

fn encode_png(width: u32, height: u32) -> Result<Vec<u8>, EngineError> {
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    let img = ImageBuffer::from_pixel(width.max(1), height.max(1), Rgba([40u8, 44, 52, 255]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| EngineError::backend(format!("Failed to encode PNG: {}", e)))?;
    Ok(buf)
}

#[async_trait]
impl ScreenEngine for VirtualScreen {
    async fn screens(&self) -> Result<Vec<ScreenInfo>, EngineError> {
        Ok(self.state.lock().screens.clone())
    }

    async fn locate(&self, target: &Target, region: Rect) -> Result<Option<MatchInfo>, EngineError> {
        Ok(self.matches_in(target, region).into_iter().next())
    }

    async fn locate_all(&self, target: &Target, region: Rect) -> Result<Vec<MatchInfo>, EngineError> {
        Ok(self.matches_in(target, region))
    }

    async fn capture(&self, region: Rect) -> Result<Vec<u8>, EngineError> {
        {
            let mut state = self.state.lock();
            if state.fail_captures {
                return Err(EngineError::backend("capture failed"));
            }
            let (max_w, max_h) = state.screens.iter().fold((0, 0), |(w, h), s| {
                (w.max(s.bounds.w), h.max(s.bounds.h))
            });
            if region.w > max_w || region.h > max_h {
                return Err(EngineError::backend(format!(
                    "capture region {} is larger than any screen",
                    region
                )));
            }
            state.captures += 1;
        }
        encode_png(region.w.max(0) as u32, region.h.max(0) as u32)
    }

    async fn read_text(&self, region: Rect) -> Result<String, EngineError> {
        let state = self.state.lock();
        let lines: Vec<&str> = state
            .texts
            .iter()
            .filter(|(r, _)| region.contains(r))
            .map(|(_, t)| t.as_str())
            .collect();
        Ok(lines.join("\n"))
    }

    async fn perform(&self, action: &Action) -> Result<i32, EngineError> {
        let mut state = self.state.lock();
        state.actions.push(action.clone());
        Ok(state.action_code)
    }

    async fn highlight(&self, region: Rect, seconds: Option<f64>) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        match seconds {
            Some(secs) => state.timed_highlights.push((region, secs)),
            None => state.active_highlights.push(region),
        }
        Ok(())
    }

    async fn clear_highlight(&self, region: Rect) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        if state.failing_clear == Some(region) {
            return Err(EngineError::backend(format!(
                "cannot clear highlight at {}",
                region
            )));
        }
        if let Some(pos) = state.active_highlights.iter().position(|r| *r == region) {
            state.active_highlights.remove(pos);
        }
        Ok(())
    }

    async fn select_region(&self, _message: &str) -> Result<Option<Rect>, EngineError> {
        Ok(self.state.lock().selection)
    }

    async fn configure(&self, setting: &EngineSetting) -> Result<bool, EngineError> {
        let mut state = self.state.lock();
        let accepted = match setting {
            EngineSetting::AddImagePath(path) => {
                if !state.image_paths.contains(path) {
                    state.image_paths.push(path.clone());
                }
                true
            }
            EngineSetting::RemoveImagePath(path) => {
                let before = state.image_paths.len();
                state.image_paths.retain(|p| p != path);
                state.image_paths.len() != before
            }
            _ => true,
        };
        state.settings.push(setting.clone());
        Ok(accepted)
    }
}
