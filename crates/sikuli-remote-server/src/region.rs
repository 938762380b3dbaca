//! Screen selection and region of interest
//!
//! Every search without an explicit region runs inside the region of
//! interest (ROI). The ROI always belongs to the active screen and starts out
//! as that screen's full bounds.

use crate::errors::{KeywordError, KeywordResult};
use parking_lot::Mutex;
use sikuli_remote_engine::ScreenEngine;
use sikuli_remote_protocol::{Rect, ScreenInfo};
use std::str::FromStr;

/// Side of a region to extend towards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Above,
    Below,
    Left,
    Right,
    Original,
}

impl FromStr for Direction {
    type Err = KeywordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "above" => Ok(Self::Above),
            "below" => Ok(Self::Below),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "original" => Ok(Self::Original),
            _ => Err(KeywordError::InvalidDirection(s.to_string())),
        }
    }
}

/// Reject regions without area
pub fn validate(region: Rect) -> KeywordResult<Rect> {
    if region.w <= 0 || region.h <= 0 {
        return Err(KeywordError::InvalidRegion(region));
    }
    Ok(region)
}

/// The region `repeat` steps away from `base` on the given side.
///
/// Above/below keep the width and move by multiples of the height,
/// left/right keep the height and move by multiples of the width.
/// `None` when the offset leaves the coordinate range.
pub fn adjacent_region(base: Rect, direction: Direction, repeat: i32) -> Option<Rect> {
    let region = match direction {
        Direction::Above => {
            Rect::new(base.x, base.y.checked_sub(base.h.checked_mul(repeat)?)?, base.w, base.h)
        }
        Direction::Below => {
            Rect::new(base.x, base.y.checked_add(base.h.checked_mul(repeat)?)?, base.w, base.h)
        }
        Direction::Left => {
            Rect::new(base.x.checked_sub(base.w.checked_mul(repeat)?)?, base.y, base.w, base.h)
        }
        Direction::Right => {
            Rect::new(base.x.checked_add(base.w.checked_mul(repeat)?)?, base.y, base.w, base.h)
        }
        Direction::Original => base,
    };
    Some(region)
}

struct RegionState {
    screen: ScreenInfo,
    roi: Rect,
}

/// Active screen and ROI, shared by every call
///
/// Concurrent calls that mutate the ROI or the screen are last-write-wins.
pub struct RegionModel {
    state: Mutex<RegionState>,
}

impl RegionModel {
    pub fn new(screen: ScreenInfo) -> Self {
        Self {
            state: Mutex::new(RegionState {
                screen,
                roi: screen.bounds,
            }),
        }
    }

    pub fn screen(&self) -> ScreenInfo {
        self.state.lock().screen
    }

    pub fn roi(&self) -> Rect {
        self.state.lock().roi
    }

    /// Replace the ROI
    pub fn set_roi(&self, roi: Rect) -> KeywordResult<Rect> {
        let roi = validate(roi)?;
        self.state.lock().roi = roi;
        tracing::debug!("ROI set to {}", roi);
        Ok(roi)
    }

    /// Make the ROI the full bounds of the active screen
    pub fn reset_roi(&self) -> Rect {
        let mut state = self.state.lock();
        state.roi = state.screen.bounds;
        state.roi
    }

    /// Switch to another monitor and reset the ROI to its bounds.
    ///
    /// On an unknown id the previous screen and ROI stay in place.
    pub async fn change_screen(
        &self,
        engine: &dyn ScreenEngine,
        id: i64,
    ) -> KeywordResult<ScreenInfo> {
        let screens = engine.screens().await?;
        let screen = usize::try_from(id)
            .ok()
            .and_then(|idx| screens.get(idx).copied())
            .ok_or(KeywordError::NoSuchScreen {
                id,
                count: screens.len(),
            })?;

        let mut state = self.state.lock();
        state.screen = screen;
        state.roi = screen.bounds;
        tracing::info!("Active screen is now {} at {}", screen.id, screen.bounds);
        Ok(screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sikuli_remote_engine::VirtualScreen;

    fn primary() -> ScreenInfo {
        ScreenInfo {
            id: 0,
            bounds: Rect::new(0, 0, 1920, 1080),
        }
    }

    #[test]
    fn test_adjacent_region_arithmetic() {
        let base = Rect::new(10, 10, 50, 20);
        assert_eq!(
            adjacent_region(base, Direction::Below, 2),
            Some(Rect::new(10, 50, 50, 20))
        );
        assert_eq!(
            adjacent_region(base, Direction::Right, 1),
            Some(Rect::new(60, 10, 50, 20))
        );
        assert_eq!(
            adjacent_region(base, Direction::Above, 1),
            Some(Rect::new(10, -10, 50, 20))
        );
        assert_eq!(
            adjacent_region(base, Direction::Left, 3),
            Some(Rect::new(-140, 10, 50, 20))
        );
        assert_eq!(adjacent_region(base, Direction::Original, 5), Some(base));
    }

    #[test]
    fn test_adjacent_region_out_of_range() {
        let base = Rect::new(10, 10, 50, 20);
        assert_eq!(adjacent_region(base, Direction::Below, 2_000_000_000), None);
        assert_eq!(adjacent_region(base, Direction::Left, i32::MAX), None);
        let edge = Rect::new(i32::MAX - 10, 0, 20, 20);
        assert_eq!(adjacent_region(edge, Direction::Right, 1), None);
    }

    #[test]
    fn test_direction_tokens() {
        assert_eq!("Below".parse::<Direction>().unwrap(), Direction::Below);
        assert_eq!(" right ".parse::<Direction>().unwrap(), Direction::Right);
        let err = "sideways".parse::<Direction>().unwrap_err();
        assert!(matches!(err, KeywordError::InvalidDirection(ref d) if d == "sideways"));
    }

    #[test]
    fn test_set_and_reset_roi() {
        let model = RegionModel::new(primary());
        assert_eq!(model.roi(), Rect::new(0, 0, 1920, 1080));

        model.set_roi(Rect::new(100, 100, 200, 50)).unwrap();
        assert_eq!(model.roi(), Rect::new(100, 100, 200, 50));

        assert!(model.set_roi(Rect::new(0, 0, 0, 10)).is_err());
        assert_eq!(model.roi(), Rect::new(100, 100, 200, 50));

        assert_eq!(model.reset_roi(), Rect::new(0, 0, 1920, 1080));
    }

    #[tokio::test]
    async fn test_change_screen_resets_roi() {
        let engine = VirtualScreen::new(vec![
            Rect::new(0, 0, 1920, 1080),
            Rect::new(1920, 0, 1280, 1024),
        ]);
        let model = RegionModel::new(primary());
        model.set_roi(Rect::new(5, 5, 5, 5)).unwrap();

        let screen = model.change_screen(&engine, 1).await.unwrap();
        assert_eq!(screen.id, 1);
        assert_eq!(model.roi(), Rect::new(1920, 0, 1280, 1024));
    }

    #[tokio::test]
    async fn test_change_to_missing_screen_keeps_state() {
        let engine = VirtualScreen::with_size(1920, 1080);
        let model = RegionModel::new(primary());
        model.set_roi(Rect::new(5, 5, 5, 5)).unwrap();

        let err = model.change_screen(&engine, 1).await.unwrap_err();
        assert!(matches!(err, KeywordError::NoSuchScreen { id: 1, count: 1 }));
        let err = model.change_screen(&engine, -1).await.unwrap_err();
        assert!(matches!(err, KeywordError::NoSuchScreen { .. }));

        assert_eq!(model.screen(), primary());
        assert_eq!(model.roi(), Rect::new(5, 5, 5, 5));
    }
}
