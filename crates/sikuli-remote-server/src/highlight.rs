//! On-screen highlights
//!
//! Untimed highlights stay visible until cleared and are tracked by the
//! locator string that produced them. Timed highlights are handed to the
//! engine with their duration and forgotten.

use crate::context::LibraryContext;
use crate::errors::KeywordResult;
use crate::report;
use crate::wait;
use parking_lot::Mutex;
use sikuli_remote_protocol::{MatchInfo, Rect};
use std::collections::HashMap;

/// Locator string to the match it highlighted
#[derive(Default)]
pub struct HighlightTracker {
    active: Mutex<HashMap<String, MatchInfo>>,
}

impl HighlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, locator: &str) -> bool {
        self.active.lock().contains_key(locator)
    }

    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }

    fn track(&self, locator: &str, found: MatchInfo) {
        self.active.lock().insert(locator.to_string(), found);
    }

    fn get(&self, locator: &str) -> Option<MatchInfo> {
        self.active.lock().get(locator).copied()
    }

    fn untrack(&self, locator: &str) {
        self.active.lock().remove(locator);
    }

    fn snapshot(&self) -> Vec<(String, MatchInfo)> {
        self.active
            .lock()
            .iter()
            .map(|(locator, found)| (locator.clone(), *found))
            .collect()
    }
}

/// Highlight the match of `locator`, for `seconds` or until cleared
pub async fn highlight(
    ctx: &LibraryContext,
    locator: &str,
    seconds: Option<f64>,
) -> KeywordResult<()> {
    if ctx.highlights.is_active(locator) {
        report::warn(format!("{} is already highlighted", locator));
        return Ok(());
    }

    let found = wait::wait_for(ctx, locator, 0.0).await?;
    match seconds {
        Some(secs) => {
            ctx.engine().highlight(found.region, Some(secs)).await?;
        }
        None => {
            ctx.engine().highlight(found.region, None).await?;
            ctx.highlights.track(locator, found);
        }
    }
    tracing::debug!("Highlighted {} at {}", locator, found.region);
    Ok(())
}

/// Highlight an explicit region for `seconds`
pub async fn highlight_region(
    ctx: &LibraryContext,
    region: Rect,
    seconds: f64,
) -> KeywordResult<()> {
    let region = crate::region::validate(region)?;
    ctx.engine().highlight(region, Some(seconds)).await?;
    Ok(())
}

/// Remove the untimed highlight of `locator`
///
/// The entry is dropped only once the engine has cleared it.
pub async fn clear_highlight(ctx: &LibraryContext, locator: &str) -> KeywordResult<()> {
    match ctx.highlights.get(locator) {
        Some(found) => {
            ctx.engine().clear_highlight(found.region).await?;
            ctx.highlights.untrack(locator);
            Ok(())
        }
        None => {
            report::warn(format!("{} is not highlighted", locator));
            Ok(())
        }
    }
}

/// Remove every untimed highlight
pub async fn clear_all_highlights(ctx: &LibraryContext) -> KeywordResult<()> {
    if ctx.highlights.is_empty() {
        return Ok(());
    }
    tracing::debug!("Clearing {} highlight(s)", ctx.highlights.len());
    for (locator, found) in ctx.highlights.snapshot() {
        tracing::debug!("Clearing highlight of {}", locator);
        ctx.engine().clear_highlight(found.region).await?;
        ctx.highlights.untrack(&locator);
    }
    Ok(())
}
