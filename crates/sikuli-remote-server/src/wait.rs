//! Bounded polling searches
//!
//! Almost every keyword starts by waiting for its target. A wait computes a
//! deadline, then runs single search cycles against a region, sleeping one
//! poll interval (never past the deadline) between misses. A hit is captured
//! when matched captures are on; a timeout is always captured before the
//! `TimeoutError` is raised.

use crate::context::LibraryContext;
use crate::errors::{KeywordError, KeywordResult};
use crate::locator::Locator;
use crate::report;
use sikuli_remote_protocol::{MatchInfo, Rect};
use std::time::Duration;
use tokio::time::Instant;

/// Turn a timeout in seconds into a deadline
fn deadline_after(timeout: f64) -> KeywordResult<Instant> {
    if !timeout.is_finite() || timeout < 0.0 {
        return Err(KeywordError::InvalidTimeout(timeout));
    }
    let now = Instant::now();
    let wait = Duration::try_from_secs_f64(timeout).unwrap_or(Duration::MAX);
    Ok(now
        .checked_add(wait)
        .unwrap_or_else(|| now + Duration::from_secs(365 * 24 * 3600)))
}

/// Sleep until the next search cycle; `false` once the deadline has passed
async fn next_cycle(deadline: Instant, poll: Duration) -> bool {
    let now = Instant::now();
    if now >= deadline {
        return false;
    }
    tokio::time::sleep(poll.min(deadline - now)).await;
    true
}

/// Search for `locator` in `region` until found or the deadline passes
async fn search(
    ctx: &LibraryContext,
    locator: &Locator,
    region: Rect,
    timeout: f64,
) -> KeywordResult<Option<MatchInfo>> {
    let deadline = deadline_after(timeout)?;
    let poll = ctx.settings().poll_interval();

    loop {
        if let Some(found) = ctx.engine().locate(locator.target(), region).await? {
            tracing::debug!("{} found at {} (score {:.2})", locator.raw(), found.region, found.score);
            ctx.capture.capture_match(ctx.engine(), found.region).await;
            return Ok(Some(found));
        }
        if !next_cycle(deadline, poll).await {
            return Ok(None);
        }
    }
}

/// Capture the whole active screen as failure evidence
async fn capture_failure(ctx: &LibraryContext) {
    let bounds = ctx.region.screen().bounds;
    ctx.capture.capture(ctx.engine(), bounds).await;
}

/// Wait for `raw` inside the ROI
pub async fn wait_for(ctx: &LibraryContext, raw: &str, timeout: f64) -> KeywordResult<MatchInfo> {
    let locator = ctx.resolve(raw)?;
    wait_for_in(ctx, &locator, ctx.region.roi(), timeout).await
}

/// Wait for `raw` inside the ROI using the default timeout
pub async fn wait_default(ctx: &LibraryContext, raw: &str) -> KeywordResult<MatchInfo> {
    wait_for(ctx, raw, ctx.timeout()).await
}

/// Wait for an already parsed locator inside `region`
pub async fn wait_for_in(
    ctx: &LibraryContext,
    locator: &Locator,
    region: Rect,
    timeout: f64,
) -> KeywordResult<MatchInfo> {
    match search(ctx, locator, region, timeout).await? {
        Some(found) => Ok(found),
        None => {
            capture_failure(ctx).await;
            Err(KeywordError::timeout(locator.raw(), timeout))
        }
    }
}

/// Wait until `raw` is no longer visible inside the ROI
pub async fn wait_vanish(ctx: &LibraryContext, raw: &str, timeout: f64) -> KeywordResult<()> {
    let locator = ctx.resolve(raw)?;
    let region = ctx.region.roi();
    let deadline = deadline_after(timeout)?;
    let poll = ctx.settings().poll_interval();

    loop {
        if ctx.engine().locate(locator.target(), region).await?.is_none() {
            tracing::debug!("{} vanished", raw);
            return Ok(());
        }
        if !next_cycle(deadline, poll).await {
            capture_failure(ctx).await;
            return Err(KeywordError::vanish_timeout(raw, timeout));
        }
    }
}

/// Single search cycle that never fails; misses and errors are reported
pub async fn find(ctx: &LibraryContext, raw: &str) -> Option<MatchInfo> {
    let locator = match ctx.resolve(raw) {
        Ok(locator) => locator,
        Err(e) => {
            report::warn(e.to_string());
            return None;
        }
    };
    match search(ctx, &locator, ctx.region.roi(), 0.0).await {
        Ok(Some(found)) => Some(found),
        Ok(None) => {
            report::info(format!("{} not found", raw));
            None
        }
        Err(e) => {
            report::warn(format!("Find {} failed: {}", raw, e));
            None
        }
    }
}

/// Whether `raw` shows up inside the ROI within `timeout`
pub async fn exists(ctx: &LibraryContext, raw: &str, timeout: f64) -> KeywordResult<bool> {
    let locator = ctx.resolve(raw)?;
    Ok(search(ctx, &locator, ctx.region.roi(), timeout)
        .await?
        .is_some())
}

/// Every occurrence of `raw` inside the ROI, from a single search cycle
pub async fn find_all(ctx: &LibraryContext, raw: &str) -> KeywordResult<Vec<MatchInfo>> {
    let locator = ctx.resolve(raw)?;
    Ok(ctx
        .engine()
        .locate_all(locator.target(), ctx.region.roi())
        .await?)
}

/// Wait for any of `wanted` while none of `not_wanted` shows up.
///
/// Returns the wanted locator that matched first together with its match.
pub async fn wait_for_multiple(
    ctx: &LibraryContext,
    wanted: &[String],
    not_wanted: &[String],
    timeout: f64,
    poll: Duration,
) -> KeywordResult<(String, MatchInfo)> {
    let wanted = wanted
        .iter()
        .map(|raw| ctx.resolve(raw))
        .collect::<KeywordResult<Vec<_>>>()?;
    let not_wanted = not_wanted
        .iter()
        .map(|raw| ctx.resolve(raw))
        .collect::<KeywordResult<Vec<_>>>()?;
    let region = ctx.region.roi();
    let deadline = deadline_after(timeout)?;

    loop {
        for locator in &not_wanted {
            if ctx.engine().locate(locator.target(), region).await?.is_some() {
                capture_failure(ctx).await;
                return Err(KeywordError::UnexpectedImage {
                    image: locator.raw().to_string(),
                });
            }
        }
        for locator in &wanted {
            if let Some(found) = ctx.engine().locate(locator.target(), region).await? {
                ctx.capture.capture_match(ctx.engine(), found.region).await;
                return Ok((locator.raw().to_string(), found));
            }
        }
        if !next_cycle(deadline, poll).await {
            capture_failure(ctx).await;
            let names: Vec<&str> = wanted.iter().map(|l| l.raw()).collect();
            return Err(KeywordError::timeout(names.join(", "), timeout));
        }
    }
}
