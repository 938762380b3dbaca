//! Settings keywords

use super::configure;
use crate::coerce::BoundArgs;
use crate::context::LibraryContext;
use crate::errors::{KeywordError, KeywordResult};
use crate::report;
use serde_json::{Value, json};
use sikuli_remote_protocol::EngineSetting;
use std::time::Duration;

fn non_negative(args: &BoundArgs, name: &str) -> KeywordResult<f64> {
    let value = args.float(name)?;
    if value < 0.0 {
        return Err(KeywordError::invalid_argument(
            args.keyword(),
            name,
            "a non-negative number",
            value,
        ));
    }
    Ok(value)
}

pub async fn set_timeout(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let timeout = args.float("timeout")?;
    if timeout < 0.0 {
        return Err(KeywordError::InvalidTimeout(timeout));
    }
    let previous = ctx.update_settings(|s| std::mem::replace(&mut s.timeout, timeout));
    tracing::info!("Timeout set to {}s (was {}s)", timeout, previous);
    Ok(json!(previous.to_string()))
}

pub async fn set_min_similarity(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let similarity = args.float("min_similarity")?;
    if !(0.0..=1.0).contains(&similarity) {
        return Err(KeywordError::invalid_argument(
            args.keyword(),
            "min_similarity",
            "a number between 0 and 1",
            similarity,
        ));
    }
    let previous = ctx.update_settings(|s| std::mem::replace(&mut s.min_similarity, similarity));
    configure(ctx, EngineSetting::MinSimilarity(similarity)).await?;
    Ok(json!(previous.to_string()))
}

pub async fn add_image_path(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let path = args.str("path")?;
    let added = configure(ctx, EngineSetting::AddImagePath(path.clone())).await?;
    if !added {
        report::warn(format!("Image path {} was not added", path));
    }
    Ok(json!(added))
}

pub async fn remove_image_path(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let path = args.str("path")?;
    let removed = configure(ctx, EngineSetting::RemoveImagePath(path.clone())).await?;
    if !removed {
        report::warn(format!("Image path {} was not in the search path", path));
    }
    Ok(json!(removed))
}

pub async fn set_capture_folder(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let path = args.str("path")?;
    let dir = ctx
        .capture
        .set_folder(&path)
        .map_err(|e| KeywordError::screen_operation("Set capture folder", &path, e.to_string()))?;
    tracing::info!("Captures go to {}", dir.display());
    Ok(Value::Null)
}

pub async fn set_capture_matched_image(
    ctx: &LibraryContext,
    args: BoundArgs,
) -> KeywordResult<Value> {
    let enabled = args.bool("value")?;
    Ok(json!(ctx.capture.set_capture_matched(enabled)))
}

pub async fn set_ocr_text_read(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let enabled = args.bool("ocr_text_read")?;
    ctx.update_settings(|s| s.ocr_text_read = enabled);
    configure(ctx, EngineSetting::OcrTextRead(enabled)).await?;
    Ok(Value::Null)
}

pub async fn set_ocr_language(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let language = args.str("language")?;
    ctx.update_settings(|s| s.ocr_language = language.clone());
    configure(ctx, EngineSetting::OcrLanguage(language)).await?;
    Ok(Value::Null)
}

pub async fn set_show_actions(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let enabled = args.bool("show_actions")?;
    ctx.update_settings(|s| s.show_actions = enabled);
    configure(ctx, EngineSetting::ShowActions(enabled)).await?;
    Ok(Value::Null)
}

pub async fn set_move_mouse_delay(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let delay = non_negative(&args, "delay")?;
    ctx.update_settings(|s| s.move_mouse_delay = delay);
    configure(ctx, EngineSetting::MoveMouseDelay(delay)).await?;
    Ok(Value::Null)
}

pub async fn set_slow_motion_delay(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let delay = non_negative(&args, "delay")?;
    ctx.update_settings(|s| s.slow_motion_delay = delay);
    configure(ctx, EngineSetting::SlowMotionDelay(delay)).await?;
    Ok(Value::Null)
}

pub async fn set_wait_scan_rate(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let rate = args.float("scan_rate")?;
    if !rate.is_finite() || rate <= 0.0 || Duration::try_from_secs_f64(1.0 / rate).is_err() {
        return Err(KeywordError::invalid_argument(
            args.keyword(),
            "scan_rate",
            "a positive number with a representable poll interval",
            rate,
        ));
    }
    ctx.update_settings(|s| s.wait_scan_rate = rate);
    configure(ctx, EngineSetting::WaitScanRate(rate)).await?;
    Ok(Value::Null)
}
