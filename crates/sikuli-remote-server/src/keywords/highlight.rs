//! Highlight keywords

use super::rect_arg;
use crate::coerce::BoundArgs;
use crate::context::LibraryContext;
use crate::errors::KeywordResult;
use crate::highlight as tracker;
use serde_json::Value;

pub async fn highlight(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let seconds = args.opt_float("secs")?;
    tracker::highlight(ctx, &image, seconds).await?;
    Ok(Value::Null)
}

pub async fn clear_highlight(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let image = args.str("image")?;
    tracker::clear_highlight(ctx, &image).await?;
    Ok(Value::Null)
}

pub async fn clear_all_highlights(ctx: &LibraryContext, _args: BoundArgs) -> KeywordResult<Value> {
    tracker::clear_all_highlights(ctx).await?;
    Ok(Value::Null)
}

pub async fn highlight_region(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let region = rect_arg(&args, "coordinates")?;
    let seconds = args.float("timeout")?;
    tracker::highlight_region(ctx, region, seconds).await?;
    Ok(Value::Null)
}

pub async fn highlight_roi(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let seconds = args.float("timeout")?;
    tracker::highlight_region(ctx, ctx.region.roi(), seconds).await?;
    Ok(Value::Null)
}
