//! Screen and region keywords

use super::{rect_arg, rect_value};
use crate::coerce::BoundArgs;
use crate::context::LibraryContext;
use crate::errors::{KeywordError, KeywordResult};
use crate::region::{Direction, adjacent_region, validate};
use crate::wait;
use serde_json::{Value, json};
use sikuli_remote_protocol::Rect;

pub async fn change_screen_id(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let id = args.int("screen_id")?;
    ctx.region.change_screen(ctx.engine(), id).await?;
    Ok(Value::Null)
}

pub async fn get_current_screen_id(ctx: &LibraryContext, _args: BoundArgs) -> KeywordResult<Value> {
    Ok(json!(ctx.region.screen().id))
}

pub async fn get_number_of_screens(ctx: &LibraryContext, _args: BoundArgs) -> KeywordResult<Value> {
    Ok(json!(ctx.engine().screens().await?.len()))
}

pub async fn get_screen_coordinates(
    ctx: &LibraryContext,
    args: BoundArgs,
) -> KeywordResult<Value> {
    let Some(id) = args.opt_int("screen_id")? else {
        return Ok(rect_value(ctx.region.screen().bounds));
    };
    let screens = ctx.engine().screens().await?;
    let screen = usize::try_from(id)
        .ok()
        .and_then(|idx| screens.get(idx))
        .ok_or(KeywordError::NoSuchScreen {
            id,
            count: screens.len(),
        })?;
    Ok(rect_value(screen.bounds))
}

pub async fn get_image_coordinates(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let found = if args.contains("coordinates") {
        let region = rect_arg(&args, "coordinates")?;
        let locator = ctx.resolve(&image)?;
        wait::wait_for_in(ctx, &locator, region, ctx.timeout()).await?
    } else {
        wait::wait_default(ctx, &image).await?
    };
    Ok(rect_value(found.region))
}

fn direction_arg(args: &BoundArgs) -> KeywordResult<(Direction, i32)> {
    let direction: Direction = args.str("direction")?.parse()?;
    let repeat = args.coord("number_of_times_to_repeat")?;
    Ok((direction, repeat))
}

fn extended(
    args: &BoundArgs,
    base: Rect,
    direction: Direction,
    repeat: i32,
) -> KeywordResult<Value> {
    let region = adjacent_region(base, direction, repeat).ok_or_else(|| {
        KeywordError::invalid_argument(
            args.keyword(),
            "number_of_times_to_repeat",
            "a repeat count that keeps the region within screen coordinates",
            repeat,
        )
    })?;
    Ok(rect_value(region))
}

pub async fn get_extended_region_from_image(
    ctx: &LibraryContext,
    args: BoundArgs,
) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let (direction, repeat) = direction_arg(&args)?;
    let found = wait::wait_default(ctx, &image).await?;
    extended(&args, found.region, direction, repeat)
}

pub async fn get_extended_region_from_region(
    _ctx: &LibraryContext,
    args: BoundArgs,
) -> KeywordResult<Value> {
    let base = rect_arg(&args, "coordinates")?;
    let (direction, repeat) = direction_arg(&args)?;
    extended(&args, base, direction, repeat)
}

pub async fn read_text_from_region(
    ctx: &LibraryContext,
    args: BoundArgs,
) -> KeywordResult<Value> {
    let region = rect_arg(&args, "coordinates")?;
    Ok(json!(ctx.engine().read_text(region).await?))
}

pub async fn set_roi(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let roi = if args.contains("coordinates") {
        rect_arg(&args, "coordinates")?
    } else {
        validate(Rect::new(
            args.coord("x")?,
            args.coord("y")?,
            args.coord("w")?,
            args.coord("h")?,
        ))?
    };
    ctx.region.set_roi(roi)?;
    if let Some(seconds) = args.opt_float("timeout")? {
        ctx.engine().highlight(roi, Some(seconds)).await?;
    }
    Ok(Value::Null)
}

pub async fn get_roi(ctx: &LibraryContext, _args: BoundArgs) -> KeywordResult<Value> {
    Ok(rect_value(ctx.region.roi()))
}

pub async fn reset_roi(ctx: &LibraryContext, _args: BoundArgs) -> KeywordResult<Value> {
    ctx.region.reset_roi();
    Ok(Value::Null)
}

pub async fn select_region(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let message = args.str("message")?;
    match ctx.engine().select_region(&message).await? {
        Some(region) => Ok(rect_value(region)),
        None => Err(KeywordError::screen_operation(
            "Select region",
            format!("'{}'", message),
            "selection was cancelled",
        )),
    }
}

#[cfg(test)]
mod tests {
    use crate::context::test_support::virtual_screen;
    use crate::keywords::test_support::{dispatcher, run};
    use serde_json::json;
    use sikuli_remote_engine::{Placement, VirtualScreen};
    use sikuli_remote_protocol::Rect;
    use std::sync::Arc;

    fn dual_monitor() -> Arc<VirtualScreen> {
        Arc::new(VirtualScreen::new(vec![
            Rect::new(0, 0, 1920, 1080),
            Rect::new(1920, 0, 1280, 1024),
        ]))
    }

    #[tokio::test]
    async fn test_screen_selection() {
        let tmp = tempfile::tempdir().unwrap();
        let server = dispatcher(dual_monitor(), tmp.path()).await;

        assert_eq!(
            run(&server, "get_number_of_screens", &[]).await.return_value,
            json!(2)
        );
        assert!(run(&server, "change_screen_id", &["1"]).await.is_pass());
        assert_eq!(
            run(&server, "get_current_screen_id", &[]).await.return_value,
            json!(1)
        );
        assert_eq!(
            run(&server, "get_roi", &[]).await.return_value,
            json!([1920, 0, 1280, 1024])
        );
        assert_eq!(
            run(&server, "get_screen_coordinates", &["0"]).await.return_value,
            json!([0, 0, 1920, 1080])
        );
    }

    #[tokio::test]
    async fn test_change_to_missing_screen_keeps_state() {
        let tmp = tempfile::tempdir().unwrap();
        let server = dispatcher(dual_monitor(), tmp.path()).await;
        assert!(run(&server, "set_roi", &["[10, 10, 100, 100]"]).await.is_pass());

        let result = run(&server, "change_screen_id", &["2"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("NoSuchScreenError"));
        assert_eq!(
            run(&server, "get_current_screen_id", &[]).await.return_value,
            json!(0)
        );
        assert_eq!(
            run(&server, "get_roi", &[]).await.return_value,
            json!([10, 10, 100, 100])
        );
    }

    #[tokio::test]
    async fn test_set_roi_overloads() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        let server = dispatcher(screen.clone(), tmp.path()).await;

        assert!(run(&server, "set_roi", &["1", "2", "30", "40"]).await.is_pass());
        assert_eq!(
            run(&server, "get_roi", &[]).await.return_value,
            json!([1, 2, 30, 40])
        );

        assert!(
            run(&server, "set_roi", &["[5, 5, 50, 50]", "2"])
                .await
                .is_pass()
        );
        assert_eq!(screen.timed_highlights(), vec![(Rect::new(5, 5, 50, 50), 2.0)]);

        let result = run(&server, "set_roi", &["0", "0", "-1", "5"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("InvalidRegionError"));
        let result = run(&server, "set_roi", &["0", "0", "5"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("NoSuchOverloadError"));

        assert!(run(&server, "reset_roi", &[]).await.is_pass());
        assert_eq!(
            run(&server, "get_roi", &[]).await.return_value,
            json!([0, 0, 1920, 1080])
        );
    }

    #[tokio::test]
    async fn test_extended_regions() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("label.png", Rect::new(10, 10, 50, 20)));
        let server = dispatcher(screen, tmp.path()).await;

        assert_eq!(
            run(
                &server,
                "get_extended_region_from_region",
                &["[10, 10, 50, 20]", "below", "2"]
            )
            .await
            .return_value,
            json!([10, 50, 50, 20])
        );
        assert_eq!(
            run(
                &server,
                "get_extended_region_from_image",
                &["label.png", "right", "1"]
            )
            .await
            .return_value,
            json!([60, 10, 50, 20])
        );
        let result = run(
            &server,
            "get_extended_region_from_region",
            &["[10, 10, 50, 20]", "diagonal", "1"],
        )
        .await;
        assert_eq!(result.error_kind.as_deref(), Some("InvalidDirectionError"));
    }

    #[tokio::test]
    async fn test_extended_region_out_of_range_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let server = dispatcher(virtual_screen(), tmp.path()).await;

        let result = run(
            &server,
            "get_extended_region_from_region",
            &["[10, 10, 50, 20]", "below", "2000000000"],
        )
        .await;
        assert_eq!(result.error_kind.as_deref(), Some("ArgumentCoercionError"));
        assert!(result.client_error);
    }

    #[tokio::test]
    async fn test_image_coordinates_and_text() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("icon.png", Rect::new(300, 300, 16, 16)));
        screen.place_text(Rect::new(0, 0, 200, 20), "Untitled");
        let server = dispatcher(screen, tmp.path()).await;

        assert_eq!(
            run(&server, "get_image_coordinates", &["icon.png"])
                .await
                .return_value,
            json!([300, 300, 16, 16])
        );
        assert_eq!(
            run(
                &server,
                "get_image_coordinates",
                &["icon.png", "[250, 250, 100, 100]"]
            )
            .await
            .return_value,
            json!([300, 300, 16, 16])
        );
        assert_eq!(
            run(&server, "read_text_from_region", &["[0, 0, 400, 40]"])
                .await
                .return_value,
            json!("Untitled")
        );
    }

    #[tokio::test]
    async fn test_select_region() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        let server = dispatcher(screen.clone(), tmp.path()).await;

        let result = run(&server, "select_region", &["Pick the toolbar"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("ScreenOperationError"));

        screen.set_selection(Some(Rect::new(0, 0, 300, 40)));
        assert_eq!(
            run(&server, "select_region", &["Pick the toolbar"])
                .await
                .return_value,
            json!([0, 0, 300, 40])
        );
    }
}
