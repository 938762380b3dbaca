//! Screen keywords: clicks, typing, waits, checks and captures

use super::{perform, rect_arg};
use crate::coerce::BoundArgs;
use crate::context::LibraryContext;
use crate::errors::{KeywordError, KeywordResult};
use crate::report;
use crate::wait;
use serde_json::{Value, json};
use sikuli_remote_protocol::{Action, KeyModifier, MatchInfo, MouseButton, Point};
use std::time::Duration;

/// Click at `at` with the given button and click count
async fn click_at(
    ctx: &LibraryContext,
    at: Point,
    button: MouseButton,
    clicks: u8,
    target: &str,
) -> KeywordResult<()> {
    let action = Action::Click {
        at,
        button,
        clicks,
        modifiers: Vec::new(),
    };
    let operation = match (button, clicks) {
        (MouseButton::Right, _) => "Right click",
        (_, 2) => "Double click",
        _ => "Click",
    };
    perform(ctx, action, operation, target).await
}

/// Wait for the image, then click its center shifted by the optional offset
async fn click_image(
    ctx: &LibraryContext,
    args: &BoundArgs,
    button: MouseButton,
    clicks: u8,
) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let x_offset = args.opt_coord("x_offset")?.unwrap_or(0);
    let y_offset = args.opt_coord("y_offset")?.unwrap_or(0);

    let found = wait::wait_default(ctx, &image).await?;
    let at = found.center.offset(x_offset, y_offset);
    click_at(ctx, at, button, clicks, &image).await?;
    Ok(Value::Null)
}

pub async fn click(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    click_image(ctx, &args, MouseButton::Left, 1).await
}

pub async fn double_click(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    click_image(ctx, &args, MouseButton::Left, 2).await
}

pub async fn right_click(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    click_image(ctx, &args, MouseButton::Right, 1).await
}

pub async fn click_nth(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let index = args.int("index")?;
    let by_column = args.bool("sort_by_column")?;

    wait::wait_default(ctx, &image).await?;
    let mut matches = wait::find_all(ctx, &image).await?;
    if by_column {
        matches.sort_by_key(|m| (m.region.x, m.region.y));
    } else {
        matches.sort_by_key(|m| (m.region.y, m.region.x));
    }

    let found: MatchInfo = usize::try_from(index)
        .ok()
        .and_then(|idx| matches.get(idx).copied())
        .ok_or_else(|| {
            KeywordError::screen_operation(
                "Click nth",
                &image,
                format!("index {} out of {} match(es)", index, matches.len()),
            )
        })?;
    click_at(ctx, found.center, MouseButton::Left, 1, &image).await?;
    Ok(Value::Null)
}

/// Find the area image, then the target image inside it, and click the target
async fn click_inside(
    ctx: &LibraryContext,
    args: &BoundArgs,
    button: MouseButton,
    clicks: u8,
) -> KeywordResult<Value> {
    let area_image = args.str("area_image")?;
    let target_image = args.str("target_image")?;

    let area = wait::wait_default(ctx, &area_image).await?;
    report::info(format!("{} is found", area_image));
    let target = ctx.resolve(&target_image)?;
    let found = wait::wait_for_in(ctx, &target, area.region, ctx.timeout()).await?;
    click_at(ctx, found.center, button, clicks, &target_image).await?;
    Ok(Value::Null)
}

pub async fn click_in(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    click_inside(ctx, &args, MouseButton::Left, 1).await
}

pub async fn double_click_in(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    click_inside(ctx, &args, MouseButton::Left, 2).await
}

pub async fn right_click_in(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    click_inside(ctx, &args, MouseButton::Right, 1).await
}

pub async fn click_region(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let region = rect_arg(&args, "coordinates")?;
    click_at(
        ctx,
        region.center(),
        MouseButton::Left,
        1,
        &region.to_string(),
    )
    .await?;
    Ok(Value::Null)
}

/// Click `image` unless it is empty, so that typing goes to the focused element otherwise
async fn focus(ctx: &LibraryContext, image: &str) -> KeywordResult<()> {
    if image.trim().is_empty() {
        return Ok(());
    }
    let found = wait::wait_default(ctx, image).await?;
    click_at(ctx, found.center, MouseButton::Left, 1, image).await
}

pub async fn input_text(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let text = args.str("text")?;

    report::info(format!("Input text: {}", text));
    focus(ctx, &image).await?;
    let action = Action::Type {
        text,
        modifiers: Vec::new(),
    };
    perform(ctx, action, "Input text", &image).await?;
    Ok(Value::Null)
}

/// Parse modifier tokens such as `CTRL` or `shift`
pub(crate) fn modifiers(tokens: &[String]) -> KeywordResult<Vec<KeyModifier>> {
    tokens
        .iter()
        .map(|token| {
            KeyModifier::from_token(token)
                .ok_or_else(|| KeywordError::unresolved_constant("key modifier", token))
        })
        .collect()
}

pub async fn type_with_modifiers(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let text = args.str("text")?;
    let modifiers = modifiers(&args.varargs()?)?;
    let target = format!("'{}'", text);
    perform(ctx, Action::Type { text, modifiers }, "Type with modifiers", &target).await?;
    Ok(Value::Null)
}

pub async fn paste_text(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let text = args.str("text")?;

    focus(ctx, &image).await?;
    perform(ctx, Action::Paste { text }, "Paste text", &image).await?;
    Ok(Value::Null)
}

/// Per-call timeout, falling back to the default
fn timeout_arg(ctx: &LibraryContext, args: &BoundArgs) -> KeywordResult<f64> {
    Ok(args.opt_float("timeout")?.unwrap_or_else(|| ctx.timeout()))
}

pub async fn wait_until_screen_contain(
    ctx: &LibraryContext,
    args: BoundArgs,
) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let timeout = timeout_arg(ctx, &args)?;
    wait::wait_for(ctx, &image, timeout).await?;
    Ok(Value::Null)
}

pub async fn wait_until_screen_not_contain(
    ctx: &LibraryContext,
    args: BoundArgs,
) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let timeout = timeout_arg(ctx, &args)?;
    wait::wait_vanish(ctx, &image, timeout).await?;
    Ok(Value::Null)
}

pub async fn screen_should_contain(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let image = args.str("image")?;
    wait::wait_default(ctx, &image).await?;
    Ok(Value::Null)
}

pub async fn screen_should_not_contain(
    ctx: &LibraryContext,
    args: BoundArgs,
) -> KeywordResult<Value> {
    let image = args.str("image")?;
    ctx.resolve(&image)?;
    if wait::find(ctx, &image).await.is_some() {
        ctx.capture
            .capture(ctx.engine(), ctx.region.screen().bounds)
            .await;
        return Err(KeywordError::screen_operation(
            "Screen should not contain",
            &image,
            "the image is shown",
        ));
    }
    Ok(Value::Null)
}

pub async fn exists(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let timeout = args.float("timeout")?;
    Ok(json!(wait::exists(ctx, &image, timeout).await?))
}

pub async fn wait_for_image(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let wanted = args.str("wanted_image")?;
    let not_wanted = args.str("not_wanted_image")?;
    let timeout = args.float("timeout")?;
    let poll = ctx.settings().poll_interval();

    wait::wait_for_multiple(ctx, &[wanted], &[not_wanted], timeout, poll).await?;
    Ok(Value::Null)
}

pub async fn wait_for_multiple_images(
    ctx: &LibraryContext,
    args: BoundArgs,
) -> KeywordResult<Value> {
    let timeout = args.float("timeout")?;
    let interval = args.float("polling_interval")?;
    let expected = args.str_list("expected_images")?;
    let not_expected = args.str_list("not_expected_images")?;

    let poll = Duration::try_from_secs_f64(interval).map_err(|_| {
        KeywordError::invalid_argument(
            args.keyword(),
            "polling_interval",
            "a non-negative number of seconds",
            interval,
        )
    })?;
    let (name, _) = wait::wait_for_multiple(ctx, &expected, &not_expected, timeout, poll).await?;
    Ok(json!(name))
}

pub async fn image_count(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let image = args.str("image")?;
    Ok(json!(wait::find_all(ctx, &image).await?.len()))
}

pub async fn get_match_score(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let found = wait::wait_default(ctx, &image).await?;
    Ok(json!(found.score))
}

pub async fn get_text(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let region = match args.opt_str("image")? {
        Some(image) => wait::wait_default(ctx, &image).await?.region,
        None => ctx.region.roi(),
    };
    Ok(json!(ctx.engine().read_text(region).await?))
}

pub async fn drag_and_drop(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let src_image = args.str("src_image")?;
    let target_image = args.str("target_image")?;

    let from = wait::wait_default(ctx, &src_image).await?.center;
    let to = wait::wait_default(ctx, &target_image).await?.center;
    perform(ctx, Action::Drag { from, to }, "Drag and drop", &src_image).await?;
    Ok(Value::Null)
}

pub async fn drag_and_drop_by_offset(
    ctx: &LibraryContext,
    args: BoundArgs,
) -> KeywordResult<Value> {
    let src_image = args.str("src_image")?;
    let x_offset = args.coord("x_offset")?;
    let y_offset = args.coord("y_offset")?;

    let from = wait::wait_default(ctx, &src_image).await?.center;
    let to = from.offset(x_offset, y_offset);
    perform(ctx, Action::Drag { from, to }, "Drag and drop", &src_image).await?;
    Ok(Value::Null)
}

/// Saved path, or an empty string when the capture failed
fn saved_path(path: Option<std::path::PathBuf>) -> Value {
    json!(path.map(|p| p.display().to_string()).unwrap_or_default())
}

pub async fn capture_screen(ctx: &LibraryContext, _args: BoundArgs) -> KeywordResult<Value> {
    let bounds = ctx.region.screen().bounds;
    Ok(saved_path(ctx.capture.capture(ctx.engine(), bounds).await))
}

pub async fn capture_region(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let region = rect_arg(&args, "coordinates")?;
    Ok(saved_path(ctx.capture.capture(ctx.engine(), region).await))
}

pub async fn capture_roi(ctx: &LibraryContext, _args: BoundArgs) -> KeywordResult<Value> {
    let roi = ctx.region.roi();
    Ok(saved_path(ctx.capture.capture(ctx.engine(), roi).await))
}

#[cfg(test)]
mod tests {
    use crate::constants::CAPTURE_SUB_FOLDER;
    use crate::context::test_support::virtual_screen;
    use crate::keywords::test_support::{dispatcher, run};
    use serde_json::json;
    use sikuli_remote_engine::Placement;
    use sikuli_remote_protocol::{Action, KeyModifier, MouseButton, Point, Rect};
    use std::time::Duration;

    fn clicks(actions: &[Action]) -> Vec<(Point, MouseButton, u8)> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Click {
                    at, button, clicks, ..
                } => Some((*at, *button, *clicks)),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_click_variants() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("ok.png", Rect::new(100, 100, 40, 20)));
        let server = dispatcher(screen.clone(), tmp.path()).await;

        assert!(run(&server, "click", &["ok.png"]).await.is_pass());
        assert!(run(&server, "Click", &["ok.png", "5", "-5"]).await.is_pass());
        assert!(run(&server, "double_click", &["ok.png"]).await.is_pass());
        assert!(run(&server, "right_click", &["ok.png"]).await.is_pass());

        assert_eq!(
            clicks(&screen.actions()),
            vec![
                (Point::new(120, 110), MouseButton::Left, 1),
                (Point::new(125, 105), MouseButton::Left, 1),
                (Point::new(120, 110), MouseButton::Left, 2),
                (Point::new(120, 110), MouseButton::Right, 1),
            ]
        );

        let result = run(&server, "click", &["ok.png", "5"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("NoSuchOverloadError"));
    }

    #[tokio::test]
    async fn test_failed_action_is_screen_operation_error() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("ok.png", Rect::new(0, 0, 10, 10)));
        screen.set_action_code(0);
        let server = dispatcher(screen, tmp.path()).await;

        let result = run(&server, "click", &["ok.png"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("ScreenOperationError"));
        assert!(result.error.contains("ok.png"));
        assert!(!result.client_error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_on_missing_image_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        let server = dispatcher(screen.clone(), tmp.path()).await;

        let result = run(&server, "click", &["missing.png"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("TimeoutError"));
        assert!(screen.actions().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_locator_is_client_error() {
        let tmp = tempfile::tempdir().unwrap();
        let server = dispatcher(virtual_screen(), tmp.path()).await;

        let result = run(&server, "click", &["img.png=abc"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("InvalidLocatorError"));
        assert!(result.client_error);
    }

    #[tokio::test]
    async fn test_click_nth_orders_matches() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("row.png", Rect::new(300, 0, 10, 10)));
        screen.place(Placement::new("row.png", Rect::new(0, 200, 10, 10)));
        screen.place(Placement::new("row.png", Rect::new(100, 100, 10, 10)));
        let server = dispatcher(screen.clone(), tmp.path()).await;

        assert!(run(&server, "click_nth", &["row.png", "1"]).await.is_pass());
        assert!(
            run(&server, "click_nth", &["row.png", "0", "false"])
                .await
                .is_pass()
        );
        assert_eq!(
            clicks(&screen.actions()),
            vec![
                (Point::new(105, 105), MouseButton::Left, 1),
                (Point::new(305, 5), MouseButton::Left, 1),
            ]
        );

        let result = run(&server, "click_nth", &["row.png", "3"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("ScreenOperationError"));
    }

    #[tokio::test]
    async fn test_click_in_searches_inside_area() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("dialog.png", Rect::new(500, 500, 200, 100)));
        screen.place(Placement::new("ok.png", Rect::new(10, 10, 20, 10)));
        screen.place(Placement::new("ok.png", Rect::new(600, 560, 20, 10)));
        let server = dispatcher(screen.clone(), tmp.path()).await;

        let result = run(&server, "click_in", &["dialog.png", "ok.png"]).await;
        assert!(result.is_pass(), "{}", result.error);
        assert!(result.output.contains("*INFO* dialog.png is found"));
        assert_eq!(
            clicks(&screen.actions()),
            vec![(Point::new(610, 565), MouseButton::Left, 1)]
        );

        assert!(
            run(&server, "right_click_in", &["dialog.png", "ok.png"])
                .await
                .is_pass()
        );
        assert!(
            run(&server, "double_click_in", &["dialog.png", "ok.png"])
                .await
                .is_pass()
        );
    }

    #[tokio::test]
    async fn test_click_region() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        let server = dispatcher(screen.clone(), tmp.path()).await;

        assert!(
            run(&server, "click_region", &["[10, 10, 20, 20]"])
                .await
                .is_pass()
        );
        assert_eq!(
            clicks(&screen.actions()),
            vec![(Point::new(20, 20), MouseButton::Left, 1)]
        );

        let result = run(&server, "click_region", &["[10, 10, 0, 20]"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("InvalidRegionError"));
        let result = run(&server, "click_region", &["[10, 10]"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("ArgumentCoercionError"));
    }

    #[tokio::test]
    async fn test_typing_keywords() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("field.png", Rect::new(0, 0, 100, 20)));
        let server = dispatcher(screen.clone(), tmp.path()).await;

        assert!(
            run(&server, "input_text", &["field.png", "hello"])
                .await
                .is_pass()
        );
        assert!(run(&server, "input_text", &["", "world"]).await.is_pass());
        assert!(
            run(&server, "type_with_modifiers", &["a", "CTRL", "shift"])
                .await
                .is_pass()
        );
        assert!(run(&server, "paste_text", &["", "clip"]).await.is_pass());

        let actions = screen.actions();
        assert_eq!(actions.len(), 5);
        assert!(matches!(actions[0], Action::Click { .. }));
        assert_eq!(
            actions[1],
            Action::Type {
                text: "hello".to_string(),
                modifiers: vec![]
            }
        );
        assert_eq!(
            actions[3],
            Action::Type {
                text: "a".to_string(),
                modifiers: vec![KeyModifier::Ctrl, KeyModifier::Shift]
            }
        );
        assert_eq!(
            actions[4],
            Action::Paste {
                text: "clip".to_string()
            }
        );

        let result = run(&server, "type_with_modifiers", &["a", "HYPER"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("ScreenOperationError"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_keywords() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(
            Placement::new("spinner.png", Rect::new(0, 0, 10, 10))
                .vanishing_after(Duration::from_secs(1)),
        );
        screen.place(
            Placement::new("done.png", Rect::new(50, 50, 10, 10))
                .appearing_after(Duration::from_secs(2)),
        );
        let server = dispatcher(screen, tmp.path()).await;

        assert!(
            run(&server, "wait_until_screen_not_contain", &["spinner.png", "5"])
                .await
                .is_pass()
        );
        assert!(
            run(&server, "wait_until_screen_contain", &["done.png", "5"])
                .await
                .is_pass()
        );
        assert!(run(&server, "screen_should_contain", &["done.png"]).await.is_pass());

        let result = run(&server, "screen_should_not_contain", &["done.png"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("ScreenOperationError"));
        assert!(result.output.contains("*HTML*"));
        assert!(
            run(&server, "screen_should_not_contain", &["spinner.png"])
                .await
                .is_pass()
        );

        let result = run(&server, "wait_until_screen_contain", &["nope.png", "1"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("TimeoutError"));
        assert!(result.error.contains("nope.png"));
    }

    #[tokio::test]
    async fn test_exists_and_counts() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("a.png", Rect::new(0, 0, 10, 10)).with_score(0.83));
        screen.place(Placement::new("a.png", Rect::new(20, 0, 10, 10)));
        let server = dispatcher(screen, tmp.path()).await;

        assert_eq!(run(&server, "exists", &["a.png"]).await.return_value, json!(true));
        assert_eq!(
            run(&server, "exists", &["b.png", "0"]).await.return_value,
            json!(false)
        );
        assert_eq!(run(&server, "image_count", &["a.png"]).await.return_value, json!(2));
        assert_eq!(
            run(&server, "get_match_score", &["a.png"]).await.return_value,
            json!(0.83)
        );
        assert_eq!(
            run(&server, "exists", &["a.png=0.9"]).await.return_value,
            json!(true)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_multi_image_waits() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(
            Placement::new("saved.png", Rect::new(0, 0, 10, 10))
                .appearing_after(Duration::from_millis(700)),
        );
        screen.place(Placement::new("error.png", Rect::new(100, 0, 10, 10)));
        let server = dispatcher(screen, tmp.path()).await;

        let result = run(
            &server,
            "wait_for_multiple_images",
            &["5", "0.2", "['failed.png', 'saved.png']", "[]"],
        )
        .await;
        assert!(result.is_pass(), "{}", result.error);
        assert_eq!(result.return_value, json!("saved.png"));

        let result = run(&server, "wait_for_image", &["saved.png", "error.png", "5"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("UnexpectedImageError"));
    }

    #[tokio::test]
    async fn test_get_text() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("status.png", Rect::new(0, 1000, 400, 40)));
        screen.place_text(Rect::new(10, 1010, 100, 20), "Ready");
        screen.place_text(Rect::new(10, 10, 100, 20), "File");
        let server = dispatcher(screen, tmp.path()).await;

        assert_eq!(
            run(&server, "get_text", &["status.png"]).await.return_value,
            json!("Ready")
        );
        assert_eq!(
            run(&server, "get_text", &[]).await.return_value,
            json!("Ready\nFile")
        );
    }

    #[tokio::test]
    async fn test_drag_and_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("file.png", Rect::new(0, 0, 10, 10)));
        screen.place(Placement::new("bin.png", Rect::new(100, 100, 10, 10)));
        let server = dispatcher(screen.clone(), tmp.path()).await;

        assert!(
            run(&server, "drag_and_drop", &["file.png", "bin.png"])
                .await
                .is_pass()
        );
        assert!(
            run(&server, "drag_and_drop_by_offset", &["file.png", "50", "0"])
                .await
                .is_pass()
        );
        assert_eq!(
            screen.actions(),
            vec![
                Action::Drag {
                    from: Point::new(5, 5),
                    to: Point::new(105, 105)
                },
                Action::Drag {
                    from: Point::new(5, 5),
                    to: Point::new(55, 5)
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_capture_keywords_return_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        let server = dispatcher(screen.clone(), tmp.path()).await;

        let result = run(&server, "capture_screen", &[]).await;
        let path = result.return_value.as_str().unwrap().to_string();
        assert!(path.contains(CAPTURE_SUB_FOLDER));
        assert!(std::path::Path::new(&path).exists());
        assert!(result.output.contains("*HTML* <img src='sikuli_captured/"));

        assert!(
            run(&server, "capture_region", &["[0, 0, 50, 50]"])
                .await
                .is_pass()
        );
        assert!(run(&server, "capture_roi", &[]).await.is_pass());
        assert_eq!(screen.captures(), 3);

        screen.set_capture_failure(true);
        let result = run(&server, "capture_screen", &[]).await;
        assert!(result.is_pass());
        assert_eq!(result.return_value, json!(""));
    }

    #[tokio::test]
    async fn test_oversized_capture_region_fails_only_that_call() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        let server = dispatcher(screen.clone(), tmp.path()).await;

        let result = run(
            &server,
            "capture_region",
            &["[0, 0, 2000000000, 2000000000]"],
        )
        .await;
        assert_eq!(result.return_value, json!(""));
        assert_eq!(screen.captures(), 0);

        assert!(run(&server, "capture_screen", &[]).await.is_pass());
        assert_eq!(screen.captures(), 1);
    }
}
