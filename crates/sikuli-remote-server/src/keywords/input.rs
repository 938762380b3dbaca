//! Keyboard and mouse keywords

use super::perform;
use crate::coerce::BoundArgs;
use crate::context::LibraryContext;
use crate::errors::{KeywordError, KeywordResult};
use crate::wait;
use serde_json::Value;
use sikuli_remote_protocol::{Action, Key, MouseButton, SpecialKey, WheelDirection};

fn key_arg(args: &BoundArgs) -> KeywordResult<Key> {
    let token = args.str("key")?;
    Key::from_token(&token).ok_or_else(|| KeywordError::unresolved_constant("key", &token))
}

fn button_arg(args: &BoundArgs) -> KeywordResult<MouseButton> {
    let token = args.str("button")?;
    MouseButton::from_token(&token)
        .ok_or_else(|| KeywordError::unresolved_constant("mouse button", &token))
}

pub async fn press_special_key(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let token = args.str("key")?;
    let key = SpecialKey::from_token(&token)
        .ok_or_else(|| KeywordError::unresolved_constant("special key", &token))?;
    let action = Action::PressKey {
        key,
        modifiers: Vec::new(),
    };
    perform(ctx, action, "Press special key", &token).await?;
    Ok(Value::Null)
}

pub async fn key_down(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let key = key_arg(&args)?;
    let target = args.str("key")?;
    perform(ctx, Action::KeyDown { key }, "Key down", &target).await?;
    Ok(Value::Null)
}

pub async fn key_up(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let key = key_arg(&args)?;
    let target = args.str("key")?;
    perform(ctx, Action::KeyUp { key }, "Key up", &target).await?;
    Ok(Value::Null)
}

pub async fn mouse_move(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let image = args.str("image")?;
    let to = wait::wait_default(ctx, &image).await?.center;
    perform(ctx, Action::MouseMove { to }, "Mouse move", &image).await?;
    Ok(Value::Null)
}

pub async fn mouse_down(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let button = button_arg(&args)?;
    perform(ctx, Action::MouseDown { button }, "Mouse down", &format!("{:?}", button)).await?;
    Ok(Value::Null)
}

pub async fn mouse_up(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let button = button_arg(&args)?;
    perform(ctx, Action::MouseUp { button }, "Mouse up", &format!("{:?}", button)).await?;
    Ok(Value::Null)
}

/// Turn the wheel over an image, or over the center of the ROI without one
async fn wheel(
    ctx: &LibraryContext,
    args: &BoundArgs,
    direction: WheelDirection,
) -> KeywordResult<Value> {
    let steps = args.int("steps")?;
    let steps = u32::try_from(steps).map_err(|_| {
        KeywordError::invalid_argument(args.keyword(), "steps", "a non-negative integer", steps)
    })?;

    let (at, target) = match args.opt_str("image")? {
        Some(image) => (wait::wait_default(ctx, &image).await?.center, image),
        None => {
            let roi = ctx.region.roi();
            (roi.center(), roi.to_string())
        }
    };
    let action = Action::Wheel {
        at,
        direction,
        steps,
    };
    perform(ctx, action, "Wheel", &target).await?;
    Ok(Value::Null)
}

pub async fn wheel_up(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    wheel(ctx, &args, WheelDirection::Up).await
}

pub async fn wheel_down(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    wheel(ctx, &args, WheelDirection::Down).await
}

#[cfg(test)]
mod tests {
    use crate::context::test_support::virtual_screen;
    use crate::keywords::test_support::{dispatcher, run};
    use sikuli_remote_engine::Placement;
    use sikuli_remote_protocol::{
        Action, Key, MouseButton, Point, Rect, SpecialKey, WheelDirection,
    };

    #[tokio::test]
    async fn test_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        let server = dispatcher(screen.clone(), tmp.path()).await;

        assert!(run(&server, "press_special_key", &["ENTER"]).await.is_pass());
        assert!(run(&server, "Press Special Key", &["page_down"]).await.is_pass());
        assert!(run(&server, "key_down", &["a"]).await.is_pass());
        assert!(!run(&server, "key_up", &["NOT_A_KEY"]).await.is_pass());
        assert!(run(&server, "key_up", &["TAB"]).await.is_pass());

        assert_eq!(
            screen.actions(),
            vec![
                Action::PressKey {
                    key: SpecialKey::Enter,
                    modifiers: vec![]
                },
                Action::PressKey {
                    key: SpecialKey::PageDown,
                    modifiers: vec![]
                },
                Action::KeyDown { key: Key::Char('a') },
                Action::KeyUp {
                    key: Key::Special(SpecialKey::Tab)
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_special_key_is_screen_operation_error() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        let server = dispatcher(screen.clone(), tmp.path()).await;

        let result = run(&server, "press_special_key", &["ENTRE"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("ScreenOperationError"));
        assert!(result.error.contains("ENTRE"));
        assert!(screen.actions().is_empty());
    }

    #[tokio::test]
    async fn test_mouse_buttons() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("menu.png", Rect::new(10, 20, 30, 40)));
        let server = dispatcher(screen.clone(), tmp.path()).await;

        assert!(run(&server, "mouse_move", &["menu.png"]).await.is_pass());
        assert!(run(&server, "mouse_down", &[]).await.is_pass());
        assert!(run(&server, "mouse_up", &["right"]).await.is_pass());
        let result = run(&server, "mouse_down", &["THUMB"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("ScreenOperationError"));

        assert_eq!(
            screen.actions(),
            vec![
                Action::MouseMove {
                    to: Point::new(25, 40)
                },
                Action::MouseDown {
                    button: MouseButton::Left
                },
                Action::MouseUp {
                    button: MouseButton::Right
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_wheel() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        screen.place(Placement::new("list.png", Rect::new(0, 0, 100, 100)));
        let server = dispatcher(screen.clone(), tmp.path()).await;

        assert!(run(&server, "wheel_down", &["3", "list.png"]).await.is_pass());
        assert!(run(&server, "wheel_up", &["1"]).await.is_pass());
        let result = run(&server, "wheel_up", &["-1"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("ArgumentCoercionError"));

        assert_eq!(
            screen.actions(),
            vec![
                Action::Wheel {
                    at: Point::new(50, 50),
                    direction: WheelDirection::Down,
                    steps: 3
                },
                Action::Wheel {
                    at: Point::new(960, 540),
                    direction: WheelDirection::Up,
                    steps: 1
                },
            ]
        );
    }
}
