//! Application keywords

use super::perform;
use crate::coerce::BoundArgs;
use crate::context::LibraryContext;
use crate::errors::KeywordResult;
use serde_json::Value;
use sikuli_remote_protocol::Action;

pub async fn open_application(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let path = args.str("path")?;
    let action = Action::OpenApplication { path: path.clone() };
    perform(ctx, action, "Open application", &path).await?;
    tracing::info!("Opened application {}", path);
    Ok(Value::Null)
}

pub async fn close_application(ctx: &LibraryContext, args: BoundArgs) -> KeywordResult<Value> {
    let name = args.str("name")?;
    let action = Action::CloseApplication { name: name.clone() };
    perform(ctx, action, "Close application", &name).await?;
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use crate::context::test_support::virtual_screen;
    use crate::keywords::test_support::{dispatcher, run};
    use sikuli_remote_protocol::Action;

    #[tokio::test]
    async fn test_open_and_close() {
        let tmp = tempfile::tempdir().unwrap();
        let screen = virtual_screen();
        let server = dispatcher(screen.clone(), tmp.path()).await;

        assert!(run(&server, "open_application", &["gedit"]).await.is_pass());
        assert!(run(&server, "close_application", &["gedit"]).await.is_pass());
        assert_eq!(
            screen.actions(),
            vec![
                Action::OpenApplication {
                    path: "gedit".to_string()
                },
                Action::CloseApplication {
                    name: "gedit".to_string()
                },
            ]
        );

        screen.set_action_code(0);
        let result = run(&server, "open_application", &["missing-app"]).await;
        assert_eq!(result.error_kind.as_deref(), Some("ScreenOperationError"));
    }
}
