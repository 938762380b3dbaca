//! Report lines for the remote test reporter
//!
//! Keywords talk to the caller's test report through marked lines such as
//! `*DEBUG* message` or `*HTML* <img src='...'/>`. Every line is logged via
//! tracing, appended to the output of the keyword call that emitted it and,
//! when echoing is enabled, printed to stdout.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

static ECHO_STDOUT: AtomicBool = AtomicBool::new(false);

tokio::task_local! {
    static OUTPUT: Output;
}

/// Enable or disable mirroring report lines to stdout
pub fn set_echo_stdout(echo: bool) {
    ECHO_STDOUT.store(echo, Ordering::Relaxed);
}

/// Report lines collected during one keyword call
#[derive(Debug, Clone, Default)]
pub struct Output {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` with this buffer receiving every report line it emits
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        OUTPUT.scope(self.clone(), fut).await
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// All lines joined the way the remote result carries them
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    fn push(&self, line: String) {
        self.lines.lock().push(line);
    }
}

fn emit(marker: &str, message: &str) {
    let line = format!("*{}* {}", marker, message);
    if ECHO_STDOUT.load(Ordering::Relaxed) {
        println!("{}", line);
    }
    let _ = OUTPUT.try_with(|output| output.push(line));
}

pub fn debug(message: impl AsRef<str>) {
    let message = message.as_ref();
    tracing::debug!("{}", message);
    emit("DEBUG", message);
}

pub fn info(message: impl AsRef<str>) {
    let message = message.as_ref();
    tracing::info!("{}", message);
    emit("INFO", message);
}

pub fn warn(message: impl AsRef<str>) {
    let message = message.as_ref();
    tracing::warn!("{}", message);
    emit("WARN", message);
}

pub fn html(markup: impl AsRef<str>) {
    let markup = markup.as_ref();
    tracing::info!(html = markup, "report html");
    emit("HTML", markup);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_are_collected_in_scope() {
        let output = Output::new();
        output
            .scope(async {
                debug("Saved path: /tmp/a.png");
                html("<img src='sikuli_captured/a.png'/>");
            })
            .await;

        assert_eq!(
            output.lines(),
            vec![
                "*DEBUG* Saved path: /tmp/a.png".to_string(),
                "*HTML* <img src='sikuli_captured/a.png'/>".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_lines_outside_scope_are_not_collected() {
        let output = Output::new();
        warn("nobody is listening");
        output.scope(async { info("inside") }).await;
        assert_eq!(output.text(), "*INFO* inside");
    }
}
