//! Remote dispatch
//!
//! Resolves a call by name, binds its arguments and runs the keyword on its
//! own task. Whatever happens inside, the caller receives exactly one
//! [`RemoteResult`]: domain errors, malformed calls and panics are all
//! translated into the failure payload here and nowhere else.

use crate::context::LibraryContext;
use crate::errors::CallError;
use crate::registry::{KeywordRegistry, normalize};
use crate::report::Output;
use serde_json::{Map, Value};
use sikuli_remote_protocol::{RemoteRequest, RemoteResponse, RemoteResult};
use std::error::Error as _;
use std::sync::Arc;
use tokio::sync::watch;

const STOP_KEYWORD: &str = "stop_remote_server";

const STOP_DOCUMENTATION: &str = "Stop the remote server once the current call has completed.";

/// Documentation returned for the `__intro__` pseudo keyword
pub const LIBRARY_INTRO: &str = "\
Visual UI automation keywords.

Keywords locate images or text on the screen and act on them. An image
locator may carry its own similarity threshold as `image.png=0.85`; any
locator without an image suffix is searched as text. Searches run inside
the region of interest of the active screen and wait up to the default
timeout (3 seconds unless changed with `Set Timeout`).

Failed waits save a screenshot under `<capture folder>/sikuli_captured/`
and embed it in the log.";

/// Documentation returned for the `__init__` pseudo keyword
pub const LIBRARY_INIT: &str = "\
The library is configured by the server process: the listen port and an
optional capture folder are given on the command line.";

/// Routes remote calls to registered keywords
pub struct RemoteDispatchServer {
    registry: KeywordRegistry,
    ctx: Arc<LibraryContext>,
    shutdown: watch::Sender<bool>,
}

impl RemoteDispatchServer {
    pub fn new(registry: KeywordRegistry, ctx: Arc<LibraryContext>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            registry,
            ctx,
            shutdown,
        }
    }

    pub fn context(&self) -> &Arc<LibraryContext> {
        &self.ctx
    }

    /// Receiver that flips to `true` once a stop has been requested
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub fn request_stop(&self) {
        tracing::info!("Stop requested by remote caller");
        self.shutdown.send_replace(true);
    }

    pub fn is_stopping(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Every keyword name, `stop_remote_server` included
    pub fn list_operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registry
            .names()
            .into_iter()
            .map(str::to_string)
            .collect();
        names.push(STOP_KEYWORD.to_string());
        names
    }

    pub fn describe(&self, name: &str) -> Result<String, CallError> {
        match name {
            "__intro__" => return Ok(LIBRARY_INTRO.to_string()),
            "__init__" => return Ok(LIBRARY_INIT.to_string()),
            _ => {}
        }
        if is_stop(name) {
            return Ok(STOP_DOCUMENTATION.to_string());
        }
        Ok(self.registry.get(name)?.documentation.to_string())
    }

    pub fn parameters(&self, name: &str) -> Result<Vec<String>, CallError> {
        if is_stop(name) {
            return Ok(Vec::new());
        }
        Ok(self.registry.get(name)?.arguments())
    }

    /// Run a keyword and translate its outcome into a remote result
    pub async fn invoke(
        &self,
        name: &str,
        args: &[Value],
        kwargs: Option<&Map<String, Value>>,
    ) -> RemoteResult {
        if is_stop(name) {
            self.request_stop();
            return RemoteResult::pass(Value::String(String::new()), String::new());
        }

        let output = Output::new();
        let descriptor = match self.registry.get(name) {
            Ok(descriptor) => descriptor,
            Err(e) => return call_failure(&e, &output),
        };
        let bound = match descriptor.bind(args, kwargs) {
            Ok(bound) => bound,
            Err(e) => return call_failure(&e, &output),
        };

        tracing::debug!("Running keyword {} with {:?}", descriptor.name, args);
        let handler = descriptor.handler();
        let ctx = Arc::clone(&self.ctx);
        let scoped = output.clone();
        let task = tokio::spawn(async move { scoped.scope(handler(&ctx, bound)).await });

        match task.await {
            Ok(Ok(value)) => RemoteResult::pass(return_value(value), output.text()),
            Ok(Err(e)) => {
                tracing::warn!("Keyword {} failed: {}", descriptor.name, e);
                RemoteResult::fail(
                    e.kind(),
                    e.to_string(),
                    traceback(&e),
                    output.text(),
                    e.is_client_error(),
                )
            }
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    "keyword task was cancelled".to_string()
                };
                tracing::error!("Keyword {} aborted: {}", descriptor.name, message);
                RemoteResult::fail(
                    "PanicError",
                    format!("Keyword '{}' panicked: {}", descriptor.name, message),
                    message,
                    output.text(),
                    false,
                )
            }
        }
    }

    /// Answer one request of the remote protocol
    pub async fn handle(&self, request: RemoteRequest) -> RemoteResponse {
        match request {
            RemoteRequest::GetKeywordNames => RemoteResponse::KeywordNames {
                names: self.list_operations(),
            },
            RemoteRequest::GetKeywordDocumentation { name } => match self.describe(&name) {
                Ok(documentation) => RemoteResponse::Documentation { documentation },
                Err(e) => RemoteResponse::Error {
                    message: e.to_string(),
                },
            },
            RemoteRequest::GetKeywordArguments { name } => match self.parameters(&name) {
                Ok(arguments) => RemoteResponse::Arguments { arguments },
                Err(e) => RemoteResponse::Error {
                    message: e.to_string(),
                },
            },
            RemoteRequest::RunKeyword { name, args, kwargs } => RemoteResponse::KeywordResult(
                self.invoke(&name, &args, kwargs.as_ref()).await,
            ),
            RemoteRequest::StopRemoteServer => {
                self.request_stop();
                RemoteResponse::Stopping
            }
        }
    }
}

fn is_stop(name: &str) -> bool {
    normalize(name) == normalize(STOP_KEYWORD)
}

/// `None` travels as an empty string, as remote test frameworks expect
fn return_value(value: Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        other => other,
    }
}

fn call_failure(error: &CallError, output: &Output) -> RemoteResult {
    tracing::warn!("Rejected call: {}", error);
    RemoteResult::fail(
        error.kind(),
        error.to_string(),
        String::new(),
        output.text(),
        true,
    )
}

/// The error followed by its chain of causes, one per line
fn traceback(error: &(dyn std::error::Error + 'static)) -> String {
    let mut lines = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("Caused by: {}", cause));
        source = cause.source();
    }
    lines.join("\n")
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
