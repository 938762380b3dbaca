//! Screen engine capability for sikuli-remote
//!
//! The keyword server never recognizes images itself. Everything that
//! touches the real screen goes through [`ScreenEngine`]: locating a target
//! inside a region, performing input actions, capturing pixels and reading
//! text. This crate provides the trait plus three implementations:
//!
//! - [`IpcEngine`] forwards every call to an engine process over a socket
//! - [`EngineHost`] is the other end of that socket, for engine processes to embed
//! - [`VirtualScreen`] is an in-memory screen for dry runs and tests

use async_trait::async_trait;
use sikuli_remote_protocol::{Action, EngineSetting, MatchInfo, ProtocolError, Rect, ScreenInfo, Target};
use thiserror::Error;

#[cfg(unix)]
mod host;
#[cfg(unix)]
mod ipc;
mod virtual_screen;

#[cfg(unix)]
pub use host::EngineHost;
#[cfg(unix)]
pub use ipc::IpcEngine;
pub use virtual_screen::{Placement, VirtualScreen};

/// Errors reported by a screen engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached at all
    #[error("Screen engine unavailable: {0}")]
    Unavailable(String),

    /// The engine was reached but failed to carry out the request
    #[error("Screen engine failure: {0}")]
    Backend(String),

    /// The engine answered with something other than what was asked for
    #[error("Unexpected engine response to {0}")]
    UnexpectedResponse(&'static str),

    /// Transport error while talking to an out-of-process engine
    #[error("Engine IPC error: {0}")]
    Ipc(#[from] ProtocolError),
}

impl EngineError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// The opaque screen capability the keyword library is built on
#[async_trait]
pub trait ScreenEngine: Send + Sync {
    /// All monitors, ordered by id
    async fn screens(&self) -> Result<Vec<ScreenInfo>, EngineError>;

    /// One search cycle for `target` inside `region`; never waits
    async fn locate(&self, target: &Target, region: Rect) -> Result<Option<MatchInfo>, EngineError>;

    /// Every occurrence of `target` inside `region`
    async fn locate_all(&self, target: &Target, region: Rect) -> Result<Vec<MatchInfo>, EngineError>;

    /// Capture `region` as PNG bytes
    async fn capture(&self, region: Rect) -> Result<Vec<u8>, EngineError>;

    /// OCR the text inside `region`
    async fn read_text(&self, region: Rect) -> Result<String, EngineError>;

    /// Perform an input or application action, returning the engine's result code.
    /// A code of zero means the action itself failed.
    async fn perform(&self, action: &Action) -> Result<i32, EngineError>;

    /// Draw a highlight around `region`; `None` keeps it until cleared
    async fn highlight(&self, region: Rect, seconds: Option<f64>) -> Result<(), EngineError>;

    /// Remove an indefinite highlight previously drawn around `region`
    async fn clear_highlight(&self, region: Rect) -> Result<(), EngineError>;

    /// Let the user select a region interactively
    async fn select_region(&self, message: &str) -> Result<Option<Rect>, EngineError>;

    /// Apply an engine-side setting; returns whether the engine accepted it
    async fn configure(&self, setting: &EngineSetting) -> Result<bool, EngineError>;
}
