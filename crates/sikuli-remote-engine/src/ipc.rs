//! IPC client for out-of-process screen engines

use crate::{EngineError, ScreenEngine};
use async_trait::async_trait;
use base64::Engine;
use sikuli_remote_protocol::{
    Action, EngineRequest, EngineResponse, EngineSetting, MatchInfo, Rect,
    ScreenInfo, Target, default_engine_socket_path, read_frame, write_frame,
};
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;

/// Forwards every [`ScreenEngine`] call to an engine process
pub struct IpcEngine {
    socket_path: PathBuf,
}

impl IpcEngine {
    /// Create a new IPC engine with the default socket path
    pub fn new() -> Self {
        Self::with_socket_path(default_engine_socket_path())
    }

    /// Create a new IPC engine with a custom socket path
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Check if the engine socket exists
    pub fn is_socket_available(&self) -> bool {
        self.socket_path.exists()
    }

    /// Ping the engine process
    pub async fn ping(&self) -> Result<bool, EngineError> {
        match self.send_request(&EngineRequest::Ping).await? {
            EngineResponse::Pong => Ok(true),
            EngineResponse::Error { message } => {
                tracing::error!("Ping error: {}", message);
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    /// Connect to the engine and send a request
    async fn send_request(&self, request: &EngineRequest) -> Result<EngineResponse, EngineError> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            EngineError::Unavailable(format!("{}: {}", self.socket_path.display(), e))
        })?;
        let (mut reader, mut writer) = stream.into_split();

        write_frame(&mut writer, request).await?;
        let response: EngineResponse = read_frame(&mut reader).await?;

        match response {
            EngineResponse::Error { message } => Err(EngineError::Backend(message)),
            other => Ok(other),
        }
    }
}

impl Default for IpcEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScreenEngine for IpcEngine {
    async fn screens(&self) -> Result<Vec<ScreenInfo>, EngineError> {
        match self.send_request(&EngineRequest::Screens).await? {
            EngineResponse::Screens { screens } => Ok(screens),
            _ => Err(EngineError::UnexpectedResponse("Screens")),
        }
    }

    async fn locate(&self, target: &Target, region: Rect) -> Result<Option<MatchInfo>, EngineError> {
        let request = EngineRequest::Locate {
            target: target.clone(),
            region,
        };
        match self.send_request(&request).await? {
            EngineResponse::Match { found } => Ok(found),
            _ => Err(EngineError::UnexpectedResponse("Locate")),
        }
    }

    async fn locate_all(&self, target: &Target, region: Rect) -> Result<Vec<MatchInfo>, EngineError> {
        let request = EngineRequest::LocateAll {
            target: target.clone(),
            region,
        };
        match self.send_request(&request).await? {
            EngineResponse::Matches { matches } => Ok(matches),
            _ => Err(EngineError::UnexpectedResponse("LocateAll")),
        }
    }

    async fn capture(&self, region: Rect) -> Result<Vec<u8>, EngineError> {
        match self.send_request(&EngineRequest::Capture { region }).await? {
            EngineResponse::Image { data, .. } => base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| EngineError::backend(format!("Failed to decode image: {}", e))),
            _ => Err(EngineError::UnexpectedResponse("Capture")),
        }
    }

    async fn read_text(&self, region: Rect) -> Result<String, EngineError> {
        match self.send_request(&EngineRequest::ReadText { region }).await? {
            EngineResponse::Text { text } => Ok(text),
            _ => Err(EngineError::UnexpectedResponse("ReadText")),
        }
    }

    async fn perform(&self, action: &Action) -> Result<i32, EngineError> {
        let request = EngineRequest::Perform {
            action: action.clone(),
        };
        match self.send_request(&request).await? {
            EngineResponse::Performed { code } => Ok(code),
            _ => Err(EngineError::UnexpectedResponse("Perform")),
        }
    }

    async fn highlight(&self, region: Rect, seconds: Option<f64>) -> Result<(), EngineError> {
        match self
            .send_request(&EngineRequest::Highlight { region, seconds })
            .await?
        {
            EngineResponse::Success => Ok(()),
            _ => Err(EngineError::UnexpectedResponse("Highlight")),
        }
    }

    async fn clear_highlight(&self, region: Rect) -> Result<(), EngineError> {
        match self
            .send_request(&EngineRequest::ClearHighlight { region })
            .await?
        {
            EngineResponse::Success => Ok(()),
            _ => Err(EngineError::UnexpectedResponse("ClearHighlight")),
        }
    }

    async fn select_region(&self, message: &str) -> Result<Option<Rect>, EngineError> {
        let request = EngineRequest::SelectRegion {
            message: message.to_string(),
        };
        match self.send_request(&request).await? {
            EngineResponse::Region { region } => Ok(region),
            _ => Err(EngineError::UnexpectedResponse("SelectRegion")),
        }
    }

    async fn configure(&self, setting: &EngineSetting) -> Result<bool, EngineError> {
        let request = EngineRequest::Configure {
            setting: setting.clone(),
        };
        match self.send_request(&request).await? {
            EngineResponse::Configured { accepted } => Ok(accepted),
            _ => Err(EngineError::UnexpectedResponse("Configure")),
        }
    }
}

