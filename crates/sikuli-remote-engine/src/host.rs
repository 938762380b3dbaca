//! IPC server that exposes a screen engine to the keyword server
//!
//! An engine process wraps its implementation of [`ScreenEngine`] in an
//! `EngineHost`, which answers the requests sent by [`crate::IpcEngine`]:
//! - Monitor enumeration and region capture
//! - Image/text location
//! - Input and application actions
//! - Highlights, interactive selection and settings

use crate::ScreenEngine;
use base64::Engine;
use sikuli_remote_protocol::{EngineRequest, EngineResponse, ProtocolError, read_frame, write_frame};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};

/// IPC server that serves one [`ScreenEngine`]
pub struct EngineHost {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl EngineHost {
    /// Bind the engine socket, replacing a stale socket file if present
    pub fn bind(socket_path: impl AsRef<Path>) -> Result<Self, ProtocolError> {
        let socket_path = socket_path.as_ref().to_path_buf();

        if socket_path.exists() {
            std::fs::remove_file(&socket_path)?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&socket_path)?;
        tracing::info!("Engine host listening on {:?}", socket_path);
        Ok(Self {
            listener,
            socket_path,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accept connections forever, one task per connection
    pub async fn serve(self, engine: Arc<dyn ScreenEngine>) -> Result<(), ProtocolError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    let engine = engine.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, engine).await {
                            match e {
                                ProtocolError::ConnectionClosed => {
                                    tracing::debug!("Engine client disconnected");
                                }
                                _ => {
                                    tracing::error!("Engine connection error: {}", e);
                                }
                            }
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                }
            }
        }
    }

    /// Handle a single connection
    async fn handle_connection(
        stream: UnixStream,
        engine: Arc<dyn ScreenEngine>,
    ) -> Result<(), ProtocolError> {
        let (mut reader, mut writer) = stream.into_split();

        loop {
            let request: EngineRequest = read_frame(&mut reader).await?;
            tracing::debug!("Received engine request: {:?}", request);

            let response = Self::handle_request(request, engine.as_ref()).await;
            write_frame(&mut writer, &response).await?;
        }
    }

    /// Handle a single request
    async fn handle_request(request: EngineRequest, engine: &dyn ScreenEngine) -> EngineResponse {
        let result = match request {
            EngineRequest::Ping => Ok(EngineResponse::Pong),

            EngineRequest::Screens => engine
                .screens()
                .await
                .map(|screens| EngineResponse::Screens { screens }),

            EngineRequest::Locate { target, region } => engine
                .locate(&target, region)
                .await
                .map(|found| EngineResponse::Match { found }),

            EngineRequest::LocateAll { target, region } => engine
                .locate_all(&target, region)
                .await
                .map(|matches| EngineResponse::Matches { matches }),

            EngineRequest::Capture { region } => {
                engine
                    .capture(region)
                    .await
                    .map(|data| EngineResponse::Image {
                        data: base64::engine::general_purpose::STANDARD.encode(&data),
                        format: "png".to_string(),
                    })
            }

            EngineRequest::ReadText { region } => engine
                .read_text(region)
                .await
                .map(|text| EngineResponse::Text { text }),

            EngineRequest::Perform { action } => engine
                .perform(&action)
                .await
                .map(|code| EngineResponse::Performed { code }),

            EngineRequest::Highlight { region, seconds } => engine
                .highlight(region, seconds)
                .await
                .map(|()| EngineResponse::Success),

            EngineRequest::ClearHighlight { region } => engine
                .clear_highlight(region)
                .await
                .map(|()| EngineResponse::Success),

            EngineRequest::SelectRegion { message } => engine
                .select_region(&message)
                .await
                .map(|region| EngineResponse::Region { region }),

            EngineRequest::Configure { setting } => engine
                .configure(&setting)
                .await
                .map(|accepted| EngineResponse::Configured { accepted }),
        };

        result.unwrap_or_else(|e| EngineResponse::Error {
            message: e.to_string(),
        })
    }
}
