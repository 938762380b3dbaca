//! TCP server for remote keyword callers
//!
//! Each connection carries length-prefixed JSON frames: one `RemoteRequest`
//! in, one `RemoteResponse` out. Calls on a connection run one after the
//! other; separate connections run concurrently against the shared context.

use crate::dispatch::RemoteDispatchServer;
use sikuli_remote_protocol::{ProtocolError, RemoteRequest, read_frame, write_frame};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Listener bound to a port, ready to serve remote calls
pub struct RemoteServer {
    listener: TcpListener,
    dispatch: Arc<RemoteDispatchServer>,
}

impl RemoteServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        dispatch: Arc<RemoteDispatchServer>,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, dispatch })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until a stop is requested, then wait for open
    /// connections to finish their current call
    pub async fn run(self) {
        let Self { listener, dispatch } = self;
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Remote server listening on {}", addr);
        }

        let mut shutdown = dispatch.shutdown_signal();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!("Accepted connection from {}", peer);
                        let dispatch = Arc::clone(&dispatch);
                        connections.spawn(async move {
                            if let Err(e) = Self::handle_connection(stream, dispatch).await {
                                match e {
                                    ProtocolError::ConnectionClosed => {
                                        tracing::debug!("Client {} disconnected", peer);
                                    }
                                    _ => {
                                        tracing::error!("Connection error from {}: {}", peer, e);
                                    }
                                }
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!("Accept error: {}", e);
                    }
                },
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        tracing::error!("Connection task failed: {}", e);
                    }
                }
                _ = stop_requested(&mut shutdown) => break,
            }
        }

        drop(listener);
        tracing::info!("Remote server stopped accepting connections");
        while let Some(finished) = connections.join_next().await {
            if let Err(e) = finished {
                tracing::error!("Connection task failed: {}", e);
            }
        }
    }

    /// Serve one connection until the peer leaves or the server stops
    async fn handle_connection(
        stream: TcpStream,
        dispatch: Arc<RemoteDispatchServer>,
    ) -> Result<(), ProtocolError> {
        let mut shutdown = dispatch.shutdown_signal();
        let (mut reader, mut writer) = stream.into_split();

        loop {
            let request: RemoteRequest = tokio::select! {
                request = read_frame(&mut reader) => request?,
                _ = stop_requested(&mut shutdown) => return Ok(()),
            };
            tracing::debug!("Received request: {:?}", request);

            let response = dispatch.handle(request).await;
            write_frame(&mut writer, &response).await?;
            if dispatch.is_stopping() {
                return Ok(());
            }
        }
    }
}

async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender means the dispatcher is gone; treat it as a stop.
    let _ = shutdown.wait_for(|stopping| *stopping).await;
}
