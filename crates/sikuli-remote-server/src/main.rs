//! Remote keyword server for visual UI automation
//!
//! Serves the keyword library over TCP for remote test runners, or over MCP
//! stdio for agent tooling. Both surfaces share one dispatcher and one
//! library context.

mod capture;
mod coerce;
mod constants;
mod context;
mod dispatch;
mod errors;
mod guide;
mod highlight;
mod keywords;
mod locator;
mod mcp;
mod region;
mod registry;
mod report;
mod server;
mod wait;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use constants::{VIRTUAL_SCREEN_HEIGHT, VIRTUAL_SCREEN_WIDTH};
use context::LibraryContext;
use dispatch::RemoteDispatchServer;
use rmcp::{ServiceExt, transport::stdio};
use sikuli_remote_engine::{ScreenEngine, VirtualScreen};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sikuli-remote-server")]
#[command(about = "Remote keyword server for visual UI automation")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EngineArgs {
    /// Socket of the screen engine process
    #[arg(long, global = true, value_name = "PATH")]
    engine_socket: Option<PathBuf>,

    /// Run against an in-memory screen instead of an engine process
    #[arg(
        long,
        global = true,
        value_name = "WIDTHxHEIGHT",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "default",
        value_parser = parse_screen_size,
    )]
    virtual_screen: Option<(i32, i32)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve keywords to remote callers over TCP
    Serve {
        /// Port to listen on
        port: u16,
        /// Base folder for captures (default: working directory)
        capture_folder: Option<PathBuf>,
    },
    /// Serve keywords as MCP tools over stdio
    Mcp {
        /// Base folder for captures (default: working directory)
        capture_folder: Option<PathBuf>,
    },
    /// Show setup guide
    Guide,
}

fn parse_screen_size(value: &str) -> Result<(i32, i32), String> {
    if value == "default" {
        return Ok((VIRTUAL_SCREEN_WIDTH, VIRTUAL_SCREEN_HEIGHT));
    }
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let w: i32 = w.trim().parse().map_err(|e| format!("bad width: {}", e))?;
    let h: i32 = h.trim().parse().map_err(|e| format!("bad height: {}", e))?;
    if w <= 0 || h <= 0 {
        return Err(format!("screen size must be positive, got {}x{}", w, h));
    }
    Ok((w, h))
}

#[cfg(unix)]
fn engine_process(socket: Option<PathBuf>) -> Result<Arc<dyn ScreenEngine>> {
    use sikuli_remote_engine::IpcEngine;

    let engine = match socket {
        Some(path) => IpcEngine::with_socket_path(path),
        None => IpcEngine::new(),
    };
    tracing::info!("Using screen engine at {:?}", engine.socket_path());
    Ok(Arc::new(engine))
}

#[cfg(not(unix))]
fn engine_process(_socket: Option<PathBuf>) -> Result<Arc<dyn ScreenEngine>> {
    anyhow::bail!("engine processes are only reachable over Unix sockets; use --virtual-screen")
}

fn select_engine(args: EngineArgs) -> Result<Arc<dyn ScreenEngine>> {
    match args.virtual_screen {
        Some((width, height)) => {
            tracing::info!("Using virtual screen of {}x{}", width, height);
            Ok(Arc::new(VirtualScreen::with_size(width, height)))
        }
        None => engine_process(args.engine_socket),
    }
}

async fn dispatcher(
    engine: Arc<dyn ScreenEngine>,
    capture_folder: Option<PathBuf>,
) -> Result<Arc<RemoteDispatchServer>> {
    let capture_base = match capture_folder {
        Some(folder) => folder,
        None => std::env::current_dir().context("cannot determine the working directory")?,
    };
    let ctx = LibraryContext::new(engine, capture_base)
        .await
        .context("screen engine is not reachable")?;
    let registry = keywords::registry();
    tracing::info!("Registered {} keywords", registry.len());
    Ok(Arc::new(RemoteDispatchServer::new(registry, Arc::new(ctx))))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Guide = cli.command {
        guide::print_guide();
        return Ok(());
    }

    // Logs go to stderr: stdout carries report lines or the MCP transport
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let engine = select_engine(cli.engine)?;

    match cli.command {
        Commands::Serve {
            port,
            capture_folder,
        } => {
            let dispatch = dispatcher(engine, capture_folder).await?;
            report::set_echo_stdout(true);
            let server = server::RemoteServer::bind(("0.0.0.0", port), dispatch)
                .await
                .with_context(|| format!("cannot listen on port {}", port))?;
            server.run().await;
        }
        Commands::Mcp { capture_folder } => {
            let dispatch = dispatcher(engine, capture_folder).await?;
            tracing::info!("Starting MCP server...");
            let service = mcp::KeywordMcpServer::new(dispatch).serve(stdio()).await?;
            service.waiting().await?;
        }
        Commands::Guide => {}
    }

    Ok(())
}
