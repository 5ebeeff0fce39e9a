// aicommit-mcp-server/src/main.rs
mod server;
mod shutdown;

use aicommit_core::{CommandRunner, Installer, ProcessRunner, ServerConfig, ToolRegistry};
use anyhow::{Context, Result};
use clap::Parser;
use rmcp::{service::*, transport::io};
use std::io as std_io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::server::AicommitServer;
use crate::shutdown::ShutdownHooks;

#[derive(Parser, Debug)]
#[command(author, version, about = "MCP server exposing the aicommit CLI as tools")]
struct Cli {
    /// Path or name of the aicommit executable.
    #[arg(long, env = "AICOMMIT_BIN", default_value = aicommit_core::config::DEFAULT_AICOMMIT_BIN)]
    aicommit_bin: String,

    /// Path or name of the git executable.
    #[arg(long, default_value = aicommit_core::config::DEFAULT_GIT_BIN)]
    git_bin: String,

    /// Repository to run commands in (defaults to the current directory).
    #[arg(long)]
    repo: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv). Ignored when RUST_LOG is set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// stdout carries the protocol, so logs only ever go to stderr.
fn init_logging(verbosity: u8) -> Result<()> {
    let default_level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let stderr_layer = fmt::layer()
        .with_writer(std_io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize logging")
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

// Informational only; tool calls do their own check.
fn spawn_startup_check(installer: Installer) {
    tokio::spawn(async move {
        match installer.detect_version().await {
            Some(version) => info!(%version, "Found aicommit"),
            None => warn!(
                "aicommit CLI is not installed. Some tools will not work until it is: \
                 npm install -g @suenot/aicommit or cargo install aicommit"
            ),
        }
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    let config = ServerConfig::from_env()
        .with_aicommit_bin(&cli.aicommit_bin)
        .with_git_bin(&cli.git_bin);

    let mut process_runner = ProcessRunner::new().with_timeout(config.timeout);
    if let Some(repo) = &cli.repo {
        process_runner = process_runner.with_working_dir(repo);
    }
    let runner: Arc<dyn CommandRunner> = Arc::new(process_runner);

    spawn_startup_check(Installer::new(&config.aicommit_bin, false, runner.clone()));

    let aicommit_server = AicommitServer::new(ToolRegistry::new(&config, runner));
    let ct = CancellationToken::new();

    info!("Starting aicommit MCP server...");
    let running = match aicommit_server.serve_with_ct(io::stdio(), ct.clone()).await {
        Ok(running) => running,
        Err(e) => {
            error!(error = %e, "Failed to start MCP server");
            return ExitCode::FAILURE;
        }
    };

    let mut hooks = ShutdownHooks::new();
    hooks.register("log stop", || info!("aicommit MCP server stopped."));

    tokio::select! {
        quit = running.waiting() => {
            match quit {
                Ok(reason) => info!(?reason, "Client closed the connection"),
                Err(e) => warn!(error = %e, "Server task ended abnormally"),
            }
        }
        _ = shutdown_signal() => {}
    }

    server::stop(&ct, hooks);
    ExitCode::SUCCESS
}
