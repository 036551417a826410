mod config;
mod role;
mod session;
mod viewer;

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::role::Role;
use crate::session::{Session, SessionOutcome};

/// Discover a peer on the local network and beam one file over TCP.
#[derive(Parser)]
#[command(name = "lanbeam")]
struct Cli {
    /// Role to assume; prompts on stdin when omitted.
    #[arg(long, value_enum)]
    role: Option<Role>,

    /// File to send (sender role).
    #[arg(long)]
    file: Option<PathBuf>,

    /// Directory to save received files into; overrides LANBEAM_DEST_DIR.
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Transfer port; overrides LANBEAM_PORT.
    #[arg(long)]
    port: Option<u16>,

    /// Discovery wait in seconds; overrides LANBEAM_FIND_TIMEOUT_SECS.
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lanbeam=info,lanbeam_discovery=info,lanbeam_transfer=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    std::process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e:#}");
            return 1;
        }
    };

    let role_rx = role::role_input(cli.role);
    let mut session = Session::new(config);

    // One role decision per session; an interrupt while undecided still runs
    // the same cleanup path.
    let role = tokio::select! {
        decided = role_rx => match decided {
            Ok(role) => role,
            Err(_) => {
                info!("role input ended without a decision");
                session.shutdown();
                return 1;
            }
        },
        _ = shutdown_signal() => {
            session.shutdown();
            return 130;
        }
    };

    let result = tokio::select! {
        result = session.run(role, cli.file.as_deref()) => Some(result),
        _ = shutdown_signal() => None,
    };

    match result {
        None => {
            warn!("interrupted; releasing session resources");
            session.shutdown();
            130
        }
        Some(Ok(outcome)) => {
            match outcome {
                SessionOutcome::Sent { bytes, peer } => {
                    info!(bytes, %peer, "transfer complete");
                }
                SessionOutcome::Received { path } => {
                    info!(saved = %path.display(), "transfer complete");
                    viewer::open_saved(&path);
                }
                SessionOutcome::NotFound => {
                    info!("no sender found on the local network");
                }
            }
            0
        }
        Some(Err(e)) => {
            error!("session failed: {e:#}");
            session.shutdown();
            1
        }
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(dest) = &cli.dest {
        config.dest_dir = dest.clone();
    }
    if let Some(secs) = cli.timeout {
        config.find_timeout = std::time::Duration::from_secs(secs);
    }
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("received Ctrl+C, shutting down"),
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received Ctrl+C, shutting down");
    }
}
