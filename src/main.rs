//! `collapse` - headless driver for the phase and contention engine

use clap::Parser;

use collapse::cli::args::Cli;
use collapse::cli::commands::{self, Shutdown};
use collapse::error::ExitCode;
use collapse::observability::{StopReason, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    let shutdown = Shutdown::new();

    // First signal stops the run gracefully, a second one exits immediately
    let handler = shutdown.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
                tracing::warn!("failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                handler.trigger(StopReason::Interrupted);
                return;
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => handler.trigger(StopReason::Interrupted),
                _ = sigterm.recv() => handler.trigger(StopReason::Terminated),
            }

            eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");

            tokio::select! {
                _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
                _ = sigterm.recv() => std::process::exit(ExitCode::TERMINATED),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            handler.trigger(StopReason::Interrupted);
            eprintln!("\nShutting down gracefully... (press Ctrl+C again to force)");
            let _ = tokio::signal::ctrl_c().await;
            std::process::exit(ExitCode::INTERRUPTED);
        }
    });

    let result = commands::dispatch(cli, shutdown.clone()).await;

    match result {
        Ok(()) => {
            let code = match shutdown.reason() {
                Some(StopReason::Interrupted) => ExitCode::INTERRUPTED,
                Some(StopReason::Terminated) => ExitCode::TERMINATED,
                _ => ExitCode::SUCCESS,
            };
            std::process::exit(code)
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
