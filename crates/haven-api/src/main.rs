//! Haven CLI and REST API entry point.
//!
//! Binary name: `haven`
//!
//! Parses CLI arguments, initializes tracing, the database and services,
//! then dispatches to the command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use haven_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,haven=debug",
        _ => "trace",
    };
    let _ = init_tracing(&TracingOptions {
        default_filter: filter.to_string(),
        json: cli.log_json,
        enable_otel: cli.otel,
    });

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "haven", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = dispatch(cli, state.clone()).await;

    state.db_pool.close().await;
    shutdown_tracing();
    result
}

async fn dispatch(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::User { action } => cli::user::run(&state, action, cli.json).await?,

        Commands::Session { action } => cli::session::run(&state, action, cli.json).await?,

        Commands::Ask { as_profile, resume } => cli::ask::run(&state, &as_profile, resume).await?,

        Commands::Status => cli::status::status(&state, cli.json).await?,

        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.server.host.clone());
            let port = port.unwrap_or(state.config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Haven API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());
            tracing::info!(%addr, provider = state.assistant_service.provider_name(), "server started");

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
