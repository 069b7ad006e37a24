//! Parley CLI and REST API entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, initializes the session store and model backend,
//! then dispatches to the appropriate command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = parley_observe::tracing_setup::init_tracing(cli.log_filter(), cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    let result = run(cli, state).await;
    parley_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.config.host.clone());
            let port = port.unwrap_or(state.config.port);
            serve(state, &host, port).await?;
        }

        Commands::Chat { message, session } => {
            cli::chat::send_message(&state, &message, session.as_deref(), cli.json).await?;
        }

        Commands::New => {
            cli::session::new_session(&state, cli.json).await?;
        }

        Commands::Sessions => {
            cli::session::list_sessions(&state, cli.json).await?;
        }

        Commands::History { session_id } => {
            cli::session::show_history(&state, &session_id, cli.json).await?;
        }

        Commands::Pin { session_id } => {
            cli::session::toggle_pin(&state, &session_id, cli.json).await?;
        }

        Commands::Archive { session_id } => {
            cli::session::toggle_archive(&state, &session_id, cli.json).await?;
        }

        Commands::Delete { session_id, force } => {
            cli::session::delete_session(&state, &session_id, force, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Parley API listening on {} ({} store)",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan(),
        state.store_backend()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
