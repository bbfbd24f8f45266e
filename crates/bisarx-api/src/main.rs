//! Bisarx REST API entry point.
//!
//! Binary name: `bisarx`
//!
//! Parses CLI arguments, loads configuration, initializes database and
//! services, then starts the REST API server or runs an admin command.

mod cli;
mod http;
mod state;

use std::net::SocketAddr;

use clap::Parser;

use bisarx_infra::config::{database_url, load_server_config, resolve_data_dir};
use bisarx_infra::sqlite::pool::DatabasePool;
use cli::{Cli, Commands, UserAction};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    bisarx_observe::tracing_setup::init_tracing(cli::log_filter(cli.quiet, cli.verbose), cli.otel)
        .map_err(|e| anyhow::anyhow!(e))?;

    let result = run(cli).await;
    bisarx_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir();
    let config = load_server_config(&data_dir).await;

    match cli.command {
        Commands::Migrate => {
            tokio::fs::create_dir_all(&data_dir).await?;
            let pool = DatabasePool::new(&database_url(&config, &data_dir)).await?;
            pool.close().await;
            tracing::info!(data_dir = %data_dir.display(), "Migrations applied");
        }

        Commands::User { action } => {
            let state = AppState::init(&data_dir, &config).await?;
            let (email, active) = match action {
                UserAction::Activate { email } => (email, true),
                UserAction::Deactivate { email } => (email, false),
            };
            let result = state.auth_service.set_active(&email, active).await;
            state.db_pool.close().await;
            let user = result?;
            println!(
                "{} {}",
                user.email,
                if user.is_active { "activated" } else { "deactivated" }
            );
        }

        Commands::Serve { port, host } => {
            let state = AppState::init(&data_dir, &config).await?;
            let db_pool = state.db_pool.clone();

            let host = host.unwrap_or_else(|| config.host.clone());
            let port = port.unwrap_or(config.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!(addr = %addr, data_dir = %data_dir.display(), "Bisarx API listening");

            let router = http::router::build_router(state);

            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await?;

            db_pool.close().await;
            tracing::info!("Server stopped");
        }
    }

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
