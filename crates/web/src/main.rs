use std::sync::Arc;

use chess_tutor_core::{Orchestrator, TutorConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod error;
mod routes;

pub struct AppState {
    pub orchestrator: Orchestrator,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match TutorConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(&config),
    });

    // Validation keeps working without an engine
    if let Err(e) = state.orchestrator.warm_up().await {
        warn!(error = %e, "analysis engine not available at startup");
    }

    let app = routes::router(Arc::clone(&state), &config.server);

    let listener = match tokio::net::TcpListener::bind(&config.server.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(bind = %config.server.bind, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!("Server running at http://{}", config.server.bind);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "server error");
    }

    state.orchestrator.shutdown().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
