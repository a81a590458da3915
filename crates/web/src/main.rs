use std::sync::Arc;

use chess_coach_core::{init_tracing, CoachConfig};
use chess_coach_web::{build_router, AppState};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match CoachConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if !config.assistant_configured() {
        info!("MISTRAL_API_KEY not set, chat needs a user-supplied key");
    }

    let addr = config.bind_address();
    let state = Arc::new(AppState::new(config));
    let app = build_router(state.clone());

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Cannot bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Chess coach running at http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    info!("Shutting down, stopping engine");
    state.evaluator.lock().await.stop().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
