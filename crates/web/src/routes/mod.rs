pub mod analysis;
pub mod chat;
pub mod pgn;

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::AppState;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub engine_path: String,
    pub assistant_configured: bool,
}

pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let template = IndexTemplate {
        title: "Chess Coach".to_string(),
        engine_path: state.config.engine_path.clone(),
        assistant_configured: state.config.assistant_configured(),
    };
    askama_axum::into_response(&template)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "timestamp": Utc::now().to_rfc3339() }))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route(
            "/api/upload-pgn",
            post(pgn::upload_pgn).layer(DefaultBodyLimit::max(pgn::MAX_UPLOAD_BYTES)),
        )
        .route("/api/parse-pgn", post(pgn::parse_pgn_text))
        .route("/api/validate-pgn", post(pgn::validate_pgn_text))
        .route("/api/position-at-move", post(pgn::position_at))
        .route("/api/analyze-game", post(analysis::analyze_game))
        .route("/api/analyze-position", post(analysis::analyze_position))
        .route("/api/test-stockfish", get(analysis::test_engine))
        .route("/api/chat/ask", post(chat::ask))
        .route("/api/test-api-key", post(chat::test_api_key))
        .route("/api/chat/status", get(chat::status))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
