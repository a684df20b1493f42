//! API routes for the reflection server

pub mod reflect;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/reflect", post(reflect::reflect))
        .route("/reflect/pdf", post(reflect::reflect_pdf))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "reflect-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Self-reflective RAG: retrieve, draft, critique and refine",
        "max_rounds": crate::pipeline::MAX_ROUNDS,
        "modes": ["dev", "recruiter"],
        "endpoints": {
            "GET /health": "Service reachability",
            "POST /api/reflect": "Run the reflection loop; returns markdown and the full result",
            "POST /api/reflect/pdf": "Run in recruiter mode and download the review PDF"
        }
    }))
}
