// Health endpoint served next to the MCP HTTP transport

use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::tools::ToolRegistry;

pub type AppState = Arc<ToolRegistry>;

pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub tools: Vec<String>,
    pub timestamp: String,
}

async fn health_check(State(state): State<AppState>) -> Result<Json<HealthStatus>, StatusCode> {
    Ok(Json(HealthStatus {
        status: "healthy",
        tools: state.list().into_iter().map(|d| d.name.clone()).collect(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
