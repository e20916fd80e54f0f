// 🌐 Tool Server - REST API with Axum
// Exposes the remediation tools by name plus read-only transaction routes

use crate::record::TransactionRecord;
use crate::store::RecordStore;
use crate::tools::{Tool, ToolRegistry, ToolResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<RecordStore>,
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct ToolInfo {
    name: &'static str,
    description: &'static str,
}

/// Body of a tool invocation. Numeric ids are accepted as well as strings.
#[derive(Deserialize)]
pub struct ToolRequest {
    transaction_id: serde_json::Value,
}

impl ToolRequest {
    fn transaction_id(&self) -> Option<String> {
        match &self.transaction_id {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/tools - Tool names and descriptions
async fn list_tools() -> impl IntoResponse {
    let tools: Vec<ToolInfo> = Tool::ALL
        .iter()
        .map(|tool| ToolInfo {
            name: tool.name(),
            description: tool.description(),
        })
        .collect();

    Json(ApiResponse::ok(tools))
}

/// POST /api/tools/:name - Invoke a tool
async fn invoke_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<ToolRequest>,
) -> impl IntoResponse {
    let Some(transaction_id) = request.transaction_id() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<ToolResponse>::err("transaction_id must be a string or number")),
        )
            .into_response();
    };

    let registry = ToolRegistry::new(&state.store);
    match registry.invoke_by_name(&name, &transaction_id) {
        Ok(response) => (StatusCode::OK, Json(ApiResponse::ok(response))).into_response(),
        Err(e) => {
            warn!(tool = %name, "rejected tool call: {}", e);
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<ToolResponse>::err(e.to_string())),
            )
                .into_response()
        }
    }
}

/// GET /api/transactions - All failed transactions
async fn get_transactions(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.store.records().to_vec()))
}

/// GET /api/transactions/:id - One transaction
async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> impl IntoResponse {
    match state.store.lookup(&transaction_id) {
        Some(record) => (StatusCode::OK, Json(ApiResponse::ok(record.clone()))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<TransactionRecord>::err(crate::remediation::NOT_FOUND)),
        )
            .into_response(),
    }
}

/// Build the application router over a loaded store
pub fn router(store: Arc<RecordStore>) -> Router {
    let state = AppState { store };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/tools", get(list_tools))
        .route("/tools/:name", post(invoke_tool))
        .route("/transactions", get(get_transactions))
        .route("/transactions/:id", get(get_transaction))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the process is stopped
pub async fn serve(store: Arc<RecordStore>, bind_address: &str) -> anyhow::Result<()> {
    use anyhow::Context;

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;

    info!(address = bind_address, "tool server listening");
    axum::serve(listener, router(store))
        .await
        .context("Tool server stopped unexpectedly")?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
