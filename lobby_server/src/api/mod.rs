//! HTTP/WebSocket API for the poker lobby.
//!
//! # Endpoints Overview
//!
//! ## Public
//! - `GET /health` - Storage health and version
//! - `GET /api/v1/tables?limit&offset` - List open tables
//! - `GET /api/v1/tables/{id}` - Table with its seats
//! - `GET /ws?token=<jwt>` - Realtime room connection
//!
//! ## Bearer token required
//! - `POST /api/v1/tables` - Create a table
//! - `POST /api/v1/tables/{id}/join` - Buy in and take a seat
//! - `POST /api/v1/tables/{id}/leave` - Release the seat and cash out
//! - `GET /api/v1/wallet`, `POST /api/v1/wallet` - Wallet view, idempotent open
//! - `GET /api/v1/wallet/transactions?limit` - Audit history, newest first
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use lobby_server::api::{AppState, create_router};
//! use poker_lobby::{Lobby, LobbyConfig, auth::TokenVerifier};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState {
//!     lobby: Lobby::in_memory(LobbyConfig::default()),
//!     verifier: Arc::new(TokenVerifier::new("a_shared_secret_of_at_least_32_chars!")),
//!     db: None,
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! CORS is configured permissively for development.

pub mod middleware;
pub mod request_id;
pub mod tables;
pub mod wallet;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use poker_lobby::{
    ErrorKind, Lobby, auth::TokenVerifier, db::Database, table::TableError, wallet::WalletError,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub lobby: Lobby,
    pub verifier: Arc<TokenVerifier>,
    /// Present when running on PostgreSQL, used by the health check
    pub db: Option<Database>,
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

/// Handler error: status code plus JSON body
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Status code for an error class
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ConsistencyFault | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn api_error(kind: ErrorKind, error: String) -> ApiError {
    (status_for(kind), Json(ErrorResponse { error, kind }))
}

pub(crate) fn table_error(err: TableError) -> ApiError {
    if err.kind() == ErrorKind::Internal {
        tracing::error!("Table operation failed: {}", err);
    }
    api_error(err.kind(), err.client_message())
}

pub(crate) fn wallet_error(err: WalletError) -> ApiError {
    if err.kind() == ErrorKind::Internal {
        tracing::error!("Wallet operation failed: {}", err);
    }
    api_error(err.kind(), err.client_message())
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    // WebSocket route handles its own auth via query parameter
    let root_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/tables", get(tables::list_tables))
        .route("/tables/{table_id}", get(tables::get_table));

    let protected_routes = Router::new()
        .route("/tables", post(tables::create_table))
        .route("/tables/{table_id}/join", post(tables::join_table))
        .route("/tables/{table_id}/leave", post(tables::leave_table))
        .route("/wallet", get(wallet::get_wallet).post(wallet::open_wallet))
        .route("/wallet/transactions", get(wallet::list_transactions))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage answers, `503 Service Unavailable` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, storage_healthy) = match &state.db {
        Some(db) => ("postgres", db.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if storage_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": {
            "backend": storage,
            "healthy": storage_healthy,
        },
        "connections": state.lobby.rooms.connection_count().await,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use poker_lobby::seating::SeatError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::InsufficientFunds), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorKind::ConsistencyFault),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_table_error_body() {
        let (status, Json(body)) = table_error(TableError::Seat(SeatError::SeatTaken(3)));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.kind, ErrorKind::Conflict);
        assert!(body.error.contains('3'));
    }

    #[test]
    fn test_wallet_error_hides_player_id() {
        let (status, Json(body)) = wallet_error(WalletError::WalletNotFound(42));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.error.contains("42"));
    }
}
