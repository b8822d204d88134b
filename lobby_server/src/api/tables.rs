//! Table management API handlers.
//!
//! Listing and details are public; everything else requires a bearer token.
//!
//! # Examples
//!
//! List tables:
//! ```bash
//! curl 'http://localhost:6969/api/v1/tables?limit=10&offset=0'
//! ```
//!
//! Join a table:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/tables/<uuid>/join \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"seat_number": 3, "buy_in": 200}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
};
use poker_lobby::{
    auth::PlayerRef,
    seating::Seat,
    table::{Page, Table, TableConfig, TableDetails, TableError, TableId, TableSummary},
};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, request_id::RequestId, table_error, wallet_error};
use crate::metrics;

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinTableRequest {
    pub seat_number: u8,
    pub buy_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveTableResponse {
    pub table_id: TableId,
    /// Chips credited back to the wallet
    pub cashed_out: i64,
}

fn record_outcome<T>(operation: &'static str, result: &Result<T, TableError>) {
    let outcome = match result {
        Ok(_) => "ok".to_string(),
        Err(err) => err.kind().to_string(),
    };
    metrics::seating_operations_total(operation, &outcome);
}

/// List open tables, newest first.
///
/// `limit` defaults to `TABLE_LIST_DEFAULT_LIMIT` and is clamped to
/// `TABLE_LIST_MAX_LIMIT`; a negative `offset` counts as zero.
pub async fn list_tables(
    State(state): State<AppState>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<TableSummary>>, ApiError> {
    state
        .lobby
        .tables
        .list_tables(page)
        .await
        .map(Json)
        .map_err(table_error)
}

/// Table configuration, status and current seats.
///
/// # Errors
///
/// - `404 Not Found`: Table doesn't exist
pub async fn get_table(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
) -> Result<Json<TableDetails>, ApiError> {
    state
        .lobby
        .tables
        .get_table(table_id)
        .await
        .map(Json)
        .map_err(table_error)
}

/// Create a table owned by the caller.
///
/// Returns `201 Created` with the new table; lobby members receive a
/// `table-created` event.
///
/// # Errors
///
/// - `400 Bad Request`: Blank name, bad blinds or buy-in bounds, seat count
///   outside `1..=9`
pub async fn create_table(
    State(state): State<AppState>,
    Extension(player): Extension<PlayerRef>,
    Json(config): Json<TableConfig>,
) -> Result<(StatusCode, Json<Table>), ApiError> {
    let table = state
        .lobby
        .tables
        .create_table(&player, config)
        .await
        .map_err(table_error)?;

    Ok((StatusCode::CREATED, Json(table)))
}

/// Buy in and take a seat.
///
/// The caller's wallet is opened first if it does not exist yet. The buy-in
/// is debited before the seat is claimed; a lost claim is refunded.
///
/// # Errors
///
/// - `400 Bad Request`: Seat number or buy-in out of range
/// - `402 Payment Required`: Wallet balance below the buy-in
/// - `404 Not Found`: Table doesn't exist
/// - `409 Conflict`: Seat taken, already seated, table full or closed
/// - `500 Internal Server Error`: Storage failure, or a refund that could
///   not be made durable
pub async fn join_table(
    State(state): State<AppState>,
    Extension(player): Extension<PlayerRef>,
    Extension(request_id): Extension<RequestId>,
    Path(table_id): Path<TableId>,
    Json(request): Json<JoinTableRequest>,
) -> Result<Json<Seat>, ApiError> {
    state
        .lobby
        .wallets
        .open_wallet(player.id)
        .await
        .map_err(wallet_error)?;

    let result = state
        .lobby
        .tables
        .join_table(&player, table_id, request.seat_number, request.buy_in)
        .await;
    record_outcome("join", &result);

    if let Err(err) = &result {
        tracing::info!(
            request_id = %request_id.as_str(),
            player_id = player.id,
            %table_id,
            "Join rejected: {}",
            err
        );
    }

    result.map(Json).map_err(table_error)
}

/// Release the caller's seat and credit the remaining stack.
///
/// # Errors
///
/// - `404 Not Found`: Not seated at this table
/// - `500 Internal Server Error`: Cash-out could not be made durable
pub async fn leave_table(
    State(state): State<AppState>,
    Extension(player): Extension<PlayerRef>,
    Extension(request_id): Extension<RequestId>,
    Path(table_id): Path<TableId>,
) -> Result<Json<LeaveTableResponse>, ApiError> {
    let result = state.lobby.tables.leave_table(&player, table_id).await;
    record_outcome("leave", &result);

    let cashed_out = result.map_err(table_error)?;
    tracing::info!(
        request_id = %request_id.as_str(),
        player_id = player.id,
        %table_id,
        cashed_out,
        "Player left table"
    );

    Ok(Json(LeaveTableResponse {
        table_id,
        cashed_out,
    }))
}
