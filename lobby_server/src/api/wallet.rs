//! Wallet API handlers.

use axum::{
    Json,
    extract::{Extension, Query, State},
};
use poker_lobby::{
    auth::PlayerRef,
    wallet::{Transaction, Wallet},
};
use serde::Deserialize;

use super::{ApiError, AppState, wallet_error};

const DEFAULT_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Caller's wallet, opened with the starting balance on first access
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(player): Extension<PlayerRef>,
) -> Result<Json<Wallet>, ApiError> {
    open_wallet(State(state), Extension(player)).await
}

/// Open the caller's wallet.
///
/// Idempotent: an existing wallet is returned with its balance untouched.
pub async fn open_wallet(
    State(state): State<AppState>,
    Extension(player): Extension<PlayerRef>,
) -> Result<Json<Wallet>, ApiError> {
    state
        .lobby
        .wallets
        .open_wallet(player.id)
        .await
        .map(Json)
        .map_err(wallet_error)
}

/// Audit records of the caller's wallet, newest first
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(player): Extension<PlayerRef>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    state
        .lobby
        .wallets
        .history(player.id, query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await
        .map(Json)
        .map_err(wallet_error)
}
