//! Repository trait definitions for testability and dependency injection.
//!
//! Every storage backend implements all three traits. The managers only ever
//! see `Arc<dyn ...Repository>`, so PostgreSQL and the in-process store are
//! interchangeable.

use async_trait::async_trait;

use crate::auth::PlayerId;
use crate::seating::{Seat, SeatChange, SeatClaim, SeatResult};
use crate::table::{Table, TableId, TableResult, TableStatus, TableSummary};
use crate::wallet::{Adjustment, Transaction, Wallet, WalletResult};

/// Trait for wallet ledger storage
#[async_trait]
pub trait WalletRepository: Send + Sync {
    /// Get wallet for player
    async fn get_wallet(&self, player_id: PlayerId) -> WalletResult<Wallet>;

    /// Create the wallet with `initial_balance` unless it already exists
    async fn open_wallet(&self, player_id: PlayerId, initial_balance: i64) -> WalletResult<Wallet>;

    /// Apply a signed adjustment and write its audit record in one
    /// transaction, returning the new balance.
    ///
    /// Must fail with `DuplicateTransaction` when the idempotency key was
    /// already applied and with `InsufficientFunds` when the balance would go
    /// negative, leaving no trace in either case.
    async fn apply(&self, adjustment: &Adjustment) -> WalletResult<i64>;

    /// Get audit records, newest first
    async fn get_entries(&self, player_id: PlayerId, limit: i64) -> WalletResult<Vec<Transaction>>;
}

/// Trait for seat occupancy storage
#[async_trait]
pub trait SeatRepository: Send + Sync {
    /// Check the table, bump `current_players` and insert the seat in one
    /// transaction
    async fn claim_seat(&self, claim: &SeatClaim) -> SeatResult<SeatChange>;

    /// Delete the player's seat and decrement `current_players` in one
    /// transaction
    async fn release_seat(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<SeatChange>;

    /// Occupied seats ordered by seat number
    async fn seats_at(&self, table_id: TableId) -> SeatResult<Vec<Seat>>;

    async fn find_seat(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<Option<Seat>>;
}

/// Trait for table storage
#[async_trait]
pub trait TableRepository: Send + Sync {
    async fn create_table(&self, table: &Table) -> TableResult<()>;

    async fn get_table(&self, table_id: TableId) -> TableResult<Option<Table>>;

    /// WAITING and PLAYING tables, most recently created first
    async fn list_tables(&self, limit: i64, offset: i64) -> TableResult<Vec<TableSummary>>;

    async fn set_status(&self, table_id: TableId, status: TableStatus) -> TableResult<()>;
}
