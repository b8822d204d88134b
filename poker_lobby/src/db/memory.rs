//! In-process storage backend.
//!
//! Mirrors the PostgreSQL semantics (conditional balance updates, unique seat
//! constraints, one transaction per operation) without a database, for
//! development and tests. Each wallet and each table sits behind its own lock,
//! so unrelated players and tables never contend.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use super::repository::{SeatRepository, TableRepository, WalletRepository};
use crate::auth::PlayerId;
use crate::seating::{Seat, SeatChange, SeatClaim, SeatError, SeatResult};
use crate::table::{Table, TableError, TableId, TableResult, TableStatus, TableSummary};
use crate::wallet::{Adjustment, Transaction, Wallet, WalletError, WalletResult};

/// Audit log shared by all wallets
#[derive(Default)]
struct Ledger {
    next_id: i64,
    keys: HashSet<String>,
    entries: Vec<Transaction>,
}

/// A table and its seats keyed by seat number
struct TableSlot {
    table: Table,
    seats: BTreeMap<u8, Seat>,
}

/// In-memory implementation of every repository trait
#[derive(Default)]
pub struct MemoryStore {
    wallets: RwLock<HashMap<PlayerId, Arc<Mutex<Wallet>>>>,
    ledger: Mutex<Ledger>,
    tables: RwLock<HashMap<TableId, Arc<Mutex<TableSlot>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn wallet(&self, player_id: PlayerId) -> WalletResult<Arc<Mutex<Wallet>>> {
        self.wallets
            .read()
            .await
            .get(&player_id)
            .cloned()
            .ok_or(WalletError::WalletNotFound(player_id))
    }

    async fn slot(&self, table_id: TableId) -> Option<Arc<Mutex<TableSlot>>> {
        self.tables.read().await.get(&table_id).cloned()
    }
}

#[async_trait]
impl WalletRepository for MemoryStore {
    async fn get_wallet(&self, player_id: PlayerId) -> WalletResult<Wallet> {
        let wallet = self.wallet(player_id).await?;
        let wallet = wallet.lock().await;
        Ok(wallet.clone())
    }

    async fn open_wallet(&self, player_id: PlayerId, initial_balance: i64) -> WalletResult<Wallet> {
        if initial_balance < 0 {
            return Err(WalletError::InvalidAmount(initial_balance));
        }

        let wallet = {
            let mut wallets = self.wallets.write().await;
            wallets
                .entry(player_id)
                .or_insert_with(|| {
                    let now = Utc::now();
                    Arc::new(Mutex::new(Wallet {
                        player_id,
                        balance: initial_balance,
                        total_deposited: 0,
                        total_withdrawn: 0,
                        created_at: now,
                        updated_at: now,
                    }))
                })
                .clone()
        };

        let wallet = wallet.lock().await;
        Ok(wallet.clone())
    }

    async fn apply(&self, adjustment: &Adjustment) -> WalletResult<i64> {
        let wallet = self.wallet(adjustment.player_id).await?;

        // Lock order: wallet, then ledger
        let mut wallet = wallet.lock().await;
        let mut ledger = self.ledger.lock().await;

        if ledger.keys.contains(&adjustment.idempotency_key) {
            return Err(WalletError::DuplicateTransaction(
                adjustment.idempotency_key.clone(),
            ));
        }

        let balance = wallet
            .balance
            .checked_add(adjustment.delta)
            .ok_or(WalletError::BalanceOverflow)?;
        if balance < 0 {
            return Err(WalletError::InsufficientFunds {
                player_id: adjustment.player_id,
                available: wallet.balance,
                required: -adjustment.delta,
            });
        }

        let now = Utc::now();
        wallet.balance = balance;
        wallet.total_deposited += adjustment.deposited();
        wallet.total_withdrawn += adjustment.withdrawn();
        wallet.updated_at = now;

        ledger.next_id += 1;
        let id = ledger.next_id;
        ledger.keys.insert(adjustment.idempotency_key.clone());
        ledger.entries.push(Transaction {
            id,
            player_id: adjustment.player_id,
            table_id: adjustment.table_id,
            kind: adjustment.kind,
            amount: adjustment.delta,
            balance_after: balance,
            description: adjustment.description.clone(),
            idempotency_key: adjustment.idempotency_key.clone(),
            created_at: now,
        });

        Ok(balance)
    }

    async fn get_entries(&self, player_id: PlayerId, limit: i64) -> WalletResult<Vec<Transaction>> {
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .entries
            .iter()
            .rev()
            .filter(|entry| entry.player_id == player_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SeatRepository for MemoryStore {
    async fn claim_seat(&self, claim: &SeatClaim) -> SeatResult<SeatChange> {
        let slot = self
            .slot(claim.table_id)
            .await
            .ok_or(SeatError::TableNotFound(claim.table_id))?;
        let mut slot = slot.lock().await;

        if slot.table.status == TableStatus::Closed {
            return Err(SeatError::TableClosed);
        }
        if slot.table.is_full() {
            return Err(SeatError::TableFull);
        }
        if !slot.table.has_seat(claim.seat_number) {
            return Err(SeatError::InvalidSeatNumber {
                seat_number: claim.seat_number,
                max_players: slot.table.config.max_players,
            });
        }
        if slot.seats.values().any(|s| s.player_id == claim.player_id) {
            return Err(SeatError::AlreadySeated(claim.player_id));
        }
        if slot.seats.contains_key(&claim.seat_number) {
            return Err(SeatError::SeatTaken(claim.seat_number));
        }

        let seat = claim.clone().into_seat();
        slot.seats.insert(seat.seat_number, seat.clone());
        slot.table.current_players += 1;

        Ok(SeatChange {
            seat,
            current_players: slot.table.current_players,
        })
    }

    async fn release_seat(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<SeatChange> {
        let slot = self
            .slot(table_id)
            .await
            .ok_or(SeatError::NotSeated(player_id))?;
        let mut slot = slot.lock().await;

        let seat_number = slot
            .seats
            .values()
            .find(|s| s.player_id == player_id)
            .map(|s| s.seat_number)
            .ok_or(SeatError::NotSeated(player_id))?;

        let seat = slot
            .seats
            .remove(&seat_number)
            .ok_or(SeatError::NotSeated(player_id))?;
        slot.table.current_players = slot.table.current_players.saturating_sub(1);

        Ok(SeatChange {
            seat,
            current_players: slot.table.current_players,
        })
    }

    async fn seats_at(&self, table_id: TableId) -> SeatResult<Vec<Seat>> {
        let Some(slot) = self.slot(table_id).await else {
            return Ok(Vec::new());
        };
        let slot = slot.lock().await;
        Ok(slot.seats.values().cloned().collect())
    }

    async fn find_seat(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<Option<Seat>> {
        let Some(slot) = self.slot(table_id).await else {
            return Ok(None);
        };
        let slot = slot.lock().await;
        Ok(slot.seats.values().find(|s| s.player_id == player_id).cloned())
    }
}

#[async_trait]
impl TableRepository for MemoryStore {
    async fn create_table(&self, table: &Table) -> TableResult<()> {
        let mut tables = self.tables.write().await;
        tables.insert(
            table.id,
            Arc::new(Mutex::new(TableSlot {
                table: table.clone(),
                seats: BTreeMap::new(),
            })),
        );
        Ok(())
    }

    async fn get_table(&self, table_id: TableId) -> TableResult<Option<Table>> {
        let Some(slot) = self.slot(table_id).await else {
            return Ok(None);
        };
        let slot = slot.lock().await;
        Ok(Some(slot.table.clone()))
    }

    async fn list_tables(&self, limit: i64, offset: i64) -> TableResult<Vec<TableSummary>> {
        let slots: Vec<_> = self.tables.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(slots.len());
        for slot in slots {
            let slot = slot.lock().await;
            if slot.table.status.is_listed() {
                summaries.push(TableSummary::from(&slot.table));
            }
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(summaries
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn set_status(&self, table_id: TableId, status: TableStatus) -> TableResult<()> {
        let slot = self
            .slot(table_id)
            .await
            .ok_or(TableError::TableNotFound(table_id))?;
        slot.lock().await.table.status = status;
        Ok(())
    }
}
