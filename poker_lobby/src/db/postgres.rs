//! PostgreSQL storage backend.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::repository::{SeatRepository, TableRepository, WalletRepository};
use crate::auth::PlayerId;
use crate::seating::{Seat, SeatChange, SeatClaim, SeatError, SeatResult};
use crate::table::{
    Table, TableConfig, TableError, TableId, TableResult, TableStatus, TableSummary,
};
use crate::wallet::{Adjustment, Transaction, TransactionKind, Wallet, WalletError, WalletResult};

/// Unique constraint on `(table_id, seat_number)`
const SEAT_UNIQUE: &str = "table_seats_seat_unique";

/// Unique constraint on `(table_id, user_id)`
const PLAYER_UNIQUE: &str = "table_seats_player_unique";

/// Unique constraint on `transactions.idempotency_key`
const IDEMPOTENCY_UNIQUE: &str = "transactions_idempotency_key_key";

/// SQLSTATE for numeric value out of range
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Name of the unique constraint `err` violated, if it is a unique violation
fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

fn is_numeric_overflow(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE),
        _ => false,
    }
}

fn wallet_from_row(row: &PgRow) -> Wallet {
    Wallet {
        player_id: row.get("user_id"),
        balance: row.get("balance"),
        total_deposited: row.get("total_deposited"),
        total_withdrawn: row.get("total_withdrawn"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        updated_at: row.get::<chrono::NaiveDateTime, _>("updated_at").and_utc(),
    }
}

fn seat_from_row(row: &PgRow) -> Seat {
    Seat {
        id: row.get("id"),
        table_id: row.get("table_id"),
        player_id: row.get("user_id"),
        seat_number: row.get::<i16, _>("seat_number") as u8,
        chip_stack: row.get("chip_stack"),
        joined_at: row.get::<chrono::NaiveDateTime, _>("joined_at").and_utc(),
    }
}

fn table_from_row(row: &PgRow) -> Table {
    let status: String = row.get("status");
    Table {
        id: row.get("id"),
        config: TableConfig {
            name: row.get("name"),
            table_type: row.get("table_type"),
            small_blind: row.get("small_blind"),
            big_blind: row.get("big_blind"),
            min_buy_in: row.get("min_buy_in"),
            max_buy_in: row.get("max_buy_in"),
            max_players: row.get::<i16, _>("max_players") as u8,
        },
        // The CHECK constraint admits only the three known values
        status: TableStatus::parse(&status).unwrap_or(TableStatus::Closed),
        current_players: row.get::<i16, _>("current_players") as u8,
        created_by: row.get("created_by"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    }
}

/// PostgreSQL implementation of every repository trait
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for PgStore {
    async fn get_wallet(&self, player_id: PlayerId) -> WalletResult<Wallet> {
        let row = sqlx::query(
            r#"
            SELECT user_id, balance, total_deposited, total_withdrawn, created_at, updated_at
            FROM user_wallet
            WHERE user_id = $1
            "#,
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(WalletError::WalletNotFound(player_id))?;

        Ok(wallet_from_row(&row))
    }

    async fn open_wallet(&self, player_id: PlayerId, initial_balance: i64) -> WalletResult<Wallet> {
        if initial_balance < 0 {
            return Err(WalletError::InvalidAmount(initial_balance));
        }

        sqlx::query(
            "INSERT INTO user_wallet (user_id, balance) VALUES ($1, $2)
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(player_id)
        .bind(initial_balance)
        .execute(&self.pool)
        .await?;

        self.get_wallet(player_id).await
    }

    async fn apply(&self, adjustment: &Adjustment) -> WalletResult<i64> {
        let mut tx = self.pool.begin().await?;

        // Check for duplicate transaction (idempotency)
        let existing = sqlx::query("SELECT id FROM transactions WHERE idempotency_key = $1")
            .bind(&adjustment.idempotency_key)
            .fetch_optional(&mut *tx)
            .await?;

        if existing.is_some() {
            return Err(WalletError::DuplicateTransaction(
                adjustment.idempotency_key.clone(),
            ));
        }

        // Conditional update: the balance check and the write are one statement
        let updated = sqlx::query(
            "UPDATE user_wallet
             SET balance = balance + $1,
                 total_deposited = total_deposited + $2,
                 total_withdrawn = total_withdrawn + $3,
                 updated_at = NOW()
             WHERE user_id = $4 AND balance + $1 >= 0
             RETURNING balance",
        )
        .bind(adjustment.delta)
        .bind(adjustment.deposited())
        .bind(adjustment.withdrawn())
        .bind(adjustment.player_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            if is_numeric_overflow(&e) {
                WalletError::BalanceOverflow
            } else {
                WalletError::Database(e)
            }
        })?;

        let balance: i64 = match updated {
            Some(row) => row.get("balance"),
            None => {
                // Either wallet doesn't exist or insufficient balance
                let current = sqlx::query("SELECT balance FROM user_wallet WHERE user_id = $1")
                    .bind(adjustment.player_id)
                    .fetch_optional(&mut *tx)
                    .await?;

                return match current {
                    Some(row) => Err(WalletError::InsufficientFunds {
                        player_id: adjustment.player_id,
                        available: row.get("balance"),
                        required: -adjustment.delta,
                    }),
                    None => Err(WalletError::WalletNotFound(adjustment.player_id)),
                };
            }
        };

        sqlx::query(
            r#"
            INSERT INTO transactions
                (user_id, table_id, type, amount, balance_after, description, idempotency_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(adjustment.player_id)
        .bind(adjustment.table_id)
        .bind(adjustment.kind.to_string())
        .bind(adjustment.delta)
        .bind(balance)
        .bind(&adjustment.description)
        .bind(&adjustment.idempotency_key)
        .execute(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            // Lost a race with a concurrent attempt carrying the same key
            Some(constraint) if constraint == IDEMPOTENCY_UNIQUE => {
                WalletError::DuplicateTransaction(adjustment.idempotency_key.clone())
            }
            _ => WalletError::Database(e),
        })?;

        tx.commit().await?;

        Ok(balance)
    }

    async fn get_entries(&self, player_id: PlayerId, limit: i64) -> WalletResult<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, table_id, type, amount, balance_after, description,
                   idempotency_key, created_at
            FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(player_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let kind: String = row.get("type");
            let Some(kind) = TransactionKind::parse(&kind) else {
                log::warn!("Skipping transaction with unknown type {:?}", kind);
                continue;
            };

            entries.push(Transaction {
                id: row.get("id"),
                player_id: row.get("user_id"),
                table_id: row.get("table_id"),
                kind,
                amount: row.get("amount"),
                balance_after: row.get("balance_after"),
                description: row.get("description"),
                idempotency_key: row.get("idempotency_key"),
                created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            });
        }

        Ok(entries)
    }
}

#[async_trait]
impl SeatRepository for PgStore {
    async fn claim_seat(&self, claim: &SeatClaim) -> SeatResult<SeatChange> {
        let mut tx = self.pool.begin().await?;

        // Reserve a place in the player count; the row lock serializes
        // concurrent claims on the same table
        let reserved = sqlx::query(
            "UPDATE tables
             SET current_players = current_players + 1
             WHERE id = $1 AND status <> 'CLOSED' AND current_players < max_players
             RETURNING max_players, current_players",
        )
        .bind(claim.table_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = reserved else {
            let table = sqlx::query("SELECT status FROM tables WHERE id = $1")
                .bind(claim.table_id)
                .fetch_optional(&mut *tx)
                .await?;

            return match table {
                None => Err(SeatError::TableNotFound(claim.table_id)),
                Some(row) if row.get::<String, _>("status") == "CLOSED" => {
                    Err(SeatError::TableClosed)
                }
                Some(_) => Err(SeatError::TableFull),
            };
        };

        let max_players = row.get::<i16, _>("max_players") as u8;
        let current_players = row.get::<i16, _>("current_players") as u8;

        if claim.seat_number == 0 || claim.seat_number > max_players {
            return Err(SeatError::InvalidSeatNumber {
                seat_number: claim.seat_number,
                max_players,
            });
        }

        let seat = claim.clone().into_seat();
        sqlx::query(
            r#"
            INSERT INTO table_seats (id, table_id, user_id, seat_number, chip_stack, joined_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(seat.id)
        .bind(seat.table_id)
        .bind(seat.player_id)
        .bind(seat.seat_number as i16)
        .bind(seat.chip_stack)
        .bind(seat.joined_at.naive_utc())
        .execute(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e).as_deref() {
            Some(SEAT_UNIQUE) => SeatError::SeatTaken(claim.seat_number),
            Some(PLAYER_UNIQUE) => SeatError::AlreadySeated(claim.player_id),
            _ => SeatError::Database(e),
        })?;

        tx.commit().await?;

        Ok(SeatChange {
            seat,
            current_players,
        })
    }

    async fn release_seat(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<SeatChange> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            DELETE FROM table_seats
            WHERE table_id = $1 AND user_id = $2
            RETURNING id, table_id, user_id, seat_number, chip_stack, joined_at
            "#,
        )
        .bind(table_id)
        .bind(player_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(SeatError::NotSeated(player_id))?;

        let seat = seat_from_row(&row);

        let counter = sqlx::query(
            "UPDATE tables
             SET current_players = current_players - 1
             WHERE id = $1 AND current_players > 0
             RETURNING current_players",
        )
        .bind(table_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current_players = match counter {
            Some(row) => row.get::<i16, _>("current_players") as u8,
            None => {
                log::warn!("Player counter of table {} was already zero", table_id);
                0
            }
        };

        tx.commit().await?;

        Ok(SeatChange {
            seat,
            current_players,
        })
    }

    async fn seats_at(&self, table_id: TableId) -> SeatResult<Vec<Seat>> {
        let rows = sqlx::query(
            r#"
            SELECT id, table_id, user_id, seat_number, chip_stack, joined_at
            FROM table_seats
            WHERE table_id = $1
            ORDER BY seat_number ASC
            "#,
        )
        .bind(table_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(seat_from_row).collect())
    }

    async fn find_seat(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<Option<Seat>> {
        let row = sqlx::query(
            r#"
            SELECT id, table_id, user_id, seat_number, chip_stack, joined_at
            FROM table_seats
            WHERE table_id = $1 AND user_id = $2
            "#,
        )
        .bind(table_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(seat_from_row))
    }
}

#[async_trait]
impl TableRepository for PgStore {
    async fn create_table(&self, table: &Table) -> TableResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tables
                (id, name, table_type, status, small_blind, big_blind, min_buy_in, max_buy_in,
                 max_players, current_players, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(table.id)
        .bind(&table.config.name)
        .bind(&table.config.table_type)
        .bind(table.status.to_string())
        .bind(table.config.small_blind)
        .bind(table.config.big_blind)
        .bind(table.config.min_buy_in)
        .bind(table.config.max_buy_in)
        .bind(table.config.max_players as i16)
        .bind(table.current_players as i16)
        .bind(table.created_by)
        .bind(table.created_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_table(&self, table_id: TableId) -> TableResult<Option<Table>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, table_type, status, small_blind, big_blind, min_buy_in, max_buy_in,
                   max_players, current_players, created_by, created_at
            FROM tables
            WHERE id = $1
            "#,
        )
        .bind(table_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(table_from_row))
    }

    async fn list_tables(&self, limit: i64, offset: i64) -> TableResult<Vec<TableSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, table_type, status, small_blind, big_blind, min_buy_in, max_buy_in,
                   max_players, current_players, created_by, created_at
            FROM tables
            WHERE status IN ('WAITING', 'PLAYING')
            ORDER BY created_at DESC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| TableSummary::from(&table_from_row(row)))
            .collect())
    }

    async fn set_status(&self, table_id: TableId, status: TableStatus) -> TableResult<()> {
        let result = sqlx::query("UPDATE tables SET status = $1 WHERE id = $2")
            .bind(status.to_string())
            .bind(table_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TableError::TableNotFound(table_id));
        }
        Ok(())
    }
}
