//! Wallet manager: the ledger every buy-in, cash-out and refund goes through.

use super::{
    errors::{WalletError, WalletResult},
    models::{Adjustment, Transaction, TransactionKind, Wallet},
};
use crate::{
    auth::PlayerId,
    config::{LobbyConfig, RetryPolicy},
    db::WalletRepository,
    table::TableId,
};
use std::sync::Arc;

/// Largest history page a caller may request
const MAX_HISTORY_LIMIT: i64 = 100;

/// Wallet manager
#[derive(Clone)]
pub struct WalletManager {
    repo: Arc<dyn WalletRepository>,
    default_balance: i64,
    retry: RetryPolicy,
}

impl WalletManager {
    /// Create a new wallet manager
    ///
    /// # Arguments
    ///
    /// * `repo` - Wallet storage backend
    /// * `config` - Lobby configuration (starting balance, retry policy)
    pub fn new(repo: Arc<dyn WalletRepository>, config: &LobbyConfig) -> Self {
        Self {
            repo,
            default_balance: config.default_wallet_balance,
            retry: config.compensation,
        }
    }

    /// Get wallet for a player
    pub async fn get_wallet(&self, player_id: PlayerId) -> WalletResult<Wallet> {
        self.repo.get_wallet(player_id).await
    }

    /// Open a wallet with the configured starting balance.
    ///
    /// Idempotent: an existing wallet is returned untouched.
    pub async fn open_wallet(&self, player_id: PlayerId) -> WalletResult<Wallet> {
        let wallet = self.repo.open_wallet(player_id, self.default_balance).await?;
        log::debug!("Wallet ready for player {}: balance {}", player_id, wallet.balance);
        Ok(wallet)
    }

    /// Apply a signed balance change atomically with its audit record
    ///
    /// # Errors
    ///
    /// * `WalletError::InvalidAmount` - Zero delta or sign contradicting the kind
    /// * `WalletError::InsufficientFunds` - Debit larger than the balance
    /// * `WalletError::WalletNotFound` - No wallet for the player
    /// * `WalletError::DuplicateTransaction` - Idempotency key already applied
    pub async fn adjust(&self, adjustment: &Adjustment) -> WalletResult<i64> {
        if adjustment.delta == 0 || adjustment.kind.is_debit() != (adjustment.delta < 0) {
            return Err(WalletError::InvalidAmount(adjustment.delta));
        }

        self.repo.apply(adjustment).await
    }

    /// Remove `amount` chips from a wallet
    pub async fn debit(
        &self,
        player_id: PlayerId,
        amount: i64,
        kind: TransactionKind,
        table_id: Option<TableId>,
        idempotency_key: String,
        description: Option<String>,
    ) -> WalletResult<i64> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }

        self.adjust(&Adjustment {
            player_id,
            delta: -amount,
            kind,
            table_id,
            description,
            idempotency_key,
        })
        .await
    }

    /// Add `amount` chips to a wallet
    pub async fn credit(
        &self,
        player_id: PlayerId,
        amount: i64,
        kind: TransactionKind,
        table_id: Option<TableId>,
        idempotency_key: String,
        description: Option<String>,
    ) -> WalletResult<i64> {
        if amount <= 0 {
            return Err(WalletError::InvalidAmount(amount));
        }

        self.adjust(&Adjustment {
            player_id,
            delta: amount,
            kind,
            table_id,
            description,
            idempotency_key,
        })
        .await
    }

    /// Credit a wallet, retrying with backoff until the credit is durable.
    ///
    /// Every attempt reuses the same idempotency key, so an attempt whose
    /// commit succeeded but whose reply was lost shows up on the next attempt
    /// as `DuplicateTransaction`; that counts as success.
    ///
    /// # Returns
    ///
    /// * `WalletResult<i64>` - Balance after the credit, or the last error once
    ///   the retry policy is exhausted
    pub async fn credit_until_durable(
        &self,
        player_id: PlayerId,
        amount: i64,
        kind: TransactionKind,
        table_id: Option<TableId>,
        idempotency_key: String,
        description: Option<String>,
    ) -> WalletResult<i64> {
        let mut attempt = 1;

        loop {
            let result = self
                .credit(
                    player_id,
                    amount,
                    kind,
                    table_id,
                    idempotency_key.clone(),
                    description.clone(),
                )
                .await;

            let err = match result {
                Ok(balance) => return Ok(balance),
                Err(WalletError::DuplicateTransaction(_)) => {
                    log::info!(
                        "Credit {} for player {} was already applied",
                        idempotency_key,
                        player_id
                    );
                    return self.get_wallet(player_id).await.map(|w| w.balance);
                }
                Err(err @ WalletError::InvalidAmount(_)) => return Err(err),
                Err(err) => err,
            };

            if attempt >= self.retry.max_attempts {
                return Err(err);
            }

            let delay = self.retry.delay_for(attempt);
            log::warn!(
                "Credit {} of {} to player {} failed (attempt {}/{}): {}; retrying in {:?}",
                idempotency_key,
                amount,
                player_id,
                attempt,
                self.retry.max_attempts,
                err,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Get audit records for a player, newest first
    ///
    /// `limit` is clamped to `1..=100`.
    pub async fn history(&self, player_id: PlayerId, limit: i64) -> WalletResult<Vec<Transaction>> {
        self.repo
            .get_entries(player_id, limit.clamp(1, MAX_HISTORY_LIMIT))
            .await
    }
}
