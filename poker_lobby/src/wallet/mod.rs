//! Wallet ledger: per-player chip balances with an audit trail.
//!
//! This module implements:
//! - Atomic signed adjustments (`balance = balance + delta` guarded by
//!   `balance + delta >= 0`), never read-then-write from memory
//! - One durable audit record per adjustment, written in the same store
//!   transaction
//! - Idempotency keys so a retried credit is applied at most once
//! - Retry-until-durable credits for refunds and cash-outs
//!
//! ## Example
//!
//! ```no_run
//! use poker_lobby::config::LobbyConfig;
//! use poker_lobby::db::MemoryStore;
//! use poker_lobby::wallet::{TransactionKind, WalletManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let wallets = WalletManager::new(Arc::new(MemoryStore::new()), &LobbyConfig::default());
//!     wallets.open_wallet(1).await?;
//!
//!     let balance = wallets
//!         .debit(1, 200, TransactionKind::BuyIn, None, "buy_in_unique_key".to_string(), None)
//!         .await?;
//!     println!("New balance after buy-in: {}", balance);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{WalletError, WalletResult};
pub use manager::WalletManager;
pub use models::{Adjustment, Transaction, TransactionKind, Wallet};
