//! # Poker Lobby
//!
//! Table seating, a wallet ledger and realtime rooms for a poker lobby.
//!
//! Players discover tables, sit down with a buy-in drawn from their wallet,
//! leave with their stack cashed out, and receive live notifications about
//! lobby and table membership. Poker rules themselves are out of scope: player
//! actions are only echoed to the table's room.
//!
//! ## Guarantees
//!
//! - No two players ever occupy the same seat
//! - No wallet balance ever goes negative
//! - Every buy-in and cash-out is reflected exactly once in both the seat and
//!   the wallet, with refunds retried until durable when a join fails midway
//! - Every live connection's room memberships match the server's view, and a
//!   disconnect notifies each room it was in exactly once
//!
//! ## Core Modules
//!
//! - [`wallet`]: Balances, atomic adjustments and the audit trail
//! - [`seating`]: Seat claims and releases backed by uniqueness constraints
//! - [`table`]: Table discovery and creation, join/leave sagas
//! - [`rooms`]: Connection registry, room membership and event fan-out
//! - [`auth`]: Access token verification at the gateway boundary
//! - [`db`]: PostgreSQL and in-memory storage backends
//!
//! ## Example
//!
//! ```
//! use poker_lobby::Lobby;
//! use poker_lobby::auth::PlayerRef;
//! use poker_lobby::table::TableConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let lobby = Lobby::in_memory(Default::default());
//!     let alice = PlayerRef::new(1, "alice");
//!     lobby.wallets.open_wallet(alice.id).await.unwrap();
//!
//!     let table = lobby.tables.create_table(&alice, TableConfig::default()).await.unwrap();
//!     lobby.tables.join_table(&alice, table.id, 3, 200).await.unwrap();
//!     assert_eq!(lobby.wallets.get_wallet(alice.id).await.unwrap().balance, 800);
//!
//!     lobby.tables.leave_table(&alice, table.id).await.unwrap();
//!     assert_eq!(lobby.wallets.get_wallet(alice.id).await.unwrap().balance, 1000);
//! }
//! ```

/// Access token verification and player identities.
pub mod auth;

/// Lobby-wide configuration.
pub mod config;

/// Storage backends.
pub mod db;

/// Error classification shared by all modules.
pub mod errors;

mod lobby;
pub use lobby::Lobby;

/// Realtime room coordination.
pub mod rooms;

/// Seat occupancy.
pub mod seating;

/// Table lifecycle management.
pub mod table;

/// Wallet ledger.
pub mod wallet;

pub use config::LobbyConfig;
pub use errors::ErrorKind;
