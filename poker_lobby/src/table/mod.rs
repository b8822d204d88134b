//! Table lifecycle: discovery, creation, and the join/leave sagas.
//!
//! This module implements:
//! - TableConfig: validated table parameters (blinds, buy-in bounds, seats)
//! - TableManager: list/get/create plus join and leave
//! - Saga: explicit state machine for the two-step wallet + seat transactions
//!
//! ## Architecture
//!
//! A join debits the wallet first and then claims the seat. If the claim
//! fails the debit is compensated with a refund that is retried until
//! durable. A leave releases the seat first and then credits the stack back,
//! again retried until durable. Successful joins and leaves are announced to
//! the table's room and to the lobby.
//!
//! ## Example
//!
//! ```no_run
//! use poker_lobby::Lobby;
//! use poker_lobby::auth::PlayerRef;
//! use poker_lobby::table::TableConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lobby = Lobby::in_memory(Default::default());
//!     let alice = PlayerRef::new(1, "alice");
//!
//!     lobby.wallets.open_wallet(alice.id).await?;
//!     let table = lobby.tables.create_table(&alice, TableConfig::default()).await?;
//!     let seat = lobby.tables.join_table(&alice, table.id, 3, 200).await?;
//!     println!("Seated at {} with {}", seat.seat_number, seat.chip_stack);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod manager;
pub mod models;
pub mod saga;

pub use config::{MAX_SEATS, TableConfig};
pub use errors::{TableError, TableResult};
pub use manager::TableManager;
pub use models::{Page, Table, TableDetails, TableId, TableStatus, TableSummary};
pub use saga::{Saga, SagaKind, SagaState};
