//! Realtime room coordinator.
//!
//! Tracks which live connections belong to which rooms (the lobby and one room
//! per table) and fans events out to them. Each connection owns a bounded FIFO
//! outbox; events for a room are queued while that room's lock is held, so
//! every member observes joins, leaves and broadcasts in the same order.
//!
//! ## Example
//!
//! ```
//! use poker_lobby::auth::PlayerRef;
//! use poker_lobby::rooms::{EventKind, RoomCoordinator, RoomName};
//!
//! #[tokio::main]
//! async fn main() {
//!     let rooms = RoomCoordinator::new(64);
//!     let (alice, _alice_events) = rooms.register(PlayerRef::new(1, "alice")).await;
//!     let (bob, mut bob_events) = rooms.register(PlayerRef::new(2, "bob")).await;
//!
//!     rooms.join_room(bob, RoomName::Lobby).await.unwrap();
//!     rooms.join_room(alice, RoomName::Lobby).await.unwrap();
//!
//!     let event = bob_events.recv().await.unwrap();
//!     assert_eq!(event.kind, EventKind::MemberJoined);
//!
//!     let report = rooms.on_disconnect(alice).await.unwrap();
//!     assert_eq!(report.notified, 1);
//! }
//! ```

pub mod coordinator;
pub mod errors;
pub mod models;

pub use coordinator::RoomCoordinator;
pub use errors::{RoomError, RoomResult};
pub use models::{
    ConnectionId, DisconnectReport, EventKind, JoinOutcome, LOBBY, RoomEvent, RoomName,
};
