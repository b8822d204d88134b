//! Table lifecycle manager: table discovery and creation, and the join/leave
//! sagas that move chips between wallets and seats.

use super::{
    config::TableConfig,
    errors::{TableError, TableResult},
    models::{Page, Table, TableDetails, TableId, TableSummary},
    saga::{Saga, SagaKind, SagaState},
};
use crate::{
    auth::PlayerRef,
    config::LobbyConfig,
    db::TableRepository,
    rooms::{EventKind, RoomCoordinator, RoomName},
    seating::{Seat, SeatError, SeatRegistry},
    wallet::{TransactionKind, WalletManager},
};
use serde_json::{Map, Value, json};
use std::{future::Future, sync::Arc};

fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Run a saga on its own task so a dropped caller cannot interrupt it
/// between its two steps.
async fn detach<T, F>(saga: F) -> TableResult<T>
where
    T: Send + 'static,
    F: Future<Output = TableResult<T>> + Send + 'static,
{
    tokio::spawn(saga).await.unwrap_or_else(|e| {
        log::error!(target: "reconciliation", "saga task failed: {}", e);
        Err(TableError::Aborted(e.to_string()))
    })
}

/// Table manager
///
/// Cloning is cheap; every clone shares the same stores and coordinator.
#[derive(Clone)]
pub struct TableManager {
    tables: Arc<dyn TableRepository>,
    seats: SeatRegistry,
    wallets: Arc<WalletManager>,
    rooms: Arc<RoomCoordinator>,
    list_default_limit: i64,
    list_max_limit: i64,
}

impl TableManager {
    /// Create a new table manager
    ///
    /// # Arguments
    ///
    /// * `tables` - Table storage
    /// * `seats` - Seat registry
    /// * `wallets` - Wallet ledger
    /// * `rooms` - Room coordinator used for lobby and table notifications
    /// * `config` - Lobby configuration (listing limits)
    pub fn new(
        tables: Arc<dyn TableRepository>,
        seats: SeatRegistry,
        wallets: Arc<WalletManager>,
        rooms: Arc<RoomCoordinator>,
        config: &LobbyConfig,
    ) -> Self {
        Self {
            tables,
            seats,
            wallets,
            rooms,
            list_default_limit: config.list_default_limit,
            list_max_limit: config.list_max_limit,
        }
    }

    pub fn seats(&self) -> &SeatRegistry {
        &self.seats
    }

    /// List open tables, most recently created first
    pub async fn list_tables(&self, page: Page) -> TableResult<Vec<TableSummary>> {
        let (limit, offset) = page.resolve(self.list_default_limit, self.list_max_limit);
        self.tables.list_tables(limit, offset).await
    }

    async fn load(&self, table_id: TableId) -> TableResult<Table> {
        self.tables
            .get_table(table_id)
            .await?
            .ok_or(TableError::TableNotFound(table_id))
    }

    /// Get a table with its seats ordered by seat number
    pub async fn get_table(&self, table_id: TableId) -> TableResult<TableDetails> {
        let table = self.load(table_id).await?;
        let seats = self.seats.seats_at(table_id).await?;
        Ok(TableDetails { table, seats })
    }

    /// Create a table owned by `owner` and announce it in the lobby
    ///
    /// # Errors
    ///
    /// * `TableError::InvalidConfig` - Configuration failed validation
    pub async fn create_table(&self, owner: &PlayerRef, config: TableConfig) -> TableResult<Table> {
        config.validate().map_err(TableError::InvalidConfig)?;

        let table = Table::new(config, owner.id);
        self.tables.create_table(&table).await?;

        log::info!(
            "Created table {} '{}' ({}/{} blinds) for {}",
            table.id,
            table.config.name,
            table.config.small_blind,
            table.config.big_blind,
            owner
        );

        let summary = serde_json::to_value(TableSummary::from(&table)).unwrap_or_default();
        self.rooms
            .broadcast(
                &RoomName::Lobby,
                EventKind::TableCreated,
                owner,
                payload(json!({ "table": summary })),
            )
            .await;

        Ok(table)
    }

    /// Seat a player, drawing `buy_in` from their wallet.
    ///
    /// The debit happens before the claim. If the claim then fails, the
    /// buy-in is refunded under the saga's idempotency key until the refund
    /// is durable; only if that is impossible does the join surface
    /// `ConsistencyFault`.
    ///
    /// # Errors
    ///
    /// * `TableError::TableNotFound` / `TableClosed`
    /// * `TableError::BuyInOutOfRange` - Buy-in outside the table's bounds
    /// * `TableError::Seat` - Invalid, taken or full; already seated
    /// * `TableError::Wallet` - Insufficient funds or missing wallet
    /// * `TableError::ConsistencyFault` - Refund could not be made durable
    ///
    /// The saga runs on its own task: dropping the returned future does not
    /// stop it between the debit and the claim.
    pub async fn join_table(
        &self,
        player: &PlayerRef,
        table_id: TableId,
        seat_number: u8,
        buy_in: i64,
    ) -> TableResult<Seat> {
        let manager = self.clone();
        let player = player.clone();
        detach(async move {
            manager
                .run_join(&player, table_id, seat_number, buy_in)
                .await
        })
        .await
    }

    async fn run_join(
        &self,
        player: &PlayerRef,
        table_id: TableId,
        seat_number: u8,
        buy_in: i64,
    ) -> TableResult<Seat> {
        let mut saga = Saga::begin(SagaKind::Join, player.id, table_id);

        let table = match self.check_join(player, table_id, seat_number, buy_in).await {
            Ok(table) => table,
            Err(e) => {
                saga.fail();
                return Err(e);
            }
        };

        if let Err(e) = self
            .wallets
            .debit(
                player.id,
                buy_in,
                TransactionKind::BuyIn,
                Some(table_id),
                saga.key("buyin"),
                Some(format!("Buy-in at {}", table.config.name)),
            )
            .await
        {
            saga.fail();
            return Err(e.into());
        }
        saga.advance(SagaState::FundsReserved);

        let change = match self.seats.claim(table_id, seat_number, player.id, buy_in).await {
            Ok(change) => change,
            Err(claim_err) => {
                return Err(self
                    .refund_buy_in(&mut saga, player, &table, buy_in, claim_err)
                    .await);
            }
        };
        saga.advance(SagaState::SeatClaimed);
        saga.advance(SagaState::Committed);

        log::info!(
            "{} sat at table {} seat {} with {} chips",
            player,
            table_id,
            seat_number,
            buy_in
        );

        self.rooms
            .broadcast(
                &RoomName::Table(table_id),
                EventKind::SeatTaken,
                player,
                payload(json!({
                    "seat_number": seat_number,
                    "chip_stack": buy_in,
                    "current_players": change.current_players,
                })),
            )
            .await;
        self.announce_table_update(player, &table, change.current_players)
            .await;

        Ok(change.seat)
    }

    /// Validation and pre-checks that run before any money moves.
    ///
    /// The seat pre-check is advisory; the claim itself is authoritative.
    async fn check_join(
        &self,
        player: &PlayerRef,
        table_id: TableId,
        seat_number: u8,
        buy_in: i64,
    ) -> TableResult<Table> {
        let table = self.load(table_id).await?;

        if !table.status.is_listed() {
            return Err(TableError::TableClosed(table_id));
        }

        if !table.has_seat(seat_number) {
            return Err(SeatError::InvalidSeatNumber {
                seat_number,
                max_players: table.config.max_players,
            }
            .into());
        }

        if !table.config.accepts_buy_in(buy_in) {
            return Err(TableError::BuyInOutOfRange {
                buy_in,
                min: table.config.min_buy_in,
                max: table.config.max_buy_in,
            });
        }

        let seats = self.seats.seats_at(table_id).await?;
        if seats.iter().any(|s| s.player_id == player.id) {
            return Err(SeatError::AlreadySeated(player.id).into());
        }
        if seats.iter().any(|s| s.seat_number == seat_number) {
            return Err(SeatError::SeatTaken(seat_number).into());
        }
        if table.is_full() {
            return Err(SeatError::TableFull.into());
        }

        Ok(table)
    }

    /// Compensate a debit whose seat claim failed
    async fn refund_buy_in(
        &self,
        saga: &mut Saga,
        player: &PlayerRef,
        table: &Table,
        buy_in: i64,
        claim_err: SeatError,
    ) -> TableError {
        saga.advance(SagaState::Compensating);
        log::warn!(
            "Seat claim for {} at table {} failed after debit ({}); refunding {}",
            player,
            table.id,
            claim_err,
            buy_in
        );

        let refund = self
            .wallets
            .credit_until_durable(
                player.id,
                buy_in,
                TransactionKind::Refund,
                Some(table.id),
                saga.key("refund"),
                Some(format!("Refund of buy-in at {}", table.config.name)),
            )
            .await;
        saga.advance(SagaState::Failed);

        match refund {
            Ok(_) => claim_err.into(),
            Err(source) => {
                log::error!(
                    target: "reconciliation",
                    "saga {}: refund of {} to player {} for table {} not durable: {}",
                    saga.id(),
                    buy_in,
                    player.id,
                    table.id,
                    source
                );
                TableError::ConsistencyFault {
                    player_id: player.id,
                    table_id: table.id,
                    amount: buy_in,
                    operation: "join refund",
                    source,
                }
            }
        }
    }

    /// Vacate the player's seat and cash the stack out to their wallet.
    ///
    /// The release is never undone. The cash-out credit is retried until
    /// durable; if that fails the seat stays vacated and the error is
    /// `ConsistencyFault`.
    ///
    /// # Returns
    ///
    /// * `TableResult<i64>` - Chips credited back to the wallet
    ///
    /// Like `join_table`, the saga runs to completion on its own task.
    pub async fn leave_table(&self, player: &PlayerRef, table_id: TableId) -> TableResult<i64> {
        let manager = self.clone();
        let player = player.clone();
        detach(async move { manager.run_leave(&player, table_id).await }).await
    }

    async fn run_leave(&self, player: &PlayerRef, table_id: TableId) -> TableResult<i64> {
        let mut saga = Saga::begin(SagaKind::Leave, player.id, table_id);

        let table = match self.load(table_id).await {
            Ok(table) => table,
            Err(e) => {
                saga.fail();
                return Err(e);
            }
        };

        let change = match self.seats.release(table_id, player.id).await {
            Ok(change) => change,
            Err(e) => {
                saga.fail();
                return Err(e.into());
            }
        };
        saga.advance(SagaState::SeatReleased);

        let stack = change.seat.chip_stack;
        let mut fault = None;
        if stack > 0 {
            let credit = self
                .wallets
                .credit_until_durable(
                    player.id,
                    stack,
                    TransactionKind::CashOut,
                    Some(table_id),
                    saga.key("cashout"),
                    Some(format!("Cash-out from {}", table.config.name)),
                )
                .await;

            if let Err(source) = credit {
                saga.fail();
                log::error!(
                    target: "reconciliation",
                    "saga {}: cash-out of {} to player {} from table {} not durable: {}",
                    saga.id(),
                    stack,
                    player.id,
                    table_id,
                    source
                );
                fault = Some(TableError::ConsistencyFault {
                    player_id: player.id,
                    table_id,
                    amount: stack,
                    operation: "leave cash-out",
                    source,
                });
            }
        }
        if fault.is_none() {
            saga.advance(SagaState::Committed);
            log::info!(
                "{} left table {} seat {} with {} chips",
                player,
                table_id,
                change.seat.seat_number,
                stack
            );
        }

        // The seat is gone either way
        self.rooms
            .broadcast(
                &RoomName::Table(table_id),
                EventKind::SeatVacated,
                player,
                payload(json!({
                    "seat_number": change.seat.seat_number,
                    "chip_stack": stack,
                    "current_players": change.current_players,
                })),
            )
            .await;
        self.announce_table_update(player, &table, change.current_players)
            .await;

        match fault {
            Some(err) => Err(err),
            None => Ok(stack),
        }
    }

    async fn announce_table_update(&self, actor: &PlayerRef, table: &Table, current_players: u8) {
        self.rooms
            .broadcast(
                &RoomName::Lobby,
                EventKind::TableUpdated,
                actor,
                payload(json!({
                    "table_id": table.id,
                    "current_players": current_players,
                    "max_players": table.config.max_players,
                })),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MemoryStore, rooms::RoomEvent, wallet::WalletError};
    use tokio::sync::mpsc;

    struct Fixture {
        manager: TableManager,
        wallets: Arc<WalletManager>,
        rooms: Arc<RoomCoordinator>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let config = LobbyConfig::default();
        let wallets = Arc::new(WalletManager::new(store.clone(), &config));
        let rooms = Arc::new(RoomCoordinator::new(64));
        let manager = TableManager::new(
            store.clone(),
            SeatRegistry::new(store),
            wallets.clone(),
            rooms.clone(),
            &config,
        );
        Fixture {
            manager,
            wallets,
            rooms,
        }
    }

    fn alice() -> PlayerRef {
        PlayerRef::new(1, "alice")
    }

    async fn watch(
        rooms: &RoomCoordinator,
        room: RoomName,
    ) -> mpsc::Receiver<Arc<RoomEvent>> {
        let (conn, rx) = rooms.register(PlayerRef::new(99, "watcher")).await;
        rooms.join_room(conn, room).await.unwrap();
        rx
    }

    #[tokio::test]
    async fn test_create_table_validates_and_announces() {
        let f = fixture();
        let mut lobby = watch(&f.rooms, RoomName::Lobby).await;

        let err = f
            .manager
            .create_table(
                &alice(),
                TableConfig {
                    small_blind: 10,
                    big_blind: 10,
                    ..TableConfig::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TableError::InvalidConfig(_)));

        let table = f
            .manager
            .create_table(&alice(), TableConfig::default())
            .await
            .unwrap();
        assert_eq!(table.created_by, 1);

        let event = lobby.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::TableCreated);
        assert_eq!(event.data["table"]["name"], "Default Table");
        assert!(lobby.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_join_then_leave_restores_balance() {
        let f = fixture();
        f.wallets.open_wallet(1).await.unwrap();
        let table = f
            .manager
            .create_table(&alice(), TableConfig::default())
            .await
            .unwrap();
        let mut table_room = watch(&f.rooms, RoomName::Table(table.id)).await;

        let seat = f.manager.join_table(&alice(), table.id, 3, 200).await.unwrap();
        assert_eq!(seat.seat_number, 3);
        assert_eq!(f.wallets.get_wallet(1).await.unwrap().balance, 800);

        let event = table_room.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::SeatTaken);
        assert_eq!(event.data["current_players"], 1);

        assert_eq!(f.manager.leave_table(&alice(), table.id).await.unwrap(), 200);
        let wallet = f.wallets.get_wallet(1).await.unwrap();
        assert_eq!(wallet.balance, 1000);
        // Buy-ins and cash-outs are internal moves, not deposits or payouts
        assert_eq!((wallet.total_deposited, wallet.total_withdrawn), (0, 0));
        assert_eq!(table_room.try_recv().unwrap().kind, EventKind::SeatVacated);

        let details = f.manager.get_table(table.id).await.unwrap();
        assert!(details.seats.is_empty());
        assert_eq!(details.table.current_players, 0);
    }

    #[tokio::test]
    async fn test_join_rejections_leave_wallet_alone() {
        let f = fixture();
        f.wallets.open_wallet(1).await.unwrap();
        let table = f
            .manager
            .create_table(&alice(), TableConfig::default())
            .await
            .unwrap();

        assert!(matches!(
            f.manager.join_table(&alice(), table.id, 3, 600).await,
            Err(TableError::BuyInOutOfRange { buy_in: 600, .. })
        ));
        assert!(matches!(
            f.manager.join_table(&alice(), table.id, 10, 200).await,
            Err(TableError::Seat(SeatError::InvalidSeatNumber { .. }))
        ));
        assert!(matches!(
            f.manager.join_table(&alice(), uuid::Uuid::new_v4(), 1, 200).await,
            Err(TableError::TableNotFound(_))
        ));

        assert_eq!(f.wallets.get_wallet(1).await.unwrap().balance, 1000);
        assert!(f.wallets.history(1, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_join_without_funds() {
        let f = fixture();
        f.wallets.open_wallet(1).await.unwrap();
        let table = f
            .manager
            .create_table(
                &alice(),
                TableConfig {
                    min_buy_in: 500,
                    max_buy_in: 5000,
                    ..TableConfig::default()
                },
            )
            .await
            .unwrap();

        let err = f
            .manager
            .join_table(&alice(), table.id, 1, 1500)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TableError::Wallet(WalletError::InsufficientFunds { .. })
        ));
        assert!(f.manager.seats().seats_at(table.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_leave_when_not_seated() {
        let f = fixture();
        let table = f
            .manager
            .create_table(&alice(), TableConfig::default())
            .await
            .unwrap();

        assert!(matches!(
            f.manager.leave_table(&alice(), table.id).await,
            Err(TableError::Seat(SeatError::NotSeated(1)))
        ));
    }

    #[tokio::test]
    async fn test_listing_pages() {
        let f = fixture();
        for i in 0..3 {
            f.manager
                .create_table(
                    &alice(),
                    TableConfig {
                        name: format!("Table {}", i),
                        ..TableConfig::default()
                    },
                )
                .await
                .unwrap();
        }

        assert_eq!(f.manager.list_tables(Page::default()).await.unwrap().len(), 3);
        assert_eq!(f.manager.list_tables(Page::new(2, 0)).await.unwrap().len(), 2);
        assert_eq!(f.manager.list_tables(Page::new(2, 2)).await.unwrap().len(), 1);
    }
}
