//! Integration tests for the join/leave sagas.
//!
//! Covers the end-to-end buy-in and cash-out flow, concurrent claims on the
//! same seat, and compensation when storage fails midway. Storage faults are
//! injected by wrapping the in-memory store.

use async_trait::async_trait;
use poker_lobby::auth::{PlayerId, PlayerRef};
use poker_lobby::config::{LobbyConfig, RetryPolicy};
use poker_lobby::db::{MemoryStore, SeatRepository, TableRepository, WalletRepository};
use poker_lobby::rooms::{EventKind, RoomCoordinator, RoomName};
use poker_lobby::seating::{Seat, SeatChange, SeatClaim, SeatError, SeatRegistry, SeatResult};
use poker_lobby::table::{TableConfig, TableError, TableId, TableManager, TableStatus};
use poker_lobby::wallet::{
    Adjustment, Transaction, TransactionKind, Wallet, WalletError, WalletManager, WalletResult,
};
use poker_lobby::{ErrorKind, Lobby};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn player(id: PlayerId) -> PlayerRef {
    PlayerRef::new(id, format!("player{}", id))
}

fn table_config() -> TableConfig {
    TableConfig {
        name: "Main".to_string(),
        min_buy_in: 50,
        max_buy_in: 500,
        ..TableConfig::default()
    }
}

fn fast_retry_config() -> LobbyConfig {
    LobbyConfig {
        compensation: RetryPolicy::immediate(3),
        ..LobbyConfig::default()
    }
}

/// Wallet store whose credits of one kind fail a set number of times.
///
/// With `commit_first`, the failing attempts still reach the inner store, as
/// if the commit succeeded but the reply was lost.
struct FlakyWallets {
    inner: Arc<MemoryStore>,
    failing_kind: TransactionKind,
    failures_left: AtomicU32,
    commit_first: bool,
}

impl FlakyWallets {
    fn new(inner: Arc<MemoryStore>, failing_kind: TransactionKind, failures: u32) -> Self {
        Self {
            inner,
            failing_kind,
            failures_left: AtomicU32::new(failures),
            commit_first: false,
        }
    }
}

#[async_trait]
impl WalletRepository for FlakyWallets {
    async fn get_wallet(&self, player_id: PlayerId) -> WalletResult<Wallet> {
        self.inner.get_wallet(player_id).await
    }

    async fn open_wallet(&self, player_id: PlayerId, initial_balance: i64) -> WalletResult<Wallet> {
        self.inner.open_wallet(player_id, initial_balance).await
    }

    async fn apply(&self, adjustment: &Adjustment) -> WalletResult<i64> {
        if adjustment.kind == self.failing_kind
            && self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            if self.commit_first {
                self.inner.apply(adjustment).await?;
            }
            return Err(WalletError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.apply(adjustment).await
    }

    async fn get_entries(&self, player_id: PlayerId, limit: i64) -> WalletResult<Vec<Transaction>> {
        self.inner.get_entries(player_id, limit).await
    }
}

/// Seat store that loses every claim, as if another player won a race after
/// the pre-check
struct LosingSeats {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl SeatRepository for LosingSeats {
    async fn claim_seat(&self, claim: &SeatClaim) -> SeatResult<SeatChange> {
        Err(SeatError::SeatTaken(claim.seat_number))
    }

    async fn release_seat(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<SeatChange> {
        self.inner.release_seat(table_id, player_id).await
    }

    async fn seats_at(&self, table_id: TableId) -> SeatResult<Vec<Seat>> {
        self.inner.seats_at(table_id).await
    }

    async fn find_seat(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<Option<Seat>> {
        self.inner.find_seat(table_id, player_id).await
    }
}

/// Wallet store that stalls before applying adjustments of one kind
struct SlowWallets {
    inner: Arc<MemoryStore>,
    slow_kind: TransactionKind,
    delay: Duration,
}

#[async_trait]
impl WalletRepository for SlowWallets {
    async fn get_wallet(&self, player_id: PlayerId) -> WalletResult<Wallet> {
        self.inner.get_wallet(player_id).await
    }

    async fn open_wallet(&self, player_id: PlayerId, initial_balance: i64) -> WalletResult<Wallet> {
        self.inner.open_wallet(player_id, initial_balance).await
    }

    async fn apply(&self, adjustment: &Adjustment) -> WalletResult<i64> {
        if adjustment.kind == self.slow_kind {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.apply(adjustment).await
    }

    async fn get_entries(&self, player_id: PlayerId, limit: i64) -> WalletResult<Vec<Transaction>> {
        self.inner.get_entries(player_id, limit).await
    }
}

/// Seat store that stalls before every claim
struct SlowSeats {
    inner: Arc<MemoryStore>,
    delay: Duration,
}

#[async_trait]
impl SeatRepository for SlowSeats {
    async fn claim_seat(&self, claim: &SeatClaim) -> SeatResult<SeatChange> {
        tokio::time::sleep(self.delay).await;
        self.inner.claim_seat(claim).await
    }

    async fn release_seat(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<SeatChange> {
        self.inner.release_seat(table_id, player_id).await
    }

    async fn seats_at(&self, table_id: TableId) -> SeatResult<Vec<Seat>> {
        self.inner.seats_at(table_id).await
    }

    async fn find_seat(&self, table_id: TableId, player_id: PlayerId) -> SeatResult<Option<Seat>> {
        self.inner.find_seat(table_id, player_id).await
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    wallets: Arc<WalletManager>,
    tables: TableManager,
    rooms: Arc<RoomCoordinator>,
}

fn harness(
    store: Arc<MemoryStore>,
    wallet_repo: Arc<dyn WalletRepository>,
    seat_repo: Arc<dyn SeatRepository>,
) -> Harness {
    let config = fast_retry_config();
    let wallets = Arc::new(WalletManager::new(wallet_repo, &config));
    let rooms = Arc::new(RoomCoordinator::new(64));
    let tables = TableManager::new(
        store.clone(),
        SeatRegistry::new(seat_repo),
        wallets.clone(),
        rooms.clone(),
        &config,
    );
    Harness {
        store,
        wallets,
        tables,
        rooms,
    }
}

#[tokio::test]
async fn test_end_to_end_buy_in_and_cash_out() {
    let lobby = Lobby::in_memory(LobbyConfig::default());
    let alice = player(1);
    assert_eq!(lobby.wallets.open_wallet(alice.id).await.unwrap().balance, 1000);

    let table = lobby
        .tables
        .create_table(&alice, table_config())
        .await
        .unwrap();

    let seat = lobby
        .tables
        .join_table(&alice, table.id, 3, 200)
        .await
        .unwrap();
    assert_eq!(seat.seat_number, 3);
    assert_eq!(seat.chip_stack, 200);
    assert_eq!(lobby.wallets.get_wallet(alice.id).await.unwrap().balance, 800);

    let details = lobby.tables.get_table(table.id).await.unwrap();
    assert_eq!(details.table.current_players, 1);
    assert_eq!(details.seats, vec![seat]);

    let cashed_out = lobby.tables.leave_table(&alice, table.id).await.unwrap();
    assert_eq!(cashed_out, 200);
    assert_eq!(lobby.wallets.get_wallet(alice.id).await.unwrap().balance, 1000);

    let details = lobby.tables.get_table(table.id).await.unwrap();
    assert_eq!(details.table.current_players, 0);
    assert!(details.seats.is_empty());

    let history = lobby.wallets.history(alice.id, 10).await.unwrap();
    let kinds: Vec<_> = history.iter().map(|t| (t.kind, t.amount)).collect();
    assert_eq!(
        kinds,
        vec![(TransactionKind::CashOut, 200), (TransactionKind::BuyIn, -200)]
    );
    assert!(history.iter().all(|t| t.table_id == Some(table.id)));
}

#[tokio::test]
async fn test_out_of_range_buy_in_has_no_side_effects() {
    let lobby = Lobby::in_memory(LobbyConfig::default());
    let alice = player(1);
    lobby.wallets.open_wallet(alice.id).await.unwrap();
    let table = lobby
        .tables
        .create_table(&alice, table_config())
        .await
        .unwrap();

    let err = lobby
        .tables
        .join_table(&alice, table.id, 3, 600)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TableError::BuyInOutOfRange {
            buy_in: 600,
            min: 50,
            max: 500
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(lobby.wallets.get_wallet(alice.id).await.unwrap().balance, 1000);
    assert!(lobby.wallets.history(alice.id, 10).await.unwrap().is_empty());
    let details = lobby.tables.get_table(table.id).await.unwrap();
    assert_eq!(details.table.current_players, 0);
}

#[tokio::test]
async fn test_join_while_seated_fails_already_seated() {
    let lobby = Lobby::in_memory(LobbyConfig::default());
    let alice = player(1);
    lobby.wallets.open_wallet(alice.id).await.unwrap();
    let table = lobby
        .tables
        .create_table(&alice, table_config())
        .await
        .unwrap();

    lobby.tables.join_table(&alice, table.id, 3, 200).await.unwrap();
    let err = lobby
        .tables
        .join_table(&alice, table.id, 4, 100)
        .await
        .unwrap_err();
    assert!(matches!(err, TableError::Seat(SeatError::AlreadySeated(1))));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // The rejected join never touched the wallet
    assert_eq!(lobby.wallets.get_wallet(alice.id).await.unwrap().balance, 800);
}

#[tokio::test]
async fn test_closed_table_rejects_join() {
    let store = Arc::new(MemoryStore::new());
    let lobby = Lobby::new(store.clone(), LobbyConfig::default());
    let alice = player(1);
    lobby.wallets.open_wallet(alice.id).await.unwrap();
    let table = lobby
        .tables
        .create_table(&alice, table_config())
        .await
        .unwrap();
    store.set_status(table.id, TableStatus::Closed).await.unwrap();

    assert!(matches!(
        lobby.tables.join_table(&alice, table.id, 1, 100).await,
        Err(TableError::TableClosed(_))
    ));
    assert!(lobby.tables.list_tables(Default::default()).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_same_seat_one_winner() {
    let lobby = Arc::new(Lobby::in_memory(LobbyConfig::default()));
    let owner = player(100);
    let table = lobby
        .tables
        .create_table(&owner, table_config())
        .await
        .unwrap();

    let players: Vec<_> = (1..=8).map(player).collect();
    for p in &players {
        lobby.wallets.open_wallet(p.id).await.unwrap();
    }

    let mut handles = Vec::new();
    for p in players.clone() {
        let lobby = lobby.clone();
        let table_id = table.id;
        handles.push(tokio::spawn(async move {
            lobby.tables.join_table(&p, table_id, 5, 200).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(seat) => {
                winners += 1;
                assert_eq!(seat.seat_number, 5);
            }
            Err(TableError::Seat(SeatError::SeatTaken(5))) => {}
            Err(other) => panic!("unexpected join error: {other}"),
        }
    }
    assert_eq!(winners, 1);

    let details = lobby.tables.get_table(table.id).await.unwrap();
    assert_eq!(details.seats.len(), 1);
    assert_eq!(details.table.current_players, 1);

    // Losers were either never debited or refunded
    let mut total = details.seats.iter().map(|s| s.chip_stack).sum::<i64>();
    for p in &players {
        total += lobby.wallets.get_wallet(p.id).await.unwrap().balance;
    }
    assert_eq!(total, 8 * 1000);
}

#[tokio::test]
async fn test_failed_claim_refunds_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let losing = Arc::new(LosingSeats {
        inner: store.clone(),
    });
    let h = harness(store.clone(), store.clone(), losing);

    let alice = player(1);
    h.wallets.open_wallet(alice.id).await.unwrap();
    let table = h.tables.create_table(&alice, table_config()).await.unwrap();

    let err = h
        .tables
        .join_table(&alice, table.id, 3, 200)
        .await
        .unwrap_err();
    assert!(matches!(err, TableError::Seat(SeatError::SeatTaken(3))));

    assert_eq!(h.wallets.get_wallet(alice.id).await.unwrap().balance, 1000);
    let history = h.wallets.history(alice.id, 10).await.unwrap();
    let refunds = history
        .iter()
        .filter(|t| t.kind == TransactionKind::Refund)
        .count();
    assert_eq!(refunds, 1);
    assert_eq!(history.len(), 2);
    assert!(h.store.seats_at(table.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_refund_retries_until_durable() {
    let store = Arc::new(MemoryStore::new());
    let wallets = Arc::new(FlakyWallets::new(store.clone(), TransactionKind::Refund, 2));
    let losing = Arc::new(LosingSeats {
        inner: store.clone(),
    });
    let h = harness(store.clone(), wallets, losing);

    let alice = player(1);
    h.wallets.open_wallet(alice.id).await.unwrap();
    let table = h.tables.create_table(&alice, table_config()).await.unwrap();

    let err = h
        .tables
        .join_table(&alice, table.id, 3, 200)
        .await
        .unwrap_err();
    assert!(matches!(err, TableError::Seat(SeatError::SeatTaken(3))));
    assert_eq!(h.wallets.get_wallet(alice.id).await.unwrap().balance, 1000);
}

#[tokio::test]
async fn test_refund_with_lost_reply_is_not_applied_twice() {
    let store = Arc::new(MemoryStore::new());
    let mut flaky = FlakyWallets::new(store.clone(), TransactionKind::Refund, 1);
    flaky.commit_first = true;
    let losing = Arc::new(LosingSeats {
        inner: store.clone(),
    });
    let h = harness(store.clone(), Arc::new(flaky), losing);

    let alice = player(1);
    h.wallets.open_wallet(alice.id).await.unwrap();
    let table = h.tables.create_table(&alice, table_config()).await.unwrap();

    assert!(h.tables.join_table(&alice, table.id, 3, 200).await.is_err());
    assert_eq!(h.wallets.get_wallet(alice.id).await.unwrap().balance, 1000);

    let refunds = h
        .wallets
        .history(alice.id, 10)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.kind == TransactionKind::Refund)
        .count();
    assert_eq!(refunds, 1);
}

#[tokio::test]
async fn test_exhausted_refund_is_consistency_fault() {
    let store = Arc::new(MemoryStore::new());
    let wallets = Arc::new(FlakyWallets::new(
        store.clone(),
        TransactionKind::Refund,
        u32::MAX,
    ));
    let losing = Arc::new(LosingSeats {
        inner: store.clone(),
    });
    let h = harness(store.clone(), wallets, losing);

    let alice = player(1);
    h.wallets.open_wallet(alice.id).await.unwrap();
    let table = h.tables.create_table(&alice, table_config()).await.unwrap();

    let err = h
        .tables
        .join_table(&alice, table.id, 3, 200)
        .await
        .unwrap_err();
    match &err {
        TableError::ConsistencyFault {
            player_id,
            table_id,
            amount,
            ..
        } => {
            assert_eq!(*player_id, 1);
            assert_eq!(*table_id, table.id);
            assert_eq!(*amount, 200);
        }
        other => panic!("expected consistency fault, got {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::ConsistencyFault);
    assert_eq!(h.wallets.get_wallet(alice.id).await.unwrap().balance, 800);
}

#[tokio::test]
async fn test_exhausted_cash_out_keeps_seat_released() {
    let store = Arc::new(MemoryStore::new());
    let wallets = Arc::new(FlakyWallets::new(
        store.clone(),
        TransactionKind::CashOut,
        u32::MAX,
    ));
    let h = harness(store.clone(), wallets, store.clone());

    let alice = player(1);
    h.wallets.open_wallet(alice.id).await.unwrap();
    let table = h.tables.create_table(&alice, table_config()).await.unwrap();
    h.tables.join_table(&alice, table.id, 3, 200).await.unwrap();

    let (watcher, mut events) = h.rooms.register(player(9)).await;
    h.rooms.join_room(watcher, RoomName::Table(table.id)).await.unwrap();
    h.rooms.join_room(watcher, RoomName::Lobby).await.unwrap();

    let err = h.tables.leave_table(&alice, table.id).await.unwrap_err();
    assert!(matches!(
        err,
        TableError::ConsistencyFault {
            amount: 200,
            operation: "leave cash-out",
            ..
        }
    ));

    // The release is never undone
    assert!(h.store.find_seat(table.id, alice.id).await.unwrap().is_none());
    assert_eq!(h.wallets.get_wallet(alice.id).await.unwrap().balance, 800);

    // Watchers still learn the seat is free
    let vacated = events.try_recv().unwrap();
    assert_eq!(vacated.kind, EventKind::SeatVacated);
    assert_eq!(vacated.data["seat_number"], 3);
    let updated = events.try_recv().unwrap();
    assert_eq!(updated.kind, EventKind::TableUpdated);
    assert_eq!(updated.data["current_players"], 0);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_cash_out_retries_until_durable() {
    let store = Arc::new(MemoryStore::new());
    let wallets = Arc::new(FlakyWallets::new(store.clone(), TransactionKind::CashOut, 2));
    let h = harness(store.clone(), wallets, store.clone());

    let alice = player(1);
    h.wallets.open_wallet(alice.id).await.unwrap();
    let table = h.tables.create_table(&alice, table_config()).await.unwrap();
    h.tables.join_table(&alice, table.id, 3, 200).await.unwrap();

    assert_eq!(h.tables.leave_table(&alice, table.id).await.unwrap(), 200);
    assert_eq!(h.wallets.get_wallet(alice.id).await.unwrap().balance, 1000);
}

async fn chips_in_play(h: &Harness, player_id: PlayerId, table_id: TableId) -> i64 {
    let balance = h.wallets.get_wallet(player_id).await.unwrap().balance;
    let stacks: i64 = h
        .store
        .seats_at(table_id)
        .await
        .unwrap()
        .iter()
        .map(|s| s.chip_stack)
        .sum();
    balance + stacks
}

#[tokio::test]
async fn test_dropped_join_still_completes() {
    let store = Arc::new(MemoryStore::new());
    let seats = Arc::new(SlowSeats {
        inner: store.clone(),
        delay: Duration::from_millis(200),
    });
    let h = harness(store.clone(), store.clone(), seats);

    let alice = player(1);
    h.wallets.open_wallet(alice.id).await.unwrap();
    let table = h.tables.create_table(&alice, table_config()).await.unwrap();

    // Caller gives up after the debit, while the claim is in flight
    let dropped = tokio::time::timeout(
        Duration::from_millis(50),
        h.tables.join_table(&alice, table.id, 3, 200),
    )
    .await;
    assert!(dropped.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;

    let seat = h.store.find_seat(table.id, alice.id).await.unwrap().unwrap();
    assert_eq!(seat.chip_stack, 200);
    assert_eq!(h.wallets.get_wallet(alice.id).await.unwrap().balance, 800);
    assert_eq!(chips_in_play(&h, alice.id, table.id).await, 1000);
}

#[tokio::test]
async fn test_dropped_leave_still_cashes_out() {
    let store = Arc::new(MemoryStore::new());
    let wallets = Arc::new(SlowWallets {
        inner: store.clone(),
        slow_kind: TransactionKind::CashOut,
        delay: Duration::from_millis(200),
    });
    let h = harness(store.clone(), wallets, store.clone());

    let alice = player(1);
    h.wallets.open_wallet(alice.id).await.unwrap();
    let table = h.tables.create_table(&alice, table_config()).await.unwrap();
    h.tables.join_table(&alice, table.id, 3, 200).await.unwrap();

    // Caller gives up after the release, while the cash-out is in flight
    let dropped = tokio::time::timeout(
        Duration::from_millis(50),
        h.tables.leave_table(&alice, table.id),
    )
    .await;
    assert!(dropped.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(h.store.find_seat(table.id, alice.id).await.unwrap().is_none());
    assert_eq!(h.wallets.get_wallet(alice.id).await.unwrap().balance, 1000);
    assert_eq!(chips_in_play(&h, alice.id, table.id).await, 1000);
}
