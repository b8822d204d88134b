//! Integration tests against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL` pointing at a scratch database and
//! `cargo test -- --ignored`.

use poker_lobby::auth::{PlayerId, PlayerRef};
use poker_lobby::db::{Database, DatabaseConfig};
use poker_lobby::seating::SeatError;
use poker_lobby::table::{TableConfig, TableError};
use poker_lobby::wallet::{TransactionKind, WalletError};
use poker_lobby::{Lobby, LobbyConfig};
use std::sync::Arc;

/// Helper to connect and make sure the schema exists
async fn setup_lobby() -> Lobby {
    let config = DatabaseConfig {
        max_connections: 10,
        min_connections: 1,
        connection_timeout_secs: 5,
        ..DatabaseConfig::from_env()
    };

    let db = Database::new(&config)
        .await
        .expect("Failed to create test database");
    db.run_migrations().await.expect("Failed to apply schema");

    Lobby::new(Arc::new(db.store()), LobbyConfig::default())
}

/// Player id unlikely to collide with earlier runs
fn fresh_player(name: &str) -> PlayerRef {
    let id: PlayerId = rand::random_range(1_000_000..i64::MAX);
    PlayerRef::new(id, name)
}

#[tokio::test]
#[ignore = "Requires database setup"]
async fn test_join_and_leave_round_trip() {
    let lobby = setup_lobby().await;
    let alice = fresh_player("alice");
    lobby.wallets.open_wallet(alice.id).await.unwrap();

    let table = lobby
        .tables
        .create_table(&alice, TableConfig::default())
        .await
        .unwrap();

    lobby.tables.join_table(&alice, table.id, 3, 200).await.unwrap();
    assert_eq!(lobby.wallets.get_wallet(alice.id).await.unwrap().balance, 800);

    let details = lobby.tables.get_table(table.id).await.unwrap();
    assert_eq!(details.table.current_players, 1);
    assert_eq!(details.seats[0].seat_number, 3);

    assert_eq!(lobby.tables.leave_table(&alice, table.id).await.unwrap(), 200);
    assert_eq!(lobby.wallets.get_wallet(alice.id).await.unwrap().balance, 1000);

    let history = lobby.wallets.history(alice.id, 10).await.unwrap();
    assert_eq!(history[0].kind, TransactionKind::CashOut);
    assert_eq!(history[1].kind, TransactionKind::BuyIn);
}

#[tokio::test]
#[ignore = "Requires database setup"]
async fn test_unique_constraints_decide_races() {
    let lobby = Arc::new(setup_lobby().await);
    let owner = fresh_player("owner");
    let table = lobby
        .tables
        .create_table(&owner, TableConfig::default())
        .await
        .unwrap();

    let players: Vec<_> = (0..6).map(|i| fresh_player(&format!("p{}", i))).collect();
    for p in &players {
        lobby.wallets.open_wallet(p.id).await.unwrap();
    }

    let mut handles = Vec::new();
    for p in players.clone() {
        let lobby = lobby.clone();
        let table_id = table.id;
        handles.push(tokio::spawn(async move {
            lobby.tables.join_table(&p, table_id, 1, 100).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(TableError::Seat(SeatError::SeatTaken(1))) => {}
            Err(other) => panic!("unexpected join error: {other}"),
        }
    }
    assert_eq!(winners, 1);

    let details = lobby.tables.get_table(table.id).await.unwrap();
    assert_eq!(details.table.current_players, 1);
}

#[tokio::test]
#[ignore = "Requires database setup"]
async fn test_debit_never_overdraws() {
    let lobby = setup_lobby().await;
    let alice = fresh_player("alice");
    lobby.wallets.open_wallet(alice.id).await.unwrap();

    let err = lobby
        .wallets
        .debit(
            alice.id,
            1001,
            TransactionKind::Withdrawal,
            None,
            format!("withdraw:{}", alice.id),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WalletError::InsufficientFunds {
            available: 1000,
            required: 1001,
            ..
        }
    ));
}
