//! Wiring of the lobby components over one storage backend.

use crate::{
    config::LobbyConfig,
    db::{MemoryStore, SeatRepository, TableRepository, WalletRepository},
    rooms::RoomCoordinator,
    seating::SeatRegistry,
    table::TableManager,
    wallet::WalletManager,
};
use std::sync::Arc;

/// The wallet ledger, table manager and room coordinator sharing one store
#[derive(Clone)]
pub struct Lobby {
    pub config: LobbyConfig,
    pub wallets: Arc<WalletManager>,
    pub tables: Arc<TableManager>,
    pub rooms: Arc<RoomCoordinator>,
}

impl Lobby {
    /// Build every component on top of `store`
    pub fn new<S>(store: Arc<S>, config: LobbyConfig) -> Self
    where
        S: WalletRepository + SeatRepository + TableRepository + 'static,
    {
        let wallets = Arc::new(WalletManager::new(store.clone(), &config));
        let rooms = Arc::new(RoomCoordinator::new(config.room_outbox_capacity));
        let tables = Arc::new(TableManager::new(
            store.clone(),
            SeatRegistry::new(store),
            wallets.clone(),
            rooms.clone(),
            &config,
        ));

        Self {
            config,
            wallets,
            tables,
            rooms,
        }
    }

    /// Lobby backed by the in-process store
    pub fn in_memory(config: LobbyConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }
}
