//! Room coordinator: connection lifecycle, room membership and fan-out.
//!
//! Two indexes are kept in step:
//! - forward: room -> member connections, each room behind its own lock
//! - reverse: connection -> joined rooms, behind the connection's own lock
//!
//! Lock order is room, then connection. Disconnect never holds a connection
//! lock while waiting for a room, so the two orders cannot deadlock. The room
//! index lock is never held while waiting for a room lock.

use super::{
    errors::{RoomError, RoomResult},
    models::{ConnectionId, DisconnectReport, EventKind, JoinOutcome, RoomEvent, RoomName},
};
use crate::auth::PlayerRef;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, mpsc};
use uuid::Uuid;

/// Lifecycle entry of one live connection
struct ConnectionEntry {
    id: ConnectionId,
    player: PlayerRef,
    outbox: mpsc::Sender<Arc<RoomEvent>>,
    /// Joined rooms; `None` once the connection is closed
    rooms: Mutex<Option<HashSet<RoomName>>>,
}

impl ConnectionEntry {
    /// Queue an event without waiting
    fn push(&self, event: &Arc<RoomEvent>) -> bool {
        match self.outbox.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!(
                    "Outbox of connection {} ({}) full, dropping {:?} for {}",
                    self.id,
                    self.player,
                    event.kind,
                    event.room
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Disconnect cleanup will remove the membership
                log::debug!("Outbox of connection {} closed, skipping", self.id);
                false
            }
        }
    }
}

#[derive(Default)]
struct Room {
    members: HashMap<ConnectionId, Arc<ConnectionEntry>>,
    /// Set when the room emptied and left the index; joiners must start over
    retired: bool,
}

impl Room {
    /// Queue `event` for every member except `skip`, returning how many
    /// outboxes accepted it
    fn fan_out(&self, event: &Arc<RoomEvent>, skip: Option<ConnectionId>) -> usize {
        self.members
            .iter()
            .filter(|(id, _)| Some(**id) != skip)
            .filter(|(_, member)| member.push(event))
            .count()
    }

    fn roster(&self) -> Vec<PlayerRef> {
        let mut players: Vec<_> = self.members.values().map(|m| m.player.clone()).collect();
        players.sort_by_key(|p| p.id);
        players
    }
}

/// Room coordinator
pub struct RoomCoordinator {
    connections: RwLock<HashMap<ConnectionId, Arc<ConnectionEntry>>>,
    rooms: RwLock<HashMap<RoomName, Arc<Mutex<Room>>>>,
    outbox_capacity: usize,
}

impl RoomCoordinator {
    /// Create a coordinator whose connections buffer up to `outbox_capacity`
    /// undelivered events each
    pub fn new(outbox_capacity: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
            outbox_capacity: outbox_capacity.max(1),
        }
    }

    /// Register a live connection and hand back its event stream
    pub async fn register(&self, player: PlayerRef) -> (ConnectionId, mpsc::Receiver<Arc<RoomEvent>>) {
        let (outbox, inbox) = mpsc::channel(self.outbox_capacity);
        let id = Uuid::new_v4();

        let entry = Arc::new(ConnectionEntry {
            id,
            player,
            outbox,
            rooms: Mutex::new(Some(HashSet::new())),
        });

        log::debug!("Registered connection {} for {}", id, entry.player);
        self.connections.write().await.insert(id, entry);

        (id, inbox)
    }

    async fn entry(&self, connection: ConnectionId) -> RoomResult<Arc<ConnectionEntry>> {
        self.connections
            .read()
            .await
            .get(&connection)
            .cloned()
            .ok_or(RoomError::UnknownConnection(connection))
    }

    async fn find_room(&self, room: &RoomName) -> Option<Arc<Mutex<Room>>> {
        self.rooms.read().await.get(room).cloned()
    }

    async fn room_or_create(&self, room: &RoomName) -> Arc<Mutex<Room>> {
        if let Some(existing) = self.find_room(room).await {
            return existing;
        }
        self.rooms
            .write()
            .await
            .entry(room.clone())
            .or_default()
            .clone()
    }

    /// Drop an empty room from the index. Caller holds the room lock.
    async fn retire(&self, name: &RoomName, handle: &Arc<Mutex<Room>>, room: &mut Room) {
        room.retired = true;

        let mut rooms = self.rooms.write().await;
        if rooms.get(name).is_some_and(|current| Arc::ptr_eq(current, handle)) {
            rooms.remove(name);
            log::debug!("Retired empty room {}", name);
        }
    }

    /// Add a connection to a room.
    ///
    /// On first join every other member receives `member-joined`. The joiner
    /// gets the returned [`JoinOutcome`] instead of the broadcast. Joining a
    /// room twice is a no-op reported with `joined: false`.
    ///
    /// # Errors
    ///
    /// * `RoomError::UnknownConnection` - Connection unknown or already closed
    pub async fn join_room(&self, connection: ConnectionId, room: RoomName) -> RoomResult<JoinOutcome> {
        let entry = self.entry(connection).await?;

        loop {
            let handle = self.room_or_create(&room).await;
            let mut members = handle.lock().await;
            if members.retired {
                continue;
            }

            let mut conn_rooms = entry.rooms.lock().await;
            let Some(joined_rooms) = conn_rooms.as_mut() else {
                drop(conn_rooms);
                drop(members);
                // Never leave an empty room behind for a join that lost the
                // race against disconnect
                self.retire_if_empty(&room, &handle).await;
                return Err(RoomError::UnknownConnection(connection));
            };

            if members.members.contains_key(&connection) {
                return Ok(JoinOutcome {
                    room,
                    joined: false,
                    members: members.roster(),
                });
            }

            let event = Arc::new(RoomEvent::new(
                EventKind::MemberJoined,
                room.clone(),
                entry.player.clone(),
                Map::new(),
            ));
            members.fan_out(&event, None);

            members.members.insert(connection, entry.clone());
            joined_rooms.insert(room.clone());

            log::debug!("{} joined {}", entry.player, room);

            return Ok(JoinOutcome {
                room,
                joined: true,
                members: members.roster(),
            });
        }
    }

    async fn retire_if_empty(&self, name: &RoomName, handle: &Arc<Mutex<Room>>) {
        let mut room = handle.lock().await;
        if !room.retired && room.members.is_empty() {
            self.retire(name, handle, &mut room).await;
        }
    }

    /// Remove a connection from a room, telling the remaining members.
    ///
    /// Returns false without error when the connection was not a member.
    pub async fn leave_room(&self, connection: ConnectionId, room: &RoomName) -> RoomResult<bool> {
        let entry = self.entry(connection).await?;

        let Some(handle) = self.find_room(room).await else {
            return Ok(false);
        };
        let mut members = handle.lock().await;
        if members.retired || members.members.remove(&connection).is_none() {
            return Ok(false);
        }

        if let Some(joined_rooms) = entry.rooms.lock().await.as_mut() {
            joined_rooms.remove(room);
        }

        let event = Arc::new(RoomEvent::new(
            EventKind::MemberLeft,
            room.clone(),
            entry.player.clone(),
            Map::new(),
        ));
        members.fan_out(&event, None);

        if members.members.is_empty() {
            self.retire(room, &handle, &mut members).await;
        }

        log::debug!("{} left {}", entry.player, room);
        Ok(true)
    }

    /// Best-effort delivery to every current member of `room`
    ///
    /// Returns how many members had the event queued.
    pub async fn broadcast(
        &self,
        room: &RoomName,
        kind: EventKind,
        actor: &PlayerRef,
        data: Map<String, Value>,
    ) -> usize {
        let Some(handle) = self.find_room(room).await else {
            return 0;
        };

        let event = Arc::new(RoomEvent::new(kind, room.clone(), actor.clone(), data));
        let members = handle.lock().await;
        members.fan_out(&event, None)
    }

    /// Broadcast on behalf of a member, e.g. chat or an action echo
    ///
    /// # Errors
    ///
    /// * `RoomError::UnknownConnection` - Connection unknown or closed
    /// * `RoomError::NotMember` - Connection has not joined `room`
    pub async fn relay(
        &self,
        connection: ConnectionId,
        room: &RoomName,
        kind: EventKind,
        data: Map<String, Value>,
    ) -> RoomResult<usize> {
        let entry = self.entry(connection).await?;
        let handle = self
            .find_room(room)
            .await
            .ok_or_else(|| RoomError::NotMember(room.clone()))?;

        let members = handle.lock().await;
        if !members.members.contains_key(&connection) {
            return Err(RoomError::NotMember(room.clone()));
        }

        let event = Arc::new(RoomEvent::new(kind, room.clone(), entry.player.clone(), data));
        Ok(members.fan_out(&event, None))
    }

    /// Tear down a connection.
    ///
    /// The entry is closed first so no join can race the cleanup. Then every
    /// room it belonged to loses the membership and its other members get
    /// exactly one `member-disconnected`.
    pub async fn on_disconnect(&self, connection: ConnectionId) -> RoomResult<DisconnectReport> {
        let entry = self
            .connections
            .write()
            .await
            .remove(&connection)
            .ok_or(RoomError::UnknownConnection(connection))?;

        let joined = entry.rooms.lock().await.take().unwrap_or_default();
        let mut joined: Vec<_> = joined.into_iter().collect();
        joined.sort();

        let mut report = DisconnectReport {
            connection,
            player: entry.player.clone(),
            rooms: Vec::with_capacity(joined.len()),
            notified: 0,
        };

        for room in joined {
            let Some(handle) = self.find_room(&room).await else {
                continue;
            };
            let mut members = handle.lock().await;
            if members.members.remove(&connection).is_none() {
                continue;
            }

            let event = Arc::new(RoomEvent::new(
                EventKind::MemberDisconnected,
                room.clone(),
                entry.player.clone(),
                Map::new(),
            ));
            report.notified += members.fan_out(&event, Some(connection));

            if members.members.is_empty() {
                self.retire(&room, &handle, &mut members).await;
            }
            report.rooms.push(room);
        }

        log::debug!(
            "Connection {} of {} closed, removed from {} rooms",
            connection,
            entry.player,
            report.rooms.len()
        );
        Ok(report)
    }

    /// Rooms a connection currently belongs to
    pub async fn rooms_of(&self, connection: ConnectionId) -> RoomResult<Vec<RoomName>> {
        let entry = self.entry(connection).await?;
        let joined = entry.rooms.lock().await;
        let mut rooms: Vec<_> = joined.iter().flatten().cloned().collect();
        rooms.sort();
        Ok(rooms)
    }

    /// Players currently in a room, ordered by player id
    pub async fn members_of(&self, room: &RoomName) -> Vec<PlayerRef> {
        match self.find_room(room).await {
            Some(handle) => handle.lock().await.roster(),
            None => Vec::new(),
        }
    }

    /// Number of live connections
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of non-empty rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
