//! WebSocket handler for realtime room membership.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws?token=<jwt_token>`
//! 2. Server validates the token and registers the connection with the
//!    room coordinator
//! 3. A send task forwards room events and direct replies to the socket
//! 4. The receive loop handles client messages until the socket closes
//! 5. The connection is removed from every room it joined; remaining
//!    members get `member-disconnected`
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws?token=eyJhbGc...');
//! ws.send(JSON.stringify({ type: "lobby_join" }));
//! ws.send(JSON.stringify({ type: "chat", table_id: "…", message: "gl hf" }));
//! ```

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use poker_lobby::{
    auth::PlayerRef,
    rooms::{ConnectionId, EventKind, RoomError, RoomEvent, RoomName},
    table::TableId,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;

use super::AppState;
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: String,
}

/// Client messages received via WebSocket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    LobbyJoin,
    LobbyLeave,
    TableJoin {
        table_id: TableId,
    },
    TableLeave {
        table_id: TableId,
    },
    /// Echoed to the table room without validation
    PlayerAction {
        table_id: TableId,
        action: String,
        amount: Option<i64>,
    },
    Chat {
        table_id: TableId,
        message: String,
    },
}

/// Messages sent to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage<'a> {
    Joined {
        room: RoomName,
        members: Vec<PlayerRef>,
    },
    Left {
        room: RoomName,
    },
    Ack {
        message: String,
    },
    Error {
        message: String,
    },
    Event {
        event: &'a RoomEvent,
    },
}

impl ServerMessage<'_> {
    fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    fn room_error(err: RoomError) -> Self {
        ServerMessage::error(err.client_message())
    }
}

/// Upgrade HTTP connection to WebSocket.
///
/// Returns `401 Unauthorized` without upgrading when the token is invalid.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let player = match state.verifier.verify(&query.token) {
        Ok(player) => player,
        Err(e) => {
            log_security_event("invalid_token", None, "/ws", &e.to_string());
            return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, player, state))
}

/// Drive one established connection until it closes.
async fn handle_socket(socket: WebSocket, player: PlayerRef, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let rooms = state.lobby.rooms.clone();

    let (connection, mut events) = rooms.register(player.clone()).await;
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(rooms.connection_count().await);
    tracing::info!(%connection, player_id = player.id, "WebSocket connected");

    // Direct replies from the receive loop
    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(32);

    let send_task = tokio::spawn(async move {
        loop {
            let text = tokio::select! {
                Some(event) = events.recv() => {
                    match serde_json::to_string(&ServerMessage::Event { event: &event }) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!("Failed to serialize room event: {}", e);
                            continue;
                        }
                    }
                }
                Some(reply) = reply_rx.recv() => reply,
                else => break,
            };

            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let reply = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        handle_client_message(client_msg, connection, &player, &state).await
                    }
                    Err(e) => {
                        tracing::debug!(%connection, "Failed to parse client message: {}", e);
                        ServerMessage::error("Invalid message format")
                    }
                };

                match serde_json::to_string(&reply) {
                    Ok(json) => {
                        if reply_tx.send(json).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::error!("Failed to serialize reply: {}", e),
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!(%connection, "WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();

    match rooms.on_disconnect(connection).await {
        Ok(report) => {
            metrics::room_events_fanned_out(EventKind::MemberDisconnected.as_str(), report.notified);
            tracing::info!(
                %connection,
                player_id = player.id,
                rooms = report.rooms.len(),
                notified = report.notified,
                "WebSocket disconnected"
            );
        }
        Err(e) => tracing::warn!(%connection, "Disconnect cleanup skipped: {}", e),
    }
    metrics::websocket_connections_active(rooms.connection_count().await);
}

/// Apply one client message and build the direct reply.
async fn handle_client_message(
    msg: ClientMessage,
    connection: ConnectionId,
    player: &PlayerRef,
    state: &AppState,
) -> ServerMessage<'static> {
    match msg {
        ClientMessage::LobbyJoin => join(state, connection, RoomName::Lobby).await,
        ClientMessage::LobbyLeave => leave(state, connection, RoomName::Lobby).await,

        ClientMessage::TableJoin { table_id } => {
            if let Err(err) = state.lobby.tables.get_table(table_id).await {
                return ServerMessage::error(err.client_message());
            }
            join(state, connection, RoomName::Table(table_id)).await
        }
        ClientMessage::TableLeave { table_id } => {
            leave(state, connection, RoomName::Table(table_id)).await
        }

        ClientMessage::PlayerAction {
            table_id,
            action,
            amount,
        } => {
            tracing::debug!(player_id = player.id, %table_id, "Action {}", action);
            let data = payload(json!({ "action": action, "amount": amount }));
            relay(state, connection, table_id, EventKind::ActionReceived, data).await
        }

        ClientMessage::Chat { table_id, message } => {
            let max_len = state.lobby.config.chat_max_len;
            let message: String = message.chars().take(max_len).collect();
            if message.trim().is_empty() {
                return ServerMessage::error("Message is empty");
            }
            let data = payload(json!({ "message": message }));
            relay(state, connection, table_id, EventKind::ChatMessage, data).await
        }
    }
}

async fn join(state: &AppState, connection: ConnectionId, room: RoomName) -> ServerMessage<'static> {
    match state.lobby.rooms.join_room(connection, room).await {
        Ok(outcome) => {
            if outcome.joined {
                let others = outcome.members.len().saturating_sub(1);
                metrics::room_events_fanned_out(EventKind::MemberJoined.as_str(), others);
            }
            ServerMessage::Joined {
                room: outcome.room,
                members: outcome.members,
            }
        }
        Err(err) => ServerMessage::room_error(err),
    }
}

async fn leave(state: &AppState, connection: ConnectionId, room: RoomName) -> ServerMessage<'static> {
    // Leaving a room the connection is not in is a no-op, not an error
    match state.lobby.rooms.leave_room(connection, &room).await {
        Ok(_) => ServerMessage::Left { room },
        Err(err) => ServerMessage::room_error(err),
    }
}

async fn relay(
    state: &AppState,
    connection: ConnectionId,
    table_id: TableId,
    kind: EventKind,
    data: Map<String, Value>,
) -> ServerMessage<'static> {
    let room = RoomName::Table(table_id);
    match state.lobby.rooms.relay(connection, &room, kind, data).await {
        Ok(delivered) => {
            metrics::room_events_fanned_out(kind.as_str(), delivered);
            ServerMessage::Ack {
                message: format!("{} delivered to {} member(s)", kind.as_str(), delivered),
            }
        }
        Err(err) => ServerMessage::room_error(err),
    }
}

fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
