//! WebSocket and HTTP handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::domain::ConnectionId;
use crate::protocol::ClientEvent;
use crate::protocol::server::{RoomDetail, RoomSummary};

use super::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();

    // Channel carrying already-serialized events to this connection.
    let (tx, rx) = mpsc::unbounded_channel();

    let id = {
        let mut service = state.service.lock().await;
        service.on_connect(tx)
    };
    tracing::info!("Connection '{}' established", id);

    let mut send_task = pusher_loop(rx, sender);
    let mut recv_task = tokio::spawn(read_loop(receiver, state.clone(), id.clone()));

    // If either direction ends, tear down the other.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let mut service = state.service.lock().await;
    service.on_disconnect(&id);
}

/// Spawns the task that pushes engine-originated messages out to the socket.
/// Delivery is fire-and-forget: a failed send means the socket is gone and
/// the loop simply ends.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn read_loop(
    mut receiver: futures_util::stream::SplitStream<WebSocket>,
    state: Arc<AppState>,
    id: ConnectionId,
) {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::error!("WebSocket error on connection '{}': {}", id, e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                let event = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(
                            "Unparseable frame from connection '{}', ignoring: {}",
                            id,
                            e
                        );
                        continue;
                    }
                };
                dispatch_event(&state, &id, event).await;
            }
            Message::Close(_) => {
                tracing::info!("Connection '{}' requested close", id);
                break;
            }
            // Ping/pong is handled by the protocol layer; binary is ignored.
            _ => {}
        }
    }
}

/// Run one client event against the engine. The lock is held across the
/// whole operation, broadcasts included.
async fn dispatch_event(state: &Arc<AppState>, id: &ConnectionId, event: ClientEvent) {
    let mut service = state.service.lock().await;
    match event {
        ClientEvent::SetUsername(name) => {
            service.set_username(id, name);
        }
        ClientEvent::CreateRoom(req) => {
            if let Err(e) = service.create_room(id, &req.room_name, req.password) {
                tracing::info!(
                    "create_room '{}' failed for connection '{}': {}",
                    req.room_name,
                    id,
                    e
                );
            }
        }
        ClientEvent::JoinRoom(req) => {
            if let Err(e) = service.join_room(id, &req.room_name, req.password.as_deref()) {
                tracing::info!(
                    "join_room '{}' failed for connection '{}': {}",
                    req.room_name,
                    id,
                    e
                );
            }
        }
        ClientEvent::LeaveRoom(room_name) => {
            if !service.leave_room(id, &room_name) {
                tracing::debug!(
                    "leave_room '{}' ignored for connection '{}': not a member",
                    room_name,
                    id
                );
            }
        }
        ClientEvent::SendMessage(payload) => {
            service.send_room_message(id, &payload.room_name, payload.username, payload.message);
        }
        ClientEvent::SendGlobalMessage(payload) => {
            service.send_global_message(payload.username, payload.message);
        }
        ClientEvent::RequestRoomUsers(room_name) => {
            service.request_room_users(id, &room_name);
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get the public room list
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
) -> Json<std::collections::HashMap<String, RoomSummary>> {
    let service = state.service.lock().await;
    Json(service.public_rooms())
}

/// Get room detail by name
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_name): Path<String>,
) -> Result<Json<RoomDetail>, StatusCode> {
    let service = state.service.lock().await;
    match service.room_detail(&room_name) {
        Some(detail) => Ok(Json(detail)),
        None => Err(StatusCode::NOT_FOUND),
    }
}
