//! End-to-end tests over a real WebSocket connection.
//!
//! Each test serves the router on an ephemeral port and drives it with
//! tokio-tungstenite clients.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use hiroba::server::{AppState, build_router};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the app on an ephemeral port and return its WebSocket URL.
async fn start_server() -> String {
    let state = Arc::new(AppState::new());
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to get local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });
    format!("ws://{}/ws", addr)
}

async fn connect(url: &str) -> WsClient {
    let (ws, _) = connect_async(url).await.expect("Failed to connect");
    ws
}

async fn send_event(ws: &mut WsClient, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("Failed to send");
}

/// Receive the next JSON event, skipping non-text frames.
async fn recv_event(ws: &mut WsClient) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("Timed out waiting for event")
            .expect("Connection closed")
            .expect("WebSocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("Invalid JSON from server");
        }
    }
}

/// Receive events until one with the given name arrives, discarding others.
async fn recv_until(ws: &mut WsClient, event: &str) -> Value {
    loop {
        let received = recv_event(ws).await;
        if received["event"] == event {
            return received;
        }
    }
}

#[tokio::test]
async fn new_connection_receives_room_list_snapshot() {
    // テスト項目: 接続直後に room_list スナップショットが届く
    let url = start_server().await;
    let mut ws = connect(&url).await;

    let event = recv_event(&mut ws).await;
    assert_eq!(event["event"], "room_list");
    assert_eq!(event["data"], json!({}));
}

#[tokio::test]
async fn set_username_announces_lobby_entry() {
    // テスト項目: ニックネーム設定で全接続にシステム通知とロビー一覧が届く
    let url = start_server().await;
    let mut alice = connect(&url).await;
    let mut bob = connect(&url).await;
    recv_until(&mut alice, "room_list").await;
    recv_until(&mut bob, "room_list").await;

    send_event(&mut alice, json!({"event": "set_username", "data": "alice"})).await;

    for ws in [&mut alice, &mut bob] {
        let notice = recv_until(ws, "receive_global_message").await;
        assert_eq!(notice["data"]["type"], "system");
        assert_eq!(notice["data"]["message"], "alice entered the lobby");
        let lobby = recv_until(ws, "update_waiting_room_users").await;
        assert_eq!(lobby["data"], json!(["alice"]));
    }
}

#[tokio::test]
async fn create_join_chat_and_leave_flow() {
    // テスト項目: 作成 → 参加 → チャット → 退出の一連の流れ
    let url = start_server().await;

    let mut alice = connect(&url).await;
    recv_until(&mut alice, "room_list").await;
    send_event(&mut alice, json!({"event": "set_username", "data": "alice"})).await;
    recv_until(&mut alice, "update_waiting_room_users").await;

    send_event(
        &mut alice,
        json!({"event": "create_room", "data": {"roomName": "r1", "password": null}}),
    )
    .await;
    let success = recv_until(&mut alice, "join_room_success").await;
    assert_eq!(success["data"], "r1");
    let joined = recv_until(&mut alice, "receive_message").await;
    assert_eq!(joined["data"]["message"], "alice joined the room");
    let members = recv_until(&mut alice, "update_room_users").await;
    assert_eq!(members["data"], json!(["alice"]));

    // bob 参加
    let mut bob = connect(&url).await;
    let room_list = recv_until(&mut bob, "room_list").await;
    assert_eq!(room_list["data"]["r1"]["userCount"], 1);
    assert_eq!(room_list["data"]["r1"]["hasPassword"], false);
    send_event(&mut bob, json!({"event": "set_username", "data": "bob"})).await;
    recv_until(&mut bob, "update_waiting_room_users").await;
    send_event(
        &mut bob,
        json!({"event": "join_room", "data": {"roomName": "r1"}}),
    )
    .await;
    recv_until(&mut bob, "join_room_success").await;
    let joined = recv_until(&mut bob, "receive_message").await;
    assert_eq!(joined["data"]["message"], "bob joined the room");

    let notice = recv_until(&mut alice, "receive_message").await;
    assert_eq!(notice["data"]["type"], "system");
    assert_eq!(notice["data"]["message"], "bob joined the room");
    let members = recv_until(&mut alice, "update_room_users").await;
    assert_eq!(members["data"], json!(["alice", "bob"]));

    // bob がルームにメッセージを送り、送信者を含む全員に届く
    send_event(
        &mut bob,
        json!({"event": "send_message",
               "data": {"roomName": "r1", "username": "bob", "message": "hi"}}),
    )
    .await;
    for ws in [&mut alice, &mut bob] {
        let chat = recv_until(ws, "receive_message").await;
        assert_eq!(chat["data"]["username"], "bob");
        assert_eq!(chat["data"]["message"], "hi");
        assert!(chat["data"]["timestamp"].as_i64().unwrap() > 0);
        assert!(chat["data"]["senderId"].is_string());
    }

    // alice 退出 → bob に通知、ルームは残る
    send_event(&mut alice, json!({"event": "leave_room", "data": "r1"})).await;
    let left = recv_until(&mut bob, "receive_message").await;
    assert_eq!(left["data"]["message"], "alice left the room");
    let members = recv_until(&mut bob, "update_room_users").await;
    assert_eq!(members["data"], json!(["bob"]));
}

#[tokio::test]
async fn join_nonexistent_room_fails() {
    // テスト項目: 存在しないルームへの参加が join_room_fail になる
    let url = start_server().await;
    let mut carol = connect(&url).await;
    recv_until(&mut carol, "room_list").await;
    send_event(&mut carol, json!({"event": "set_username", "data": "carol"})).await;
    recv_until(&mut carol, "update_waiting_room_users").await;

    send_event(
        &mut carol,
        json!({"event": "join_room", "data": {"roomName": "ghost", "password": null}}),
    )
    .await;

    let fail = recv_until(&mut carol, "join_room_fail").await;
    assert_eq!(fail["data"], "room not found");
}

#[tokio::test]
async fn disconnect_triggers_room_leave_for_remaining_members() {
    // テスト項目: 切断で残メンバーに退出通知とロビー一覧が届く
    let url = start_server().await;

    let mut alice = connect(&url).await;
    recv_until(&mut alice, "room_list").await;
    send_event(&mut alice, json!({"event": "set_username", "data": "alice"})).await;
    send_event(
        &mut alice,
        json!({"event": "create_room", "data": {"roomName": "r1", "password": null}}),
    )
    .await;
    recv_until(&mut alice, "join_room_success").await;

    let mut bob = connect(&url).await;
    recv_until(&mut bob, "room_list").await;
    send_event(&mut bob, json!({"event": "set_username", "data": "bob"})).await;
    send_event(
        &mut bob,
        json!({"event": "join_room", "data": {"roomName": "r1"}}),
    )
    .await;
    recv_until(&mut bob, "join_room_success").await;

    // alice 側のキューを bob の参加完了まで読み進める
    let joined = recv_until(&mut alice, "receive_message").await;
    assert_eq!(joined["data"]["message"], "alice joined the room");
    let joined = recv_until(&mut alice, "receive_message").await;
    assert_eq!(joined["data"]["message"], "bob joined the room");
    let members = recv_until(&mut alice, "update_room_users").await;
    assert_eq!(members["data"], json!(["alice", "bob"]));

    // bob が切断する
    bob.close(None).await.expect("Failed to close");
    drop(bob);

    let notice = recv_until(&mut alice, "receive_message").await;
    assert_eq!(notice["data"]["type"], "system");
    assert_eq!(notice["data"]["message"], "bob left the room");
    let members = recv_until(&mut alice, "update_room_users").await;
    assert_eq!(members["data"], json!(["alice"]));
    let lobby = recv_until(&mut alice, "update_waiting_room_users").await;
    assert_eq!(lobby["data"], json!([]));
}

#[tokio::test]
async fn unparseable_frames_are_ignored() {
    // テスト項目: 不正な JSON フレームは無視され、接続は維持される
    let url = start_server().await;
    let mut ws = connect(&url).await;
    recv_until(&mut ws, "room_list").await;

    send_event(&mut ws, json!({"event": "dance", "data": null})).await;
    ws.send(Message::Text("not json at all".to_string().into()))
        .await
        .expect("Failed to send");

    // まだ生きていることを確認: 通常のイベントが処理される
    send_event(&mut ws, json!({"event": "set_username", "data": "alice"})).await;
    let lobby = recv_until(&mut ws, "update_waiting_room_users").await;
    assert_eq!(lobby["data"], json!(["alice"]));
}
