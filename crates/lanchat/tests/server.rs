//! Integration tests for the relay: real sockets, full connection flow.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lanchat::prelude::*;
use lanchat_transport::{Connection, DEFAULT_MAX_FRAME_LEN, TcpConnection};

// =========================================================================
// Helpers
// =========================================================================

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Starts a relay on an ephemeral port without discovery.
async fn start_server() -> (SocketAddr, Arc<Router>) {
    let server = ChatServer::builder()
        .bind("127.0.0.1:0")
        .no_discovery()
        .build()
        .await
        .expect("server should bind");
    let addr = server.local_addr().unwrap();
    let router = server.router();
    tokio::spawn(server.run());
    (addr, router)
}

async fn recv(client: &ChatClient) -> ServerFrame {
    tokio::time::timeout(RECV_TIMEOUT, client.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("recv failed")
        .expect("relay closed the connection")
}

/// Asserts nothing arrives within a short window.
async fn assert_silent(client: &ChatClient) {
    let result = tokio::time::timeout(Duration::from_millis(200), client.recv()).await;
    assert!(result.is_err(), "unexpected frame: {result:?}");
}

fn msg(text: &str) -> ServerFrame {
    ServerFrame::Msg(text.to_string())
}

fn to(name: &str) -> Control {
    Control::User(name.to_string())
}

/// Connects, registers `name`, and consumes the welcome notice.
/// Only valid while the global history is empty.
async fn join(addr: SocketAddr, name: &str) -> ChatClient {
    let client = ChatClient::connect(addr).await.unwrap();
    client.register(name).await.unwrap();
    assert_eq!(
        recv(&client).await,
        msg(&format!("[Server]: Welcome to the chat, {name}!"))
    );
    client
}

// =========================================================================
// Registration
// =========================================================================

#[tokio::test]
async fn test_register_duplicate_name_then_new_name_succeeds() {
    let (addr, _router) = start_server().await;
    let _alice = join(addr, "alice").await;

    let second = ChatClient::connect(addr).await.unwrap();
    second.register("alice").await.unwrap();

    assert_eq!(
        recv(&second).await,
        msg("[Server]: Name 'alice' is already taken! Choose another name.")
    );
    assert_eq!(recv(&second).await, msg("[Server]: Enter a new name:"));

    second.register("bob").await.unwrap();
    assert_eq!(recv(&second).await, msg("[Server]: Welcome to the chat, bob!"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_register_same_name_welcomes_exactly_one() {
    let (addr, router) = start_server().await;
    let mut clients = Vec::new();
    for _ in 0..20 {
        clients.push(ChatClient::connect(addr).await.unwrap());
    }

    let tasks: Vec<_> = clients
        .into_iter()
        .map(|client| {
            tokio::spawn(async move {
                client.register("dup").await.unwrap();
                recv(&client).await
            })
        })
        .collect();
    let mut replies = Vec::new();
    for task in tasks {
        replies.push(task.await.unwrap());
    }

    let welcomes = replies
        .iter()
        .filter(|f| **f == msg("[Server]: Welcome to the chat, dup!"))
        .count();
    let taken = replies
        .iter()
        .filter(|f| **f == msg("[Server]: Name 'dup' is already taken! Choose another name."))
        .count();
    assert_eq!(welcomes, 1);
    assert_eq!(taken, 19);
    assert_eq!(router.online_count().await, 1);
}

#[tokio::test]
async fn test_register_twice_keeps_first_name() {
    let (addr, router) = start_server().await;
    let alice = join(addr, "alice").await;

    alice.register("alicia").await.unwrap();

    assert_eq!(
        recv(&alice).await,
        msg("[Server]: You are already registered as 'alice'.")
    );
    assert_eq!(router.online_count().await, 1);
}

#[tokio::test]
async fn test_msg_before_name_returns_not_registered() {
    let (addr, router) = start_server().await;
    let client = ChatClient::connect(addr).await.unwrap();

    client.send_text(Control::Broadcast, "hello?").await.unwrap();

    assert_eq!(recv(&client).await, msg("[Server]: You must set a name first!"));
    assert_eq!(router.message_counts().await.global, 0);
}

#[tokio::test]
async fn test_online_usr_before_name_returns_not_registered() {
    let (addr, _router) = start_server().await;
    let client = ChatClient::connect(addr).await.unwrap();

    client.request_online_users().await.unwrap();

    assert_eq!(recv(&client).await, msg("[Server]: You must set a name first!"));
}

// =========================================================================
// Global messages and replay
// =========================================================================

#[tokio::test]
async fn test_global_message_reaches_others_live_and_via_replay() {
    let (addr, _router) = start_server().await;
    let alice = join(addr, "alice").await;
    let bob = join(addr, "bob").await;

    alice.send_text(Control::Broadcast, "hi").await.unwrap();

    assert_eq!(recv(&bob).await, msg("[alice -> todos]: hi"));
    assert_silent(&alice).await;

    let carol = ChatClient::connect(addr).await.unwrap();
    carol.register("carol").await.unwrap();
    assert_eq!(recv(&carol).await, msg("[Server]: Welcome to the chat, carol!"));
    assert_eq!(recv(&carol).await, msg("[alice -> todos]: hi"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_join_racing_global_message_sees_it_exactly_once() {
    let (addr, _router) = start_server().await;
    let alice = join(addr, "alice").await;
    let bob = ChatClient::connect(addr).await.unwrap();

    let (sent, registered) = tokio::join!(
        alice.send_text(Control::Broadcast, "race"),
        bob.register("bob"),
    );
    sent.unwrap();
    registered.unwrap();
    alice.send_text(Control::Broadcast, "after").await.unwrap();

    // "after" is queued behind "race" whichever way the race went.
    let mut seen = Vec::new();
    loop {
        let frame = recv(&bob).await;
        if frame == msg("[alice -> todos]: after") {
            break;
        }
        seen.push(frame);
    }
    let copies = seen
        .iter()
        .filter(|f| **f == msg("[alice -> todos]: race"))
        .count();
    assert_eq!(copies, 1, "frames before the marker: {seen:?}");
}

#[tokio::test]
async fn test_recv_chat_skips_relay_notices() {
    let (addr, _router) = start_server().await;
    let alice = join(addr, "alice").await;
    let bob = ChatClient::connect(addr).await.unwrap();
    bob.register("bob").await.unwrap();

    alice.send_text(Control::Broadcast, "hi").await.unwrap();

    let frame = tokio::time::timeout(RECV_TIMEOUT, bob.recv_chat())
        .await
        .expect("timed out waiting for a chat frame")
        .unwrap();
    assert_eq!(frame, Some(msg("[alice -> todos]: hi")));
}

#[tokio::test]
async fn test_unregistered_connection_gets_no_broadcasts() {
    let (addr, _router) = start_server().await;
    let alice = join(addr, "alice").await;
    let bob = join(addr, "bob").await;
    let lurker = ChatClient::connect(addr).await.unwrap();

    alice.send_text(Control::Broadcast, "hi").await.unwrap();

    assert_eq!(recv(&bob).await, msg("[alice -> todos]: hi"));
    assert_silent(&lurker).await;
}

#[tokio::test]
async fn test_replay_preserves_order() {
    let (addr, router) = start_server().await;
    let alice = join(addr, "alice").await;
    for text in ["one", "two", "three"] {
        alice.send_text(Control::Broadcast, text).await.unwrap();
    }
    // The sender gets no echo, so wait on the store instead.
    tokio::time::timeout(RECV_TIMEOUT, async {
        while router.message_counts().await.global < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("messages should be stored");

    let bob = ChatClient::connect(addr).await.unwrap();
    bob.register("bob").await.unwrap();

    assert_eq!(recv(&bob).await, msg("[Server]: Welcome to the chat, bob!"));
    assert_eq!(recv(&bob).await, msg("[alice -> todos]: one"));
    assert_eq!(recv(&bob).await, msg("[alice -> todos]: two"));
    assert_eq!(recv(&bob).await, msg("[alice -> todos]: three"));
}

// =========================================================================
// Private messages
// =========================================================================

#[tokio::test]
async fn test_private_message_reaches_only_destination() {
    let (addr, _router) = start_server().await;
    let alice = join(addr, "alice").await;
    let bob = join(addr, "bob").await;
    let carol = join(addr, "carol").await;

    alice.send_text(to("bob"), "psst").await.unwrap();

    assert_eq!(recv(&bob).await, msg("[alice -> bob]: psst"));
    assert_silent(&carol).await;
}

#[tokio::test]
async fn test_private_message_is_not_replayed() {
    let (addr, _router) = start_server().await;
    let alice = join(addr, "alice").await;
    let bob = join(addr, "bob").await;
    alice.send_text(to("bob"), "psst").await.unwrap();
    assert_eq!(recv(&bob).await, msg("[alice -> bob]: psst"));

    let dave = join(addr, "dave").await;

    assert_silent(&dave).await;
}

#[tokio::test]
async fn test_private_message_to_missing_user_returns_error_and_stores_nothing() {
    let (addr, router) = start_server().await;
    let alice = join(addr, "alice").await;

    alice.send_text(to("carol"), "x").await.unwrap();

    assert_eq!(
        recv(&alice).await,
        msg("[Server]: User 'carol' not found or offline.")
    );
    assert_silent(&alice).await;
    assert_eq!(
        router.message_counts().await,
        MessageCounts {
            global: 0,
            private: 0
        }
    );
}

// =========================================================================
// Files
// =========================================================================

#[tokio::test]
async fn test_file_to_everyone_round_trips_bytes() {
    let (addr, _router) = start_server().await;
    let alice = join(addr, "alice").await;
    let bob = join(addr, "bob").await;
    let contents: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();

    alice
        .send_file(Control::Broadcast, "blob.bin", &contents)
        .await
        .unwrap();

    let ServerFrame::File {
        sender,
        filename,
        data,
    } = recv(&bob).await
    else {
        panic!("expected a file frame");
    };
    assert_eq!(sender, "alice");
    assert_eq!(filename, "blob.bin");
    assert_eq!(decode_file(&data).unwrap(), contents);
}

#[tokio::test]
async fn test_file_to_missing_user_names_file_in_error() {
    let (addr, router) = start_server().await;
    let alice = join(addr, "alice").await;

    alice.send_file(to("carol"), "a.txt", b"hi").await.unwrap();

    assert_eq!(
        recv(&alice).await,
        msg("[Server]: User 'carol' not found. File 'a.txt' was not delivered.")
    );
    assert_eq!(router.message_counts().await.private, 0);
}

#[tokio::test]
async fn test_file_without_filename_uses_default() {
    let (addr, _router) = start_server().await;
    let alice = join(addr, "alice").await;
    let bob = join(addr, "bob").await;

    let record = ClientRecord {
        kind: RecordType::File,
        control: to("bob"),
        message: encode_file(b"hi"),
        filename: None,
    };
    alice.send_record(&record).await.unwrap();

    assert_eq!(
        recv(&bob).await,
        ServerFrame::File {
            sender: "alice".into(),
            filename: "received_file".into(),
            data: encode_file(b"hi"),
        }
    );
}

// =========================================================================
// online_usr
// =========================================================================

#[tokio::test]
async fn test_online_usr_lists_others_with_address() {
    let (addr, _router) = start_server().await;
    let _alice = join(addr, "alice").await;
    let bob = join(addr, "bob").await;

    bob.request_online_users().await.unwrap();

    let ServerFrame::OnlineUsers(users) = recv(&bob).await else {
        panic!("expected an online_users frame");
    };
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "alice");
    assert!(users[0].addr.starts_with("127.0.0.1:"), "addr: {}", users[0].addr);
}

// =========================================================================
// Teardown
// =========================================================================

#[tokio::test]
async fn test_malformed_record_closes_connection_and_frees_name() {
    let (addr, router) = start_server().await;
    let raw = TcpConnection::connect(addr, DEFAULT_MAX_FRAME_LEN)
        .await
        .unwrap();
    raw.send(br#"{"type":"name","control":"dontcare","message":"alice"}"#)
        .await
        .unwrap();
    let welcome = tokio::time::timeout(RECV_TIMEOUT, raw.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(welcome.is_some());

    raw.send(b"this is not json").await.unwrap();

    let closed = tokio::time::timeout(RECV_TIMEOUT, raw.recv())
        .await
        .expect("relay should close the connection");
    assert!(matches!(closed, Ok(None) | Err(_)));
    assert_eq!(router.online_count().await, 0);

    let _again = join(addr, "alice").await;
}

#[tokio::test]
async fn test_unknown_type_closes_connection() {
    let (addr, _router) = start_server().await;
    let raw = TcpConnection::connect(addr, DEFAULT_MAX_FRAME_LEN)
        .await
        .unwrap();

    raw.send(br#"{"type":"shout","control":"4all","message":"hi"}"#)
        .await
        .unwrap();

    let closed = tokio::time::timeout(RECV_TIMEOUT, raw.recv())
        .await
        .expect("relay should close the connection");
    assert!(matches!(closed, Ok(None) | Err(_)));
}

#[tokio::test]
async fn test_disconnect_removes_user_from_online_list() {
    let (addr, router) = start_server().await;
    let alice = join(addr, "alice").await;
    let bob = join(addr, "bob").await;

    alice.close().await.unwrap();
    tokio::time::timeout(RECV_TIMEOUT, async {
        while router.online_count().await > 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("alice should be removed");

    bob.request_online_users().await.unwrap();
    assert_eq!(recv(&bob).await, ServerFrame::OnlineUsers(Vec::new()));
}

// =========================================================================
// Discovery
// =========================================================================

#[tokio::test]
async fn test_discover_relay_finds_running_server() {
    let server = ChatServer::builder()
        .bind("127.0.0.1:0")
        .discovery("127.0.0.1:0")
        .build()
        .await
        .unwrap();
    let probe_target = server.discovery_addr().expect("discovery enabled");
    tokio::spawn(server.run());

    let found = ChatClient::discover_relay(probe_target, RECV_TIMEOUT)
        .await
        .unwrap();

    assert_eq!(found, Some(probe_target.ip()));
}
