use crate::{
    message::{Envelope, MessageType},
    socket::{SocketEvent, SocketServer},
};

use std::{path::PathBuf, process, time::Duration};

use serde_json::{Value, json};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::UnixStream,
    sync::mpsc,
    time::timeout,
};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

#[allow(clippy::unwrap_used)]
fn unique_socket_path(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("voicelink-test-{label}-{}-{nanos}.sock", process::id()))
}

#[allow(clippy::unwrap_used)]
async fn recv_event(events: &mut mpsc::UnboundedReceiver<SocketEvent>) -> SocketEvent {
    timeout(RECV_TIMEOUT, events.recv())
        .await
        .unwrap()
        .unwrap()
}

/// WHAT: A stale socket file at the path does not prevent startup
/// WHY: An unclean shutdown leaves the path occupied; the server must
/// recover instead of failing with "address in use"
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_stale_socket_file_when_starting_then_bind_succeeds() {
    let path = unique_socket_path("stale");
    std::fs::write(&path, "stale").unwrap();

    let (server, _events) = SocketServer::new(path.clone());
    let bound = server.start().await.unwrap();

    assert_eq!(bound, path);

    server.stop().await;
    assert!(!path.exists());
}

/// WHAT: One malformed line between two valid ones yields exactly two
/// events, in order, with the connection intact
/// WHY: A parse failure is a per-message error, not a connection fault
#[tokio::test]
#[allow(clippy::unwrap_used, clippy::panic)]
async fn given_malformed_middle_line_when_dispatching_then_two_events_in_order() {
    let path = unique_socket_path("malformed");
    let (server, mut events) = SocketServer::new(path.clone());
    server.start().await.unwrap();

    let mut client = UnixStream::connect(&path).await.unwrap();
    assert!(matches!(
        recv_event(&mut events).await,
        SocketEvent::ClientConnected { .. }
    ));

    client
        .write_all(
            b"{\"type\":\"volume_data\",\"timestamp\":1,\"data\":{\"level\":0.5}}\n\
              this is not json\n\
              {\"type\":\"server_result\",\"timestamp\":2}\n",
        )
        .await
        .unwrap();

    let first = recv_event(&mut events).await;
    match first {
        SocketEvent::Message { envelope, .. } => assert_eq!(envelope.kind, "volume_data"),
        other => panic!("expected message event, got {other:?}"),
    }

    let second = recv_event(&mut events).await;
    match second {
        SocketEvent::Message { envelope, .. } => assert_eq!(envelope.kind, "server_result"),
        other => panic!("expected message event, got {other:?}"),
    }

    // The malformed line produced nothing further.
    assert!(timeout(Duration::from_millis(200), events.recv()).await.is_err());

    server.stop().await;
}

/// WHAT: An envelope failing validation is dropped silently
/// WHY: Well-formed JSON without the required fields must not reach consumers
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_invalid_envelope_when_dispatching_then_dropped() {
    let path = unique_socket_path("invalid");
    let (server, mut events) = SocketServer::new(path.clone());
    server.start().await.unwrap();

    let mut client = UnixStream::connect(&path).await.unwrap();
    assert!(matches!(
        recv_event(&mut events).await,
        SocketEvent::ClientConnected { .. }
    ));

    client
        .write_all(b"{\"type\":\"volume_data\"}\n")
        .await
        .unwrap();

    assert!(timeout(Duration::from_millis(200), events.recv()).await.is_err());

    server.stop().await;
}

/// WHAT: Broadcast delivers a newline-terminated JSON line to a client
/// WHY: The helper consumes the same framing it produces
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_connected_client_when_broadcasting_then_line_delivered() {
    let path = unique_socket_path("broadcast");
    let (server, mut events) = SocketServer::new(path.clone());
    server.start().await.unwrap();

    let client = UnixStream::connect(&path).await.unwrap();
    assert!(matches!(
        recv_event(&mut events).await,
        SocketEvent::ClientConnected { .. }
    ));

    let envelope = Envelope::new(MessageType::InitConfig, Some(json!({ "auth_token": "tok" })));
    let delivered = server.broadcast(&envelope).await;
    assert_eq!(delivered, 1);

    let mut lines = BufReader::new(client).lines();
    let line = timeout(RECV_TIMEOUT, lines.next_line())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let value: Value = serde_json::from_str(&line).unwrap();

    assert_eq!(value["type"], "init_config");
    assert_eq!(value["data"]["auth_token"], "tok");

    server.stop().await;
}

/// WHAT: Targeted sends to unknown clients report failure
/// WHY: Callers poll the connection table rather than assume liveness
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_unknown_client_when_sending_then_false() {
    let path = unique_socket_path("unknown");
    let (server, _events) = SocketServer::new(path.clone());
    server.start().await.unwrap();

    let envelope = Envelope::new(MessageType::ServerResult, None);
    assert!(!server.send_to_client(42, &envelope).await);

    server.stop().await;
}

/// WHAT: A disconnecting client is removed from the table
/// WHY: Connection records are destroyed on socket close
#[tokio::test]
#[allow(clippy::unwrap_used, clippy::panic)]
async fn given_client_disconnect_when_observed_then_record_removed() {
    let path = unique_socket_path("disconnect");
    let (server, mut events) = SocketServer::new(path.clone());
    server.start().await.unwrap();

    let client = UnixStream::connect(&path).await.unwrap();
    let connected = recv_event(&mut events).await;
    let SocketEvent::ClientConnected { client_id } = connected else {
        panic!("expected connected event, got {connected:?}");
    };
    assert_eq!(server.client_ids().await, vec![client_id]);

    drop(client);

    let disconnected = recv_event(&mut events).await;
    assert!(matches!(
        disconnected,
        SocketEvent::ClientDisconnected { client_id: id } if id == client_id
    ));
    assert!(server.client_ids().await.is_empty());

    server.stop().await;
}

/// WHAT: stop is safe to call when the server never started
/// WHY: Teardown must be idempotent after partial initialization
#[tokio::test]
async fn given_stopped_server_when_stopping_again_then_noop() {
    let path = unique_socket_path("idempotent");
    let (server, _events) = SocketServer::new(path);

    server.stop().await;
    server.stop().await;
}
