//! End-to-end WebSocket tests against a listening gateway

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use debate_gateway::{Flavor, UpstreamCommand, UpstreamEvent, UpstreamPeer};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

mod common;
use common::{FakeConnector, FakeSpeech, build_server};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start a gateway on an ephemeral port
async fn spawn_gateway() -> (SocketAddr, mpsc::UnboundedReceiver<(Flavor, UpstreamPeer)>) {
    let (connector, peers) = FakeConnector::new();
    let server = build_server(Arc::new(connector), Arc::new(FakeSpeech::default()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));

    (addr, peers)
}

async fn connect(addr: SocketAddr, path: &str) -> Client {
    let (socket, _) = connect_async(format!("ws://{addr}{path}")).await.unwrap();
    socket
}

/// Next text frame, skipping control frames
async fn next_text(socket: &mut Client) -> Option<String> {
    let read = async {
        while let Some(frame) = socket.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(text.as_str().to_owned()),
                Ok(Message::Binary(bytes)) => {
                    return Some(String::from_utf8_lossy(&bytes).into_owned());
                }
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => {}
            }
        }
        None
    };
    tokio::time::timeout(Duration::from_secs(2), read)
        .await
        .expect("frame arrived in time")
}

#[tokio::test]
async fn each_path_opens_its_own_flavor() {
    let (addr, mut peers) = spawn_gateway().await;

    for flavor in Flavor::ALL {
        let _socket = connect(addr, flavor.path()).await;
        let (seen, _peer) = peers.recv().await.unwrap();
        assert_eq!(seen, flavor);
    }
}

#[tokio::test]
async fn relay_round_trip_over_real_sockets() {
    let (addr, mut peers) = spawn_gateway().await;
    let mut socket = connect(addr, "/api/streaming/tts").await;
    let (_, mut peer) = peers.recv().await.unwrap();

    socket
        .send(Message::Text(
            json!({ "type": "convert", "data": { "text": "Point of order" } })
                .to_string()
                .into(),
        ))
        .await
        .unwrap();
    assert_eq!(
        peer.commands.recv().await,
        Some(UpstreamCommand::Convert(json!({ "text": "Point of order" })))
    );

    let audio = r#"{"type":"audio","data":{"audio":"UklGRg=="}}"#;
    peer.events
        .send(UpstreamEvent::Message(audio.to_string()))
        .await
        .unwrap();
    assert_eq!(next_text(&mut socket).await.as_deref(), Some(audio));

    socket.close(None).await.unwrap();
    assert_eq!(peer.commands.recv().await, Some(UpstreamCommand::Close));
}

#[tokio::test]
async fn invalid_frame_gets_error_envelope_over_the_wire() {
    let (addr, mut peers) = spawn_gateway().await;
    let mut socket = connect(addr, "/api/streaming/transcribe").await;
    let (_, _peer) = peers.recv().await.unwrap();

    socket
        .send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();

    let reply: Value = serde_json::from_str(&next_text(&mut socket).await.unwrap()).unwrap();
    assert_eq!(reply, json!({ "type": "error", "error": "Invalid message format" }));
}

#[tokio::test]
async fn room_welcomes_and_broadcasts_to_others() {
    let (addr, _peers) = spawn_gateway().await;

    let mut alice = connect(addr, "/api/debate/room").await;
    let welcome: Value = serde_json::from_str(&next_text(&mut alice).await.unwrap()).unwrap();
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["message"], "Connected to debate room WebSocket.");

    let mut bob = connect(addr, "/api/debate/room").await;
    assert!(next_text(&mut bob).await.unwrap().contains("welcome"));

    alice
        .send(Message::Text("opening statement".to_string().into()))
        .await
        .unwrap();
    assert_eq!(next_text(&mut bob).await.as_deref(), Some("opening statement"));

    // The sender does not hear its own frame
    let echo = tokio::time::timeout(Duration::from_millis(100), alice.next()).await;
    assert!(echo.is_err());
}

#[tokio::test]
async fn client_close_gets_a_clean_close_reply() {
    let (addr, mut peers) = spawn_gateway().await;
    let mut socket = connect(addr, "/api/streaming/tts").await;
    let (_, mut peer) = peers.recv().await.unwrap();

    socket.send(Message::Close(None)).await.unwrap();

    let reply = tokio::time::timeout(Duration::from_secs(2), socket.next())
        .await
        .expect("close reply arrived in time");
    assert!(
        matches!(reply, Some(Ok(Message::Close(_)))),
        "expected a close frame, got {reply:?}"
    );
    assert_eq!(peer.commands.recv().await, Some(UpstreamCommand::Close));
}
