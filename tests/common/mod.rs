//! Shared test utilities

#![allow(dead_code)]

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::ws::Message;
use debate_gateway::{
    ApiServer, ApiServerBuilder, AudioUpload, BatchSpeech, Error, Flavor, Result,
    UpstreamConnector, UpstreamHandle, UpstreamPeer,
};
use futures::channel::mpsc as fmpsc;
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// Connector that hands each upstream peer to the test instead of a vendor
pub struct FakeConnector {
    refuse: bool,
    peers: mpsc::UnboundedSender<(Flavor, UpstreamPeer)>,
}

impl FakeConnector {
    /// A connector whose connections succeed; peers arrive on the receiver
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(Flavor, UpstreamPeer)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { refuse: false, peers: tx }, rx)
    }

    /// A connector whose connections always fail
    pub fn refusing() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { refuse: true, peers: tx }
    }
}

#[async_trait]
impl UpstreamConnector for FakeConnector {
    async fn connect(&self, flavor: Flavor) -> Result<UpstreamHandle> {
        if self.refuse {
            return Err(Error::Upstream("connection refused".to_string()));
        }
        let (handle, peer) = UpstreamHandle::channel(16);
        self.peers
            .send((flavor, peer))
            .map_err(|_| Error::Upstream("test dropped peer receiver".to_string()))?;
        Ok(handle)
    }
}

/// What the fake vendor saw on a transcription call
#[derive(Debug, Clone)]
pub struct SeenUpload {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Batch vendor double recording every call
#[derive(Default)]
pub struct FakeSpeech {
    pub fail: bool,
    pub uploads: Mutex<Vec<SeenUpload>>,
    pub syntheses: Mutex<Vec<(String, String)>>,
}

impl FakeSpeech {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl BatchSpeech for FakeSpeech {
    async fn transcribe(&self, upload: &AudioUpload) -> Result<Value> {
        let bytes = tokio::fs::read(&upload.path).await?;
        self.uploads.lock().unwrap().push(SeenUpload {
            path: upload.path.clone(),
            file_name: upload.file_name.clone(),
            mime: upload.mime.clone(),
            bytes,
        });
        if self.fail {
            return Err(Error::Vendor("quota exceeded".to_string()));
        }
        Ok(json!({ "request_id": "req-1", "transcript": "namaste" }))
    }

    async fn synthesize(&self, text: &str, target_language_code: &str) -> Result<Value> {
        self.syntheses
            .lock()
            .unwrap()
            .push((text.to_string(), target_language_code.to_string()));
        if self.fail {
            return Err(Error::Vendor("quota exceeded".to_string()));
        }
        Ok(json!({ "request_id": "req-2", "audios": ["UklGRg=="] }))
    }
}

/// Build a server wired to the given fakes
pub fn build_server(connector: Arc<FakeConnector>, speech: Arc<FakeSpeech>) -> ApiServer {
    ApiServerBuilder::new(connector, speech, 0).build()
}

/// Test side of an in-memory client socket
pub struct FakeClient {
    /// Frames the test sends to the relay
    pub to_relay: fmpsc::UnboundedSender<std::result::Result<Message, Infallible>>,
    /// Frames the relay sent to the client; ends when the relay closes it
    pub from_relay: fmpsc::UnboundedReceiver<Message>,
}

/// Relay side of an in-memory client socket
pub type ClientSink = fmpsc::UnboundedSender<Message>;
pub type ClientStream = fmpsc::UnboundedReceiver<std::result::Result<Message, Infallible>>;

/// Create an in-memory client socket pair
pub fn fake_client() -> (FakeClient, ClientSink, ClientStream) {
    let (to_relay, relay_rx) = fmpsc::unbounded();
    let (relay_tx, from_relay) = fmpsc::unbounded();
    (
        FakeClient {
            to_relay,
            from_relay,
        },
        relay_tx,
        relay_rx,
    )
}

impl FakeClient {
    /// Send a text frame to the relay
    pub fn send_text(&self, text: &str) {
        self.to_relay
            .unbounded_send(Ok(Message::Text(text.to_owned().into())))
            .expect("relay stopped reading");
    }

    /// Next frame from the relay as text, or `None` once closed
    pub async fn next_text(&mut self) -> Option<String> {
        use futures::StreamExt;

        match self.from_relay.next().await? {
            Message::Text(text) => Some(text.as_str().to_owned()),
            other => panic!("unexpected frame from relay: {other:?}"),
        }
    }
}
