//! One client socket bridged to one upstream connection

use std::fmt::Display;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use uuid::Uuid;

use super::envelope::{ErrorEnvelope, INVALID_FORMAT};
use super::Flavor;
use crate::vendor::{UpstreamCommand, UpstreamConnector, UpstreamEvent, UpstreamHandle};
use crate::Result;

/// How a relay session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The client closed or went away; upstream was closed in turn
    ClientClosed,
    /// The vendor closed; the client was closed in turn
    UpstreamClosed,
    /// The vendor failed; the client got an error envelope, then a close
    UpstreamFailed,
}

/// Bridges a client WebSocket to a vendor streaming connection
///
/// Both directions run on the session's own task. Frames are forwarded one
/// at a time in arrival order, and closing either side closes the other
/// exactly once.
pub struct RelaySession<Tx, Rx> {
    id: Uuid,
    flavor: Flavor,
    client_tx: Tx,
    client_rx: Rx,
    upstream: UpstreamHandle,
    client_closed: bool,
    upstream_closed: bool,
}

impl<Tx, Rx, E> RelaySession<Tx, Rx>
where
    Tx: Sink<Message> + Unpin,
    Tx::Error: Display,
    Rx: Stream<Item = std::result::Result<Message, E>> + Unpin,
    E: Display,
{
    /// Open the upstream connection for `flavor` and pair it with the client
    ///
    /// If the upstream cannot be opened the client sink is closed before
    /// returning, so the browser sees the failure instead of a silent hang.
    ///
    /// # Errors
    ///
    /// Returns the connector's error when the upstream connection fails
    pub async fn open(
        connector: &dyn UpstreamConnector,
        flavor: Flavor,
        mut client_tx: Tx,
        client_rx: Rx,
    ) -> Result<Self> {
        let id = Uuid::new_v4();
        match connector.connect(flavor).await {
            Ok(upstream) => {
                tracing::info!(session_id = %id, flavor = flavor.name(), "relay session opened");
                Ok(Self {
                    id,
                    flavor,
                    client_tx,
                    client_rx,
                    upstream,
                    client_closed: false,
                    upstream_closed: false,
                })
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %id,
                    flavor = flavor.name(),
                    error = %e,
                    "upstream connect failed, dropping client"
                );
                let _ = client_tx.close().await;
                Err(e)
            }
        }
    }

    /// Session identifier used in logs
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Drive the session until either side closes
    pub async fn run(mut self) -> RelayOutcome {
        let outcome = loop {
            tokio::select! {
                frame = self.client_rx.next() => match frame {
                    Some(Ok(message)) => {
                        if let Some(outcome) = self.on_client_frame(message).await {
                            break outcome;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::debug!(session_id = %self.id, error = %e, "client read failed");
                        break self.client_gone().await;
                    }
                    None => break self.client_gone().await,
                },
                event = self.upstream.events.recv() => match event {
                    Some(UpstreamEvent::Message(text)) => {
                        if self.send_client(Message::Text(text.into())).await.is_err() {
                            break self.client_gone().await;
                        }
                    }
                    Some(UpstreamEvent::Error(message)) => break self.upstream_failed(message).await,
                    Some(UpstreamEvent::Closed) | None => break self.upstream_gone().await,
                },
            }
        };

        tracing::info!(
            session_id = %self.id,
            flavor = self.flavor.name(),
            ?outcome,
            "relay session closed"
        );
        outcome
    }

    /// Handle one client frame; returns an outcome when the session ends
    async fn on_client_frame(&mut self, message: Message) -> Option<RelayOutcome> {
        let text = match message {
            Message::Text(text) => text.as_str().to_owned(),
            Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(_) => return self.reject(INVALID_FORMAT.to_string()).await,
            },
            Message::Close(_) => {
                // Completes the close handshake before dropping the socket
                self.close_client().await;
                return Some(self.client_gone().await);
            }
            Message::Ping(_) | Message::Pong(_) => return None,
        };

        match self.flavor.interpret(&text) {
            Ok(command) => {
                if self.upstream.commands.send(command).await.is_err() {
                    tracing::debug!(session_id = %self.id, "upstream no longer accepting commands");
                }
                None
            }
            Err(e) => {
                tracing::debug!(session_id = %self.id, error = %e, "rejected client frame");
                self.reject(e.to_string()).await
            }
        }
    }

    /// Send an error envelope; the session survives unless the client is gone
    async fn reject(&mut self, error: String) -> Option<RelayOutcome> {
        let envelope = ErrorEnvelope::new(error);
        if self.send_client(Message::Text(envelope.to_json().into())).await.is_err() {
            return Some(self.client_gone().await);
        }
        None
    }

    async fn send_client(&mut self, message: Message) -> std::result::Result<(), ()> {
        if self.client_closed {
            return Err(());
        }
        self.client_tx.send(message).await.map_err(|e| {
            tracing::debug!(session_id = %self.id, error = %e, "client write failed");
        })
    }

    async fn close_client(&mut self) {
        if self.client_closed {
            return;
        }
        self.client_closed = true;
        if let Err(e) = self.client_tx.close().await {
            tracing::debug!(session_id = %self.id, error = %e, "client close failed");
        }
    }

    async fn close_upstream(&mut self) {
        if self.upstream_closed {
            return;
        }
        self.upstream_closed = true;
        let _ = self.upstream.commands.send(UpstreamCommand::Close).await;
    }

    async fn client_gone(&mut self) -> RelayOutcome {
        self.client_closed = true;
        self.close_upstream().await;
        RelayOutcome::ClientClosed
    }

    async fn upstream_gone(&mut self) -> RelayOutcome {
        self.upstream_closed = true;
        self.close_client().await;
        RelayOutcome::UpstreamClosed
    }

    async fn upstream_failed(&mut self, message: String) -> RelayOutcome {
        tracing::warn!(session_id = %self.id, flavor = self.flavor.name(), error = %message, "upstream error");
        self.upstream_closed = true;
        let envelope = ErrorEnvelope::new(message);
        let _ = self.send_client(Message::Text(envelope.to_json().into())).await;
        self.close_client().await;
        RelayOutcome::UpstreamFailed
    }
}
