//! Debate room broadcast hub
//!
//! Every frame a member sends is delivered to all other members of the room.
//! There is a single room per process; nothing is persisted.

use tokio::sync::broadcast;
use uuid::Uuid;

/// Channel capacity for room frames
const CHANNEL_CAPACITY: usize = 256;

/// Greeting sent to every member on join
pub const WELCOME_MESSAGE: &str = "Connected to debate room WebSocket.";

/// Payload of a room frame, relayed verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomPayload {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone)]
struct RoomFrame {
    sender: Uuid,
    payload: RoomPayload,
}

/// Shared broadcast hub for the debate room
#[derive(Debug, Clone)]
pub struct RoomHub {
    tx: broadcast::Sender<RoomFrame>,
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomHub {
    /// Create an empty room
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Join the room, returning the member's id and its subscription
    #[must_use]
    pub fn join(&self) -> (Uuid, RoomSubscription) {
        let id = Uuid::new_v4();
        let subscription = RoomSubscription {
            id,
            rx: self.tx.subscribe(),
        };
        (id, subscription)
    }

    /// Publish a frame from `sender` to every other member
    ///
    /// Returns the number of subscriptions the frame reached (including the
    /// sender's own, which filters it out)
    pub fn publish(&self, sender: Uuid, payload: RoomPayload) -> usize {
        self.tx.send(RoomFrame { sender, payload }).unwrap_or(0)
    }

    /// Number of members currently subscribed
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// JSON welcome envelope sent on join
    #[must_use]
    pub fn welcome() -> String {
        serde_json::json!({ "type": "welcome", "message": WELCOME_MESSAGE }).to_string()
    }
}

/// A member's view of the room
pub struct RoomSubscription {
    id: Uuid,
    rx: broadcast::Receiver<RoomFrame>,
}

impl RoomSubscription {
    /// Wait for the next frame from another member
    ///
    /// Returns `None` once the hub is gone. Frames missed while lagging are
    /// skipped.
    pub async fn next(&mut self) -> Option<RoomPayload> {
        loop {
            match self.rx.recv().await {
                Ok(frame) if frame.sender == self.id => {}
                Ok(frame) => return Some(frame.payload),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(member = %self.id, skipped, "room member lagged, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
