//! Debate room endpoints: the start stub and the room broadcast socket

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::{get, post},
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;

use super::ApiState;
use crate::room::{RoomHub, RoomPayload};

/// Room every debate joins until rooms are real
pub const DEMO_ROOM_ID: &str = "demo-room";

/// Response to starting a debate
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub success: bool,
    pub room_id: &'static str,
}

/// Build debate router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/debate/start", post(start))
        .route("/api/debate/room", get(room_upgrade))
        .with_state(state)
}

async fn start() -> Json<StartResponse> {
    Json(StartResponse {
        success: true,
        room_id: DEMO_ROOM_ID,
    })
}

async fn room_upgrade(State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let hub = state.room.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

/// Handle one room member's connection
async fn handle_socket(socket: WebSocket, hub: RoomHub) {
    let (mut sender, mut receiver) = socket.split();
    let (member, mut subscription) = hub.join();

    if sender.send(Message::Text(RoomHub::welcome().into())).await.is_err() {
        return;
    }

    tracing::info!(member = %member, members = hub.member_count(), "room member joined");

    // Forward frames from other members to this socket
    let mut broadcast_task = tokio::spawn(async move {
        while let Some(payload) = subscription.next().await {
            let message = match payload {
                RoomPayload::Text(text) => Message::Text(text.into()),
                RoomPayload::Binary(bytes) => Message::Binary(bytes.into()),
            };
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    // Publish this member's frames to everyone else
    let publisher = hub.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    publisher.publish(member, RoomPayload::Text(text.as_str().to_owned()));
                }
                Message::Binary(bytes) => {
                    publisher.publish(member, RoomPayload::Binary(bytes.to_vec()));
                }
                Message::Close(_) => break,
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut broadcast_task => recv_task.abort(),
        _ = &mut recv_task => broadcast_task.abort(),
    }

    tracing::info!(member = %member, "room member left");
}
