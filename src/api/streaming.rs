//! WebSocket upgrade routes for the streaming relay

use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade, ws::WebSocket},
    response::Response,
    routing::get,
};
use futures::StreamExt;

use super::ApiState;
use crate::relay::{Flavor, RelaySession};

/// Build streaming router: one upgrade route per relay flavor
pub fn router(state: Arc<ApiState>) -> Router {
    Flavor::ALL
        .into_iter()
        .fold(Router::new(), |router, flavor| {
            router.route(
                flavor.path(),
                get(move |State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade| async move {
                    ws_upgrade(state, ws, flavor)
                }),
            )
        })
        .with_state(state)
}

/// Handle WebSocket upgrade request
fn ws_upgrade(state: Arc<ApiState>, ws: WebSocketUpgrade, flavor: Flavor) -> Response {
    tracing::debug!(flavor = flavor.name(), "streaming upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state, flavor))
}

/// Relay one upgraded socket until either side closes
async fn handle_socket(socket: WebSocket, state: Arc<ApiState>, flavor: Flavor) {
    let (sender, receiver) = socket.split();

    // Connect failures are logged and the client is closed inside `open`
    if let Ok(session) = RelaySession::open(state.connector.as_ref(), flavor, sender, receiver).await {
        session.run().await;
    }
}
