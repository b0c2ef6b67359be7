use crate::api::rest::AppState;
use crate::db::models::Alarm;
use crate::messaging::WsNotifier;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Server→client events on the realtime channel
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
enum ServerEvent {
    NewAlarm(Alarm),
}

/// `GET /` — plain liveness text for browsers, WebSocket upgrade for
/// dashboard clients (the realtime channel shares the HTTP port).
pub async fn root_handler(
    ws: Option<WebSocketUpgrade>,
    State(state): State<AppState>,
) -> Response {
    match ws {
        Some(ws) => {
            let notifier = state.notifier.clone();
            ws.on_upgrade(move |socket| handle_socket(socket, notifier))
                .into_response()
        }
        None => "Security Tower backend running".into_response(),
    }
}

/// Forward alarm broadcasts to one connected dashboard until it leaves.
/// Inbound messages are ignored; disconnect is passive.
async fn handle_socket(socket: WebSocket, notifier: Arc<WsNotifier>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = notifier.subscribe();

    info!("Dashboard client connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(alarm) => {
                    let message = match serde_json::to_string(&ServerEvent::NewAlarm(alarm)) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("Failed to serialize alarm event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(message)).await.is_err() {
                        break;
                    }
                }
                // No replay for slow clients: dropped events stay dropped.
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Dashboard client lagged, {} events dropped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(other)) => {
                    debug!("Ignoring inbound websocket message: {:?}", other);
                }
                Some(Err(_)) => break,
            },
        }
    }

    info!("Dashboard client disconnected");
}
