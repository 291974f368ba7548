use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::Extension;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use lifeline::dispatch::EventBroadcaster;

/// Commands clients may send over the socket. A single global room is
/// honored; per-room targeting is not needed yet.
#[derive(Debug, Deserialize)]
struct ClientCommand {
    action: String,
    #[serde(default)]
    room: Option<String>,
}

pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(broadcaster): Extension<EventBroadcaster>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| client_session(socket, broadcaster))
}

/// Pump loop for one connected client: fan dispatch events out as JSON and
/// handle inbound commands until either side hangs up.
async fn client_session(mut socket: WebSocket, broadcaster: EventBroadcaster) {
    let mut events = broadcaster.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(error = %err, "dropping unserializable event");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Best-effort delivery: a slow client just misses events.
                    debug!(skipped, "client lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(command) = serde_json::from_str::<ClientCommand>(&text) {
                        if command.action == "join_room" {
                            let room = command.room.unwrap_or_else(|| "global".to_string());
                            info!(room, "client joined room");
                            let ack = serde_json::json!({ "event": "room_joined", "room": room });
                            if socket.send(Message::Text(ack.to_string())).await.is_err() {
                                break;
                            }
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }

    debug!("client disconnected");
}
