use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use serde::Deserialize;

use ledger_api::wire::EventMessage;

use super::AppState;

// ═══════════════════════════════════════════════════════════════
//  WebSocket: /ws/events[?name=logEvent]
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EventFilter {
    /// Only forward events with this name.
    name: Option<String>,
}

pub(crate) async fn handle_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(socket, state, filter))
}

/// Forward committed events until either side goes away. Events
/// committed before the upgrade are not replayed.
async fn ws_connection(mut socket: WebSocket, state: AppState, filter: EventFilter) {
    let mut sub = state.events.subscribe();
    tracing::debug!(filter = ?filter.name, "event stream opened");

    loop {
        tokio::select! {
            biased;

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                }
            }

            event = sub.recv() => {
                let Some(event) = event else { break };
                if filter.name.as_deref().is_some_and(|name| name != event.name) {
                    continue;
                }

                let frame = EventMessage::from(&event);
                match serde_json::to_string(&frame) {
                    Ok(json) => {
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(tx_id = %event.tx_id, error = %e, "event frame not serializable"),
                }
            }
        }
    }

    tracing::debug!("event stream closed");
}
