use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use presence_shared::frame;
use presence_shared::protocol::ControlMsg;
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc, oneshot, OwnedSemaphorePermit, Semaphore};

use crate::relay::{JoinRejected, Payload, RelayBroadcast, RelayCommand};

/// Close code sent when the requested id is already connected.
const CLOSE_DUPLICATE_ID: u16 = 4001;

/// The transport accepts this multiple of `max_frame_bytes` so that an
/// oversize frame reaches the relay loop and is dropped there instead of
/// tearing down the socket. Anything larger still closes the connection.
const TRANSPORT_LIMIT_FACTOR: usize = 2;

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub relay_tx: mpsc::Sender<RelayCommand>,
    pub broadcast_tx: broadcast::Sender<RelayBroadcast>,
    pub connection_semaphore: Arc<Semaphore>,
    pub max_frame_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct JoinParams {
    pub id: Option<u32>,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<JoinParams>,
    State(app_state): State<AppState>,
) -> Response {
    let permit = match app_state.connection_semaphore.clone().try_acquire_owned() {
        Ok(p) => p,
        Err(_) => {
            tracing::warn!("Connection limit reached, refusing upgrade");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };
    ws.max_message_size(app_state.max_frame_bytes.saturating_mul(TRANSPORT_LIMIT_FACTOR))
        .on_upgrade(move |socket| handle_socket(socket, app_state, params.id, permit))
        .into_response()
}

async fn handle_socket(
    socket: WebSocket,
    app_state: AppState,
    requested_id: Option<u32>,
    _permit: OwnedSemaphorePermit,
) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe first so nothing between the join and the first recv is lost.
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .relay_tx
        .send(RelayCommand::Join {
            requested_id,
            response: resp_tx,
        })
        .await
        .is_err()
    {
        tracing::error!("Failed to send Join command");
        return;
    }

    let joined = match resp_rx.await {
        Ok(Ok(joined)) => joined,
        Ok(Err(JoinRejected::DuplicateId(id))) => {
            tracing::warn!("Refusing second connection for participant {}", id);
            let _ = sink
                .send(Message::Close(Some(CloseFrame {
                    code: CLOSE_DUPLICATE_ID,
                    reason: "id already connected".into(),
                })))
                .await;
            return;
        }
        Err(_) => {
            tracing::error!("Failed to receive join response");
            return;
        }
    };
    let my_id = joined.id;

    tracing::info!("Participant {} connected", my_id);

    let mut connected = true;
    for msg in &joined.backlog {
        if sink.send(Message::Text(msg.to_json().into())).await.is_err() {
            connected = false;
            break;
        }
    }

    while connected {
        tokio::select! {
            // Client -> Relay
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match ControlMsg::parse(&text) {
                            Ok(msg) => {
                                let _ = app_state
                                    .relay_tx
                                    .send(RelayCommand::Control { from: my_id, msg })
                                    .await;
                            }
                            Err(e) => tracing::warn!("Participant {}: {}", my_id, e),
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        if bytes.len() > app_state.max_frame_bytes {
                            tracing::warn!("Participant {} sent an oversize frame ({} bytes)", my_id, bytes.len());
                            continue;
                        }
                        if let Err(e) = frame::decode(&bytes) {
                            tracing::warn!("Participant {} sent a bad frame: {}", my_id, e);
                            continue;
                        }
                        let _ = app_state
                            .relay_tx
                            .send(RelayCommand::Frame { from: my_id, bytes })
                            .await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("Participant {} socket error: {}", my_id, e);
                        break;
                    }
                    _ => {} // Ignore ping/pong
                }
            }

            // Relay -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(RelayBroadcast { from, payload }) => {
                        if from == my_id {
                            continue;
                        }
                        let msg = match payload {
                            Payload::Text(text) => Message::Text(text.into()),
                            Payload::Binary(bytes) => Message::Binary(bytes),
                        };
                        if sink.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Poses are superseded next frame anyway.
                        tracing::warn!("Participant {} lagged by {} messages", my_id, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    // Cleanup on disconnect
    let _ = app_state
        .relay_tx
        .send(RelayCommand::Leave { id: my_id })
        .await;
    tracing::info!("Participant {} disconnected", my_id);
}
