//! WebSocket transport between the host and its participants.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. Client sends `request_join` as its first text frame
//! 3. The connection is registered with the table actor together with an
//!    outbox channel; a send task drains that outbox onto the socket
//! 4. Later frames are forwarded to the table as play, start and Give-All
//!    intents
//! 5. On disconnect the peer leaves the table and a bot takes its seat
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws');
//! ws.onopen = () => ws.send(JSON.stringify({
//!   type: "request_join", name: "Asha", peer_id: "asha-1", version: 1
//! }));
//! ws.send(JSON.stringify({ type: "play_request", card: { suit: "spade", rank: "A" } }));
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use kazhutha::{
    PeerId, TableHandle,
    net::{
        messages::{ClientMessage, ServerMessage},
        protocol_version::ProtocolVersion,
        utils,
    },
    table::{TableClosed, actor::OUTBOX_CAPACITY},
};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use super::AppState;
use crate::logging;

/// Upgrade an HTTP connection to the participant WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// The identity a connection announced in its join frame.
struct JoinRequest {
    name: String,
    peer_id: PeerId,
    version: ProtocolVersion,
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let Some(join) = read_join(&mut sender, &mut receiver).await else {
        debug!("WebSocket closed before joining");
        return;
    };

    let (outbox, mut outbox_rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);
    let direct = outbox.clone();

    let response = match state
        .table
        .join(join.peer_id.clone(), &join.name, join.version, outbox)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to join table: {}", e);
            let _ = send_frame(&mut sender, &error_frame("Table is closed")).await;
            return;
        }
    };

    if let Some(message) = response.error_message() {
        logging::log_rejected_frame(join.peer_id.as_str(), &message);
        let _ = send_frame(&mut sender, &ServerMessage::Error { message }).await;
        let _ = sender.close().await;
        return;
    }

    logging::log_connection("joined", join.peer_id.as_str(), Some(&join.name));

    let send_task = tokio::spawn(async move {
        while let Some(frame) = outbox_rx.recv().await {
            if !send_frame(&mut sender, &frame).await {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let message = match utils::decode::<ClientMessage>(text.as_str()) {
                    Ok(message) => message,
                    Err(e) => {
                        logging::log_rejected_frame(join.peer_id.as_str(), &e.to_string());
                        let _ = direct.send(error_frame("Invalid message format")).await;
                        continue;
                    }
                };

                debug!("Received from {}: {}", join.peer_id, message);
                if let Err(e) = forward(&state.table, &join.peer_id, message, &direct).await {
                    error!("Lost table while handling {}: {}", join.peer_id, e);
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: peer={}", join.peer_id);
                break;
            }
            Ok(Message::Binary(_)) => {
                logging::log_rejected_frame(join.peer_id.as_str(), "binary frame");
            }
            Err(e) => {
                warn!("WebSocket error for {}: {}", join.peer_id, e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    if state.table.leave(join.peer_id.clone()).await.is_err() {
        debug!("Table already closed when {} left", join.peer_id);
    }
    logging::log_connection("left", join.peer_id.as_str(), None);
}

/// Wait for the first text frame and insist that it is a join request.
async fn read_join(
    sender: &mut SplitSink<WebSocket, Message>,
    receiver: &mut SplitStream<WebSocket>,
) -> Option<JoinRequest> {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                return match utils::decode::<ClientMessage>(text.as_str()) {
                    Ok(ClientMessage::RequestJoin {
                        name,
                        peer_id,
                        version,
                    }) => Some(JoinRequest {
                        name,
                        peer_id,
                        version,
                    }),
                    Ok(other) => {
                        warn!("Expected a join request, got {}", other);
                        let _ = send_frame(sender, &error_frame("Join the table first")).await;
                        None
                    }
                    Err(e) => {
                        warn!("Failed to parse join request: {}", e);
                        let _ = send_frame(sender, &error_frame("Invalid message format")).await;
                        None
                    }
                };
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            _ => {}
        }
    }
    None
}

/// Turn a participant frame into a table intent.
async fn forward(
    table: &TableHandle,
    peer_id: &PeerId,
    message: ClientMessage,
    direct: &mpsc::Sender<ServerMessage>,
) -> Result<(), TableClosed> {
    match message {
        ClientMessage::RequestJoin { .. } => {
            let _ = direct.send(error_frame("Already joined")).await;
        }
        ClientMessage::StartGame => {
            let response = table.start_game(peer_id.clone()).await?;
            if let Some(message) = response.error_message() {
                let _ = direct.send(ServerMessage::Error { message }).await;
            }
        }
        ClientMessage::PlayRequest { card } => {
            table.play_card(peer_id.clone(), card).await?;
        }
        ClientMessage::GiveAllRequest { target_peer_id } => {
            table
                .request_give_all(peer_id.clone(), target_peer_id)
                .await?;
        }
        ClientMessage::GiveAllResponse { accepted } => {
            table.respond_give_all(peer_id.clone(), accepted).await?;
        }
    }
    Ok(())
}

fn error_frame(message: &str) -> ServerMessage {
    ServerMessage::Error {
        message: message.to_string(),
    }
}

/// Encode and send one frame. Returns false once the socket is gone.
async fn send_frame(sender: &mut SplitSink<WebSocket, Message>, frame: &ServerMessage) -> bool {
    let json = match utils::encode(frame) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize frame: {}", e);
            return true;
        }
    };
    sender.send(Message::Text(json.into())).await.is_ok()
}
