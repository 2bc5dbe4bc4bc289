use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::Response,
};
use flume::Receiver;
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use htmldisplay_core::{ActionId, ServerMessage};
use serde::Deserialize;

use crate::{state::AppState, tracker::ConnectionTracker};

#[derive(Debug, Deserialize)]
pub struct ChannelQuery {
    #[serde(rename = "actionId")]
    action_id: Option<String>,
}

pub async fn websocket_handler(
    Query(query): Query<ChannelQuery>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, StatusCode> {
    let action_id: ActionId = query
        .action_id
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|error| {
            tracing::warn!("rejecting live channel: {error}");
            StatusCode::BAD_REQUEST
        })?;

    let tracker = state.tracker().clone();

    Ok(ws.on_upgrade(move |socket| handle_websocket(socket, tracker, action_id)))
}

async fn handle_websocket(socket: WebSocket, tracker: ConnectionTracker, action_id: ActionId) {
    let channel = tracker.connect(action_id);
    tracing::info!("preview window connected for action {}", channel.action_id());

    let (tx, rx) = socket.split();

    let mut send_task = tokio::spawn(handle_outgoing_messages(tx, channel.outbox()));
    let mut recv_task = tokio::spawn(handle_incoming_messages(rx));

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracker.disconnect(&channel);
    tracing::info!("preview window disconnected for action {}", channel.action_id());
}

/// Write server messages to the window. Every server message ends the channel.
async fn handle_outgoing_messages(
    mut sender: SplitSink<WebSocket, Message>,
    outbox: Receiver<ServerMessage>,
) {
    let Ok(message) = outbox.recv_async().await else {
        return;
    };

    if let Some(payload) = message.payload()
        && let Err(error) = sender.send(Message::Text(payload.into())).await
    {
        tracing::debug!("failed to send {message:?} to window: {error}");
        return;
    }

    if let Err(error) = sender.send(Message::Close(None)).await {
        tracing::debug!("failed to close channel: {error}");
    }
}

async fn handle_incoming_messages(mut receiver: SplitStream<WebSocket>) {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) => break,
            Ok(Message::Text(text)) => {
                tracing::debug!("ignoring message from window: {}", text.as_str());
            }
            Ok(_) => {}
            Err(error) => {
                tracing::debug!("channel dropped: {error}");
                break;
            }
        }
    }
}
