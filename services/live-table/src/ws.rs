//! Websocket surface: wire types and the per-socket read/write loops.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use croupier_execution::roulette::{Anchor, EquipmentSlot, Item, Visual, VisualId};
use croupier_execution::Direction;
use croupier_types::roulette::{Chip, RawTableSettings, Slot};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ingress::{AdminAction, Command, CommandError, Mailbox, Reply};

const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_HISTORY_LIMIT: usize = 100;

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum InboundMessage {
    Join {
        request_id: String,
        player_id: String,
        table: String,
    },
    Leave {
        request_id: String,
        player_id: String,
    },
    Chip {
        request_id: String,
        player_id: String,
        chip: String,
    },
    Move {
        request_id: String,
        player_id: String,
        direction: Direction,
    },
    Slot {
        request_id: String,
        player_id: String,
        slot: Slot,
    },
    NewBet {
        request_id: String,
        player_id: String,
    },
    Balance {
        request_id: String,
        player_id: String,
    },
    History {
        request_id: String,
        player_id: String,
        #[serde(default = "default_history_limit")]
        limit: usize,
    },
    Tables {
        request_id: String,
    },
    Admin {
        request_id: String,
        player_id: String,
        table: String,
        action: AdminAction,
    },
    CreateTable {
        request_id: String,
        player_id: String,
        name: String,
        #[serde(default)]
        settings: RawTableSettings,
    },
    DeleteTable {
        request_id: String,
        player_id: String,
        name: String,
    },
    RemoveSession {
        request_id: String,
        player_id: String,
        id: Uuid,
    },
}

impl InboundMessage {
    pub fn request_id(&self) -> &str {
        match self {
            InboundMessage::Join { request_id, .. }
            | InboundMessage::Leave { request_id, .. }
            | InboundMessage::Chip { request_id, .. }
            | InboundMessage::Move { request_id, .. }
            | InboundMessage::Slot { request_id, .. }
            | InboundMessage::NewBet { request_id, .. }
            | InboundMessage::Balance { request_id, .. }
            | InboundMessage::History { request_id, .. }
            | InboundMessage::Tables { request_id }
            | InboundMessage::Admin { request_id, .. }
            | InboundMessage::CreateTable { request_id, .. }
            | InboundMessage::DeleteTable { request_id, .. }
            | InboundMessage::RemoveSession { request_id, .. } => request_id,
        }
    }

    /// Player the socket speaks for, if the message names one.
    pub fn player_id(&self) -> Option<&str> {
        match self {
            InboundMessage::Join { player_id, .. }
            | InboundMessage::Leave { player_id, .. }
            | InboundMessage::Chip { player_id, .. }
            | InboundMessage::Move { player_id, .. }
            | InboundMessage::Slot { player_id, .. }
            | InboundMessage::NewBet { player_id, .. }
            | InboundMessage::Balance { player_id, .. }
            | InboundMessage::History { player_id, .. }
            | InboundMessage::Admin { player_id, .. }
            | InboundMessage::CreateTable { player_id, .. }
            | InboundMessage::DeleteTable { player_id, .. }
            | InboundMessage::RemoveSession { player_id, .. } => Some(player_id),
            InboundMessage::Tables { .. } => None,
        }
    }

    /// Turn the message into an engine command answering on `response`.
    pub fn into_command(self, response: crate::ingress::Response) -> Command {
        match self {
            InboundMessage::Join {
                player_id, table, ..
            } => Command::Join {
                player: player_id,
                table,
                response,
            },
            InboundMessage::Leave { player_id, .. } => Command::Leave {
                player: player_id,
                response,
            },
            InboundMessage::Chip {
                player_id, chip, ..
            } => Command::SelectChip {
                player: player_id,
                chip,
                response,
            },
            InboundMessage::Move {
                player_id,
                direction,
                ..
            } => Command::MoveChip {
                player: player_id,
                direction,
                response,
            },
            InboundMessage::Slot {
                player_id, slot, ..
            } => Command::SelectSlot {
                player: player_id,
                slot,
                response,
            },
            InboundMessage::NewBet { player_id, .. } => Command::NewBet {
                player: player_id,
                response,
            },
            InboundMessage::Balance { player_id, .. } => Command::Balance {
                player: player_id,
                response,
            },
            InboundMessage::History {
                player_id, limit, ..
            } => Command::History {
                player: player_id,
                limit: limit.clamp(1, MAX_HISTORY_LIMIT),
                response,
            },
            InboundMessage::Tables { .. } => Command::Tables { response },
            InboundMessage::Admin {
                player_id,
                table,
                action,
                ..
            } => Command::Admin {
                player: player_id,
                table,
                action,
                response,
            },
            InboundMessage::CreateTable {
                player_id,
                name,
                settings,
                ..
            } => Command::CreateTable {
                player: player_id,
                name,
                settings,
                response,
            },
            InboundMessage::DeleteTable {
                player_id, name, ..
            } => Command::DeleteTable {
                player: player_id,
                name,
                response,
            },
            InboundMessage::RemoveSession { player_id, id, .. } => Command::RemoveSession {
                player: player_id,
                id,
                response,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum VisualChange {
    Spawn {
        id: VisualId,
        visual: Visual,
        at: Anchor,
    },
    Teleport {
        id: VisualId,
        at: Anchor,
    },
    Destroy {
        id: VisualId,
    },
    Equip {
        id: VisualId,
        slot: EquipmentSlot,
        item: Item,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStateMessage {
    pub state: &'static str,
    pub round: u64,
    pub players: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Slot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundEvent {
    Chat {
        player_id: String,
        key: &'static str,
        text: String,
    },
    ChipMenu {
        player_id: String,
        table: String,
        chips: Vec<Chip>,
    },
    MenuClosed {
        player_id: String,
    },
    Visual {
        table: String,
        change: VisualChange,
    },
    State {
        table: String,
        payload: TableStateMessage,
    },
}

impl OutboundEvent {
    /// Private events go to their player only; table events go to everyone.
    pub fn is_for(&self, player: Option<&str>) -> bool {
        match self {
            OutboundEvent::Chat { player_id, .. }
            | OutboundEvent::ChipMenu { player_id, .. }
            | OutboundEvent::MenuClosed { player_id } => player == Some(player_id.as_str()),
            OutboundEvent::Visual { .. } | OutboundEvent::State { .. } => true,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundResponse {
    Ack {
        request_id: String,
        reply: Reply,
    },
    Error {
        request_id: String,
        code: String,
        message: String,
    },
}

impl OutboundResponse {
    pub fn from_result(request_id: String, result: Result<Reply, CommandError>) -> Self {
        match result {
            Ok(reply) => OutboundResponse::Ack { request_id, reply },
            Err(err) => OutboundResponse::Error {
                request_id,
                code: err.code().to_string(),
                message: err.to_string(),
            },
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub mailbox: Mailbox,
    pub events: broadcast::Sender<OutboundEvent>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let (player_tx, player_rx) = watch::channel::<Option<String>>(None);
    let mut events = state.events.subscribe();

    let write_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let event_task = {
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "socket lagging; events dropped");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if !event.is_for(player_rx.borrow().as_deref()) {
                    continue;
                }
                if let Ok(payload) = serde_json::to_string(&event) {
                    let _ = tx.send(Message::Text(payload));
                }
            }
        })
    };

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<InboundMessage>(&text) {
                Ok(inbound) => {
                    let request_id = inbound.request_id().to_string();
                    let bound = player_tx.borrow().clone();
                    match bind_player(bound.as_deref(), inbound.player_id()) {
                        Ok(Some(player)) => {
                            player_tx.send_replace(Some(player));
                        }
                        Ok(None) => {}
                        Err(err) => {
                            warn!(%err, "socket tried to switch player");
                            send_response(&tx, OutboundResponse::from_result(request_id, Err(err)));
                            continue;
                        }
                    }
                    let result = state
                        .mailbox
                        .request(|response| inbound.into_command(response))
                        .await;
                    send_response(&tx, OutboundResponse::from_result(request_id, result));
                }
                Err(err) => {
                    warn!(?err, "invalid inbound message");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    let player = player_tx.borrow().clone();
    if let Some(player) = player {
        debug!(player = %player, "socket closed");
        state.mailbox.disconnect(player).await;
    }
    write_task.abort();
    event_task.abort();
}

/// A socket speaks for the first player it names and no other.
///
/// Returns the player to bind when the socket was not bound yet.
fn bind_player(bound: Option<&str>, claimed: Option<&str>) -> Result<Option<String>, CommandError> {
    match (bound, claimed) {
        (_, None) => Ok(None),
        (None, Some(claimed)) => Ok(Some(claimed.to_string())),
        (Some(bound), Some(claimed)) if bound == claimed => Ok(None),
        (Some(bound), Some(_)) => Err(CommandError::PlayerMismatch(bound.to_string())),
    }
}

fn send_response(tx: &mpsc::UnboundedSender<Message>, response: OutboundResponse) {
    if let Ok(payload) = serde_json::to_string(&response) {
        let _ = tx.send(Message::Text(payload));
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}
