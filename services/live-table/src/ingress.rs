use croupier_execution::{BetError, Direction, JoinError};
use croupier_types::roulette::{
    PlayerId, RawTableSettings, RuleError, SessionRecord, SettingsError, Slot, SlotParseError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown table: {0}")]
    UnknownTable(String),
    #[error("table already exists: {0}")]
    TableExists(String),
    #[error("player is not seated")]
    NotSeated,
    #[error("player is seated at {0}")]
    SeatedElsewhere(String),
    #[error("admin permission required")]
    NotAdmin,
    #[error("socket already speaks for {0}")]
    PlayerMismatch(String),
    #[error("move not allowed")]
    IllegalMove,
    #[error("engine unavailable")]
    Unavailable,
    #[error(transparent)]
    Join(#[from] JoinError),
    #[error(transparent)]
    Bet(#[from] BetError),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Slot(#[from] SlotParseError),
}

impl CommandError {
    /// Stable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::UnknownTable(_) => "UNKNOWN_TABLE",
            CommandError::TableExists(_) => "TABLE_EXISTS",
            CommandError::NotSeated => "NOT_SEATED",
            CommandError::SeatedElsewhere(_) => "SEATED_ELSEWHERE",
            CommandError::NotAdmin => "NOT_ADMIN",
            CommandError::PlayerMismatch(_) => "PLAYER_MISMATCH",
            CommandError::IllegalMove => "ILLEGAL_MOVE",
            CommandError::Unavailable => "UNAVAILABLE",
            CommandError::Join(JoinError::TableFull { .. }) => "TABLE_FULL",
            CommandError::Join(JoinError::RoundInProgress) => "ROUND_IN_PROGRESS",
            CommandError::Join(JoinError::CannotAfford { .. }) => "INSUFFICIENT_BALANCE",
            CommandError::Join(JoinError::AlreadySeated) => "ALREADY_SEATED",
            CommandError::Bet(BetError::NotSelecting) => "BETTING_CLOSED",
            CommandError::Bet(BetError::InsufficientFunds { .. }) => "INSUFFICIENT_BALANCE",
            CommandError::Bet(_) => "INVALID_BET",
            CommandError::Rule(_) => "INVALID_RULE",
            CommandError::Settings(_) => "INVALID_SETTINGS",
            CommandError::Slot(_) => "INVALID_SLOT",
        }
    }
}

/// Public view of one table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub name: String,
    pub table_type: &'static str,
    pub state: &'static str,
    pub players: usize,
    pub max_players: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Done,
    Seated { table: String, seat: usize },
    Slot { slot: Slot },
    Bet { index: usize },
    Balance { balance: u64 },
    History { sessions: Vec<SessionRecord> },
    Tables { tables: Vec<TableSummary> },
}

pub type Response = oneshot::Sender<Result<Reply, CommandError>>;

/// Table changes reserved to admins.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdminAction {
    SetRule { rule: String, enabled: bool },
    SetSlot { slot: String, enabled: bool },
    SetChip { chip: String, enabled: bool },
    SetHouseAccount { account: Option<String> },
    SetStartTime { seconds: u32 },
    SetPlayerLimits { min: usize, max: usize },
}

/// Messages sent to the engine.
pub enum Command {
    Join {
        player: PlayerId,
        table: String,
        response: Response,
    },
    Leave {
        player: PlayerId,
        response: Response,
    },
    SelectChip {
        player: PlayerId,
        chip: String,
        response: Response,
    },
    MoveChip {
        player: PlayerId,
        direction: Direction,
        response: Response,
    },
    SelectSlot {
        player: PlayerId,
        slot: Slot,
        response: Response,
    },
    NewBet {
        player: PlayerId,
        response: Response,
    },
    Balance {
        player: PlayerId,
        response: Response,
    },
    History {
        player: PlayerId,
        limit: usize,
        response: Response,
    },
    Tables {
        response: Response,
    },
    Admin {
        player: PlayerId,
        table: String,
        action: AdminAction,
        response: Response,
    },
    CreateTable {
        player: PlayerId,
        name: String,
        settings: RawTableSettings,
        response: Response,
    },
    DeleteTable {
        player: PlayerId,
        name: String,
        response: Response,
    },
    RemoveSession {
        player: PlayerId,
        id: Uuid,
        response: Response,
    },
    /// The player's socket closed.
    Disconnect {
        player: PlayerId,
    },
    Shutdown {
        response: oneshot::Sender<()>,
    },
}

/// Mailbox for the engine.
#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Command>,
}

impl Mailbox {
    pub fn new(sender: mpsc::Sender<Command>) -> Self {
        Self { sender }
    }

    /// Send a command built around a fresh response channel and wait for the reply.
    pub async fn request(
        &self,
        command: impl FnOnce(Response) -> Command,
    ) -> Result<Reply, CommandError> {
        let (response, receiver) = oneshot::channel();
        if self.sender.send(command(response)).await.is_err() {
            warn!("engine mailbox closed; command dropped");
            return Err(CommandError::Unavailable);
        }
        receiver.await.unwrap_or(Err(CommandError::Unavailable))
    }

    pub async fn disconnect(&self, player: PlayerId) {
        if self.sender.send(Command::Disconnect { player }).await.is_err() {
            warn!("engine mailbox closed; disconnect dropped");
        }
    }

    /// Ask the engine to close every table and stop.
    pub async fn shutdown(&self) {
        let (response, receiver) = oneshot::channel();
        if self.sender.send(Command::Shutdown { response }).await.is_err() {
            return;
        }
        let _ = receiver.await;
    }
}
