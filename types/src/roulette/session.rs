use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Slot;

pub type PlayerId = String;

/// How a bet was settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinType {
    /// Slot equals or contains the winning pocket; pays stake times multiplier.
    Normal,
    /// Zero hit an even-money bet under La Partage; half the stake back.
    LaPartage,
    /// A bet held in prison won its second spin; the stake is returned.
    EnPrison,
    /// Zero hit an even-money bet on an american table under Surrender; half the stake back.
    Surrender,
}

impl WinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WinType::Normal => "normal",
            WinType::LaPartage => "la_partage",
            WinType::EnPrison => "en_prison",
            WinType::Surrender => "surrender",
        }
    }

    /// Amount returned to the player for a stake of `price`.
    pub fn payout(&self, price: u64, multiplier: u64) -> u64 {
        match self {
            WinType::Normal => price.saturating_mul(multiplier),
            WinType::EnPrison => price,
            WinType::LaPartage | WinType::Surrender => price / 2,
        }
    }
}

/// Outcome assigned to one bet during resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinData {
    pub player: PlayerId,
    pub bet_index: usize,
    pub win_type: WinType,
}

/// One bet as recorded in the session history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBet {
    pub player: PlayerId,
    pub slot: Slot,
    pub stake: u64,
    pub payout: u64,
    pub win: Option<WinType>,
    #[serde(default)]
    pub en_prison: bool,
}

/// Snapshot of a resolved round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub table: String,
    pub winner: Slot,
    pub timestamp_ms: u64,
    pub bets: Vec<SessionBet>,
}

impl SessionRecord {
    pub fn involves(&self, player: &str) -> bool {
        self.bets.iter().any(|bet| bet.player == player)
    }

    pub fn total_staked(&self) -> u64 {
        self.bets.iter().map(|bet| bet.stake).sum()
    }

    pub fn total_paid(&self) -> u64 {
        self.bets.iter().map(|bet| bet.payout).sum()
    }
}
