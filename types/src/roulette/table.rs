use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::Slot;

/// Wheel variant of a table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    /// Single-zero wheel, 37 pockets.
    #[default]
    European,
    /// Double-zero wheel, 38 pockets.
    American,
}

impl TableType {
    /// Whether `slot` exists on this table's layout.
    pub fn allows(&self, slot: Slot) -> bool {
        !(matches!(self, TableType::European) && slot == Slot::DoubleZero)
    }

    pub fn pocket_count(&self) -> usize {
        match self {
            TableType::European => 37,
            TableType::American => 38,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableType::European => "european",
            TableType::American => "american",
        }
    }
}

impl FromStr for TableType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "european" => Ok(TableType::European),
            "american" => Ok(TableType::American),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum RuleError {
    #[error("en prison requires min_players == 1 (got={min_players})")]
    EnPrisonRequiresSinglePlayer { min_players: usize },
    #[error("surrender is only available on american tables")]
    SurrenderRequiresAmerican,
    #[error("unknown rule: {0}")]
    Unknown(String),
}

/// Optional house rule softening the house edge when a zero hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameRule {
    LaPartage,
    EnPrison,
    Surrender,
}

impl GameRule {
    pub const ALL: [GameRule; 3] = [GameRule::LaPartage, GameRule::EnPrison, GameRule::Surrender];

    /// Check the rule can be enabled on a table with this shape.
    pub fn validate(&self, table_type: TableType, min_players: usize) -> Result<(), RuleError> {
        match self {
            GameRule::EnPrison if min_players != 1 => {
                Err(RuleError::EnPrisonRequiresSinglePlayer { min_players })
            }
            GameRule::Surrender if table_type != TableType::American => {
                Err(RuleError::SurrenderRequiresAmerican)
            }
            _ => Ok(()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameRule::LaPartage => "la_partage",
            GameRule::EnPrison => "en_prison",
            GameRule::Surrender => "surrender",
        }
    }
}

impl fmt::Display for GameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameRule {
    type Err = RuleError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "la_partage" | "partage" => Ok(GameRule::LaPartage),
            "en_prison" | "prison" => Ok(GameRule::EnPrison),
            "surrender" => Ok(GameRule::Surrender),
            _ => Err(RuleError::Unknown(raw.to_string())),
        }
    }
}

/// Per-table rule toggles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub la_partage: bool,
    #[serde(default)]
    pub en_prison: bool,
    #[serde(default)]
    pub surrender: bool,
}

impl RuleSet {
    pub fn is_enabled(&self, rule: GameRule) -> bool {
        match rule {
            GameRule::LaPartage => self.la_partage,
            GameRule::EnPrison => self.en_prison,
            GameRule::Surrender => self.surrender,
        }
    }

    pub fn set(&mut self, rule: GameRule, enabled: bool) {
        match rule {
            GameRule::LaPartage => self.la_partage = enabled,
            GameRule::EnPrison => self.en_prison = enabled,
            GameRule::Surrender => self.surrender = enabled,
        }
    }

    pub fn enabled(&self) -> impl Iterator<Item = GameRule> + '_ {
        GameRule::ALL.into_iter().filter(|rule| self.is_enabled(*rule))
    }
}

/// Lifecycle of a round.
///
/// `Idle -> Starting -> Selecting -> Spinning -> Ending -> Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Idle,
    Starting,
    Selecting,
    Spinning,
    Ending,
}

impl GameState {
    /// Players may only sit down before bets open.
    pub fn accepts_players(&self) -> bool {
        matches!(self, GameState::Idle | GameState::Starting)
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self, GameState::Selecting)
    }

    /// Stakes are locked once the wheel spins.
    pub fn is_locked(&self) -> bool {
        matches!(self, GameState::Spinning | GameState::Ending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Idle => "idle",
            GameState::Starting => "starting",
            GameState::Selecting => "selecting",
            GameState::Spinning => "spinning",
            GameState::Ending => "ending",
        }
    }
}
