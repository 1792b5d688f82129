use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::{GameRule, House, PlayerId, RuleSet, Slot, TableType};

pub const DEFAULT_MIN_PLAYERS: usize = 1;
pub const DEFAULT_MAX_PLAYERS: usize = 10;
pub const DEFAULT_START_TIME: u32 = 15;
pub const DEFAULT_MAX_BETS: usize = 3;
pub const DEFAULT_CROUPIER_NAME: &str = "Croupier";

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum SettingsError {
    #[error("min_players must be at least 1")]
    NoPlayers,
    #[error("max_players below min_players (min={min}, max={max})")]
    InvertedLimits { min: usize, max: usize },
    #[error("max_bets must be at least 1")]
    NoBets,
    #[error("start_time must be greater than zero")]
    NoStartTime,
}

/// A persisted value that could not be applied and was defaulted or dropped.
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum SettingsWarning {
    #[error("invalid table_type {0:?}, defaulting to european")]
    TableType(String),
    #[error("invalid slot {0:?} in disabled_slots, ignored")]
    Slot(String),
    #[error("invalid rule {0:?}, ignored")]
    Rule(String),
    #[error("rule {rule} disabled: {reason}")]
    RuleRejected { rule: GameRule, reason: String },
    #[error("unknown chip {0:?} in disabled_chips, ignored")]
    Chip(String),
    #[error("{0}, limits reset to defaults")]
    Limits(SettingsError),
}

/// Validated per-table settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSettings {
    pub table_type: TableType,
    pub min_players: usize,
    pub max_players: usize,
    /// Seconds of the starting countdown.
    pub start_time: u32,
    pub rules: RuleSet,
    pub disabled_slots: BTreeSet<Slot>,
    pub disabled_chips: BTreeSet<String>,
    /// Player credited with every losing stake.
    pub house_account: Option<PlayerId>,
    pub croupier_name: String,
    /// Seat players again after a round instead of sending them away.
    pub keep_seats: bool,
    pub max_bets: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            table_type: TableType::default(),
            min_players: DEFAULT_MIN_PLAYERS,
            max_players: DEFAULT_MAX_PLAYERS,
            start_time: DEFAULT_START_TIME,
            rules: RuleSet::default(),
            disabled_slots: BTreeSet::new(),
            disabled_chips: BTreeSet::new(),
            house_account: None,
            croupier_name: DEFAULT_CROUPIER_NAME.to_string(),
            keep_seats: true,
            max_bets: DEFAULT_MAX_BETS,
        }
    }
}

impl TableSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.min_players == 0 {
            return Err(SettingsError::NoPlayers);
        }
        if self.max_players < self.min_players {
            return Err(SettingsError::InvertedLimits {
                min: self.min_players,
                max: self.max_players,
            });
        }
        if self.max_bets == 0 {
            return Err(SettingsError::NoBets);
        }
        if self.start_time == 0 {
            return Err(SettingsError::NoStartTime);
        }
        Ok(())
    }
}

/// Settings as stored on disk, keyed by table name in the table store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTableSettings {
    #[serde(default)]
    pub table_type: Option<String>,
    #[serde(default)]
    pub min_players: Option<usize>,
    #[serde(default)]
    pub max_players: Option<usize>,
    #[serde(default)]
    pub start_time: Option<u32>,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    pub disabled_slots: Vec<String>,
    #[serde(default)]
    pub disabled_chips: Vec<String>,
    #[serde(default)]
    pub house_account: Option<String>,
    #[serde(default)]
    pub croupier_name: Option<String>,
    #[serde(default)]
    pub keep_seats: Option<bool>,
    #[serde(default)]
    pub max_bets: Option<usize>,
}

impl RawTableSettings {
    /// Resolve into validated settings, defaulting anything that does not parse.
    pub fn resolve(&self, house: &House) -> (TableSettings, Vec<SettingsWarning>) {
        let mut warnings = Vec::new();
        let mut settings = TableSettings::default();

        if let Some(raw) = &self.table_type {
            match raw.parse::<TableType>() {
                Ok(table_type) => settings.table_type = table_type,
                Err(_) => warnings.push(SettingsWarning::TableType(raw.clone())),
            }
        }
        settings.min_players = self.min_players.unwrap_or(DEFAULT_MIN_PLAYERS);
        settings.max_players = self.max_players.unwrap_or(DEFAULT_MAX_PLAYERS);
        settings.start_time = self.start_time.unwrap_or(DEFAULT_START_TIME);
        settings.max_bets = self.max_bets.unwrap_or(DEFAULT_MAX_BETS);
        if let Err(err) = settings.validate() {
            let defaults = TableSettings::default();
            settings.min_players = defaults.min_players;
            settings.max_players = defaults.max_players;
            settings.start_time = defaults.start_time;
            settings.max_bets = defaults.max_bets;
            warnings.push(SettingsWarning::Limits(err));
        }

        for raw in &self.rules {
            let rule = match raw.parse::<GameRule>() {
                Ok(rule) => rule,
                Err(_) => {
                    warnings.push(SettingsWarning::Rule(raw.clone()));
                    continue;
                }
            };
            match rule.validate(settings.table_type, settings.min_players) {
                Ok(()) => settings.rules.set(rule, true),
                Err(err) => warnings.push(SettingsWarning::RuleRejected {
                    rule,
                    reason: err.to_string(),
                }),
            }
        }

        for raw in &self.disabled_slots {
            match raw.parse::<Slot>() {
                Ok(slot) => {
                    settings.disabled_slots.insert(slot);
                }
                Err(_) => warnings.push(SettingsWarning::Slot(raw.clone())),
            }
        }

        for raw in &self.disabled_chips {
            if house.chip(raw).is_some() {
                settings.disabled_chips.insert(raw.clone());
            } else {
                warnings.push(SettingsWarning::Chip(raw.clone()));
            }
        }

        settings.house_account = self
            .house_account
            .as_ref()
            .map(|account| account.trim().to_string())
            .filter(|account| !account.is_empty());
        if let Some(name) = &self.croupier_name {
            settings.croupier_name = name.clone();
        }
        if let Some(keep_seats) = self.keep_seats {
            settings.keep_seats = keep_seats;
        }

        (settings, warnings)
    }
}

impl From<&TableSettings> for RawTableSettings {
    fn from(settings: &TableSettings) -> Self {
        Self {
            table_type: Some(settings.table_type.as_str().to_string()),
            min_players: Some(settings.min_players),
            max_players: Some(settings.max_players),
            start_time: Some(settings.start_time),
            rules: settings
                .rules
                .enabled()
                .map(|rule| rule.as_str().to_string())
                .collect(),
            disabled_slots: settings.disabled_slots.iter().map(Slot::name).collect(),
            disabled_chips: settings.disabled_chips.iter().cloned().collect(),
            house_account: settings.house_account.clone(),
            croupier_name: Some(settings.croupier_name.clone()),
            keep_seats: Some(settings.keep_seats),
            max_bets: Some(settings.max_bets),
        }
    }
}
