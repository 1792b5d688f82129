//! Service configuration (`config.yml`) and the persisted table store (`tables.yml`).

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Context;
use croupier_execution::PhaseConfig;
use croupier_types::roulette::{Chip, House, Paytable, RawTableSettings, Slot, TableSettings};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Table name to stored settings.
pub type TableStore = BTreeMap<String, RawTableSettings>;

/// Service configuration. Countdowns are counted in ticks of `tick_ms`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_selecting_ticks")]
    pub selecting_ticks: u32,
    #[serde(default = "default_spin_ticks")]
    pub spin_ticks: u32,
    #[serde(default = "default_ending_ticks")]
    pub ending_ticks: u32,
    /// Balance credited to a player the first time they are seen.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: u64,
    #[serde(default)]
    pub chips: Vec<Chip>,
    /// Multiplier overrides keyed by slot name (`SLOT_RED: 3`).
    #[serde(default)]
    pub multipliers: BTreeMap<String, u64>,
    /// Message template overrides keyed by message key.
    #[serde(default)]
    pub messages: BTreeMap<String, String>,
    #[serde(default = "default_session_db")]
    pub session_db: PathBuf,
    #[serde(default = "default_store_buffer")]
    pub store_buffer: usize,
    #[serde(default = "default_mailbox_size")]
    pub mailbox_size: usize,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Players allowed to run admin commands.
    ///
    /// The gate trusts the player id a socket sends; there is no authentication, so only
    /// expose admin ids on a trusted network.
    #[serde(default)]
    pub admins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9123
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_ms() -> u64 {
    1_000
}

fn default_selecting_ticks() -> u32 {
    20
}

fn default_spin_ticks() -> u32 {
    8
}

fn default_ending_ticks() -> u32 {
    5
}

fn default_starting_balance() -> u64 {
    10_000
}

fn default_session_db() -> PathBuf {
    PathBuf::from("sessions.db")
}

fn default_store_buffer() -> usize {
    1_024
}

fn default_mailbox_size() -> usize {
    1_024
}

fn default_event_buffer() -> usize {
    1_024
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            tick_ms: default_tick_ms(),
            selecting_ticks: default_selecting_ticks(),
            spin_ticks: default_spin_ticks(),
            ending_ticks: default_ending_ticks(),
            starting_balance: default_starting_balance(),
            chips: Vec::new(),
            multipliers: BTreeMap::new(),
            messages: BTreeMap::new(),
            session_db: default_session_db(),
            store_buffer: default_store_buffer(),
            mailbox_size: default_mailbox_size(),
            event_buffer: default_event_buffer(),
            admins: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Read the config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found; using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).context("Could not parse config file")
    }

    pub fn phases(&self) -> anyhow::Result<PhaseConfig> {
        let phases = PhaseConfig::new(self.selecting_ticks, self.spin_ticks, self.ending_ticks);
        phases.validate().map_err(anyhow::Error::msg)?;
        Ok(phases)
    }

    /// Chip catalogue and paytable. Bad chips and unknown slot names are logged and skipped.
    pub fn house(&self) -> House {
        let mut overrides = BTreeMap::new();
        for (name, multiplier) in &self.multipliers {
            match name.parse::<Slot>() {
                Ok(slot) if *multiplier > 0 => {
                    overrides.insert(slot, *multiplier);
                }
                Ok(_) => warn!(slot = %name, "ignoring zero multiplier"),
                Err(err) => warn!(slot = %name, %err, "ignoring multiplier override"),
            }
        }

        let mut seen = BTreeSet::new();
        let chips: Vec<Chip> = self
            .chips
            .iter()
            .filter(|chip| {
                if chip.price == 0 || !seen.insert(chip.name.clone()) {
                    warn!(chip = %chip.name, price = chip.price, "ignoring chip");
                    return false;
                }
                true
            })
            .cloned()
            .collect();
        let chips = if chips.is_empty() {
            House::default().chips
        } else {
            chips
        };
        House::new(chips, Paytable::new(overrides))
    }
}

/// Read the table store. A missing file is an empty store.
pub fn load_tables(path: &Path) -> anyhow::Result<TableStore> {
    if !path.exists() {
        return Ok(TableStore::new());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read table store {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(TableStore::new());
    }
    serde_yaml::from_str(&contents).context("Could not parse table store")
}

/// Write the table store atomically (temp file, then rename).
pub fn save_tables(path: &Path, tables: &TableStore) -> anyhow::Result<()> {
    let contents = serde_yaml::to_string(tables).context("Could not encode table store")?;
    let tmp = path.with_extension("yml.tmp");
    std::fs::write(&tmp, contents)
        .with_context(|| format!("Could not write table store {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Could not replace table store {}", path.display()))?;
    Ok(())
}

/// Resolve stored settings, logging every value that had to be defaulted.
pub fn resolve_table(name: &str, raw: &RawTableSettings, house: &House) -> TableSettings {
    let (settings, warnings) = raw.resolve(house);
    for warning in warnings {
        warn!(table = name, %warning, "table setting defaulted");
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use croupier_types::roulette::{GameRule, TableType};

    #[test]
    fn test_defaults_from_empty_file() {
        let config = ServiceConfig::parse("").unwrap();
        assert_eq!(config.port, 9123);
        assert_eq!(config.tick_ms, 1_000);
        assert_eq!(config.phases().unwrap(), PhaseConfig::new(20, 8, 5));
        assert_eq!(config.house(), House::default());

        let config = ServiceConfig::parse("port: 7000\nspin_ticks: 3\n").unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.spin_ticks, 3);
        assert_eq!(config.selecting_ticks, 20);
    }

    #[test]
    fn test_invalid_phases_are_rejected() {
        let config = ServiceConfig::parse("selecting_ticks: 0\n").unwrap();
        assert!(config.phases().is_err());
    }

    #[test]
    fn test_house_from_config() {
        let config = ServiceConfig::parse(
            "chips:\n  - name: small\n    price: 5\n  - name: big\n    display_name: Big chip\n    price: 250\n  - name: small\n    price: 7\n  - name: free\n    price: 0\nmultipliers:\n  SLOT_RED: 3\n  SLOT_NOWHERE: 9\n",
        )
        .unwrap();
        let house = config.house();
        assert_eq!(house.chips.len(), 2);
        assert_eq!(house.chip("small").unwrap().price, 5);
        assert_eq!(house.chip("small").unwrap().display_name(), "small");
        assert_eq!(house.chip("big").unwrap().display_name(), "Big chip");
        assert_eq!(house.paytable.multiplier(Slot::Red), 3);
        assert_eq!(house.paytable.multiplier(Slot::Black), 2);
        assert_eq!(house.paytable.overrides().len(), 1);
    }

    #[test]
    fn test_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::load(&dir.path().join("config.yml")).unwrap();
        assert_eq!(config.log_level, "info");
        assert!(load_tables(&dir.path().join("tables.yml")).unwrap().is_empty());
    }

    #[test]
    fn test_table_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.yml");
        let house = House::default();

        let mut settings = TableSettings {
            table_type: TableType::American,
            house_account: Some("house".to_string()),
            ..TableSettings::default()
        };
        settings.rules.set(GameRule::Surrender, true);
        settings.disabled_slots.insert(Slot::DoubleZero);

        let mut tables = TableStore::new();
        tables.insert("vip".to_string(), RawTableSettings::from(&settings));
        save_tables(&path, &tables).unwrap();

        let loaded = load_tables(&path).unwrap();
        assert_eq!(loaded, tables);
        assert_eq!(resolve_table("vip", &loaded["vip"], &house), settings);
    }

    #[test]
    fn test_lenient_table_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.yml");
        std::fs::write(
            &path,
            "main:\n  table_type: FRENCH\n  rules: [en_prison, surrender]\n  disabled_slots: [SLOT_99, SLOT_0]\n",
        )
        .unwrap();

        let loaded = load_tables(&path).unwrap();
        let settings = resolve_table("main", &loaded["main"], &House::default());
        assert_eq!(settings.table_type, TableType::European);
        assert!(settings.rules.en_prison);
        assert!(!settings.rules.surrender);
        assert_eq!(settings.disabled_slots.len(), 1);
        assert!(settings.disabled_slots.contains(&Slot::Zero));
    }
}
