use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::Slot;

/// A purchasable stake denomination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chip {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    /// Price in whole currency units.
    pub price: u64,
}

impl Chip {
    pub fn new(name: impl Into<String>, price: u64) -> Self {
        let name = name.into();
        Self {
            display_name: format!("{name} chip"),
            name,
            price,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

/// Payout multipliers with optional per-slot overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Paytable {
    overrides: BTreeMap<Slot, u64>,
}

impl Paytable {
    pub fn new(overrides: BTreeMap<Slot, u64>) -> Self {
        Self { overrides }
    }

    /// Total return multiplier for a winning bet on `slot` (stake included).
    pub fn multiplier(&self, slot: Slot) -> u64 {
        self.overrides
            .get(&slot)
            .copied()
            .unwrap_or_else(|| slot.default_multiplier())
    }

    pub fn overrides(&self) -> &BTreeMap<Slot, u64> {
        &self.overrides
    }
}

/// Chip catalogue and paytable shared by every table of a host.
///
/// Built once at startup and handed to each table by reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct House {
    pub chips: Vec<Chip>,
    pub paytable: Paytable,
}

impl House {
    pub fn new(chips: Vec<Chip>, paytable: Paytable) -> Self {
        Self { chips, paytable }
    }

    pub fn chip(&self, name: &str) -> Option<&Chip> {
        self.chips.iter().find(|chip| chip.name == name)
    }

    /// Chips a table offers, in catalogue order.
    pub fn available_chips<'a>(
        &'a self,
        disabled: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = &'a Chip> + 'a {
        self.chips
            .iter()
            .filter(move |chip| !disabled.contains(&chip.name))
    }

    pub fn cheapest(&self, disabled: &BTreeSet<String>) -> Option<&Chip> {
        self.chips
            .iter()
            .filter(|chip| !disabled.contains(&chip.name))
            .min_by_key(|chip| chip.price)
    }
}

impl Default for House {
    fn default() -> Self {
        let chips = [10, 50, 100, 500, 1_000, 5_000]
            .into_iter()
            .map(|price| Chip::new(format!("chip_{price}"), price))
            .collect();
        Self::new(chips, Paytable::default())
    }
}
