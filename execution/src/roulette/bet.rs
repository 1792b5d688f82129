use croupier_types::roulette::{Chip, Slot, WinType};

use super::ports::{Anchor, Visual, VisualId, Visuals};

/// One stake of one player.
///
/// Starts empty, gets a chip and a slot while bets are open and an outcome during
/// resolution. The chip stand and hologram belong to the bet and are destroyed with it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bet {
    chip: Option<Chip>,
    slot: Option<Slot>,
    en_prison: bool,
    win: Option<WinType>,
    stand: Option<VisualId>,
    hologram: Option<VisualId>,
}

impl Bet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chip(&self) -> Option<&Chip> {
        self.chip.as_ref()
    }

    pub fn slot(&self) -> Option<Slot> {
        self.slot
    }

    pub fn has_chip(&self) -> bool {
        self.chip.is_some()
    }

    pub fn has_slot(&self) -> bool {
        self.slot.is_some()
    }

    /// Chip bought and slot chosen.
    pub fn is_placed(&self) -> bool {
        self.chip.is_some() && self.slot.is_some()
    }

    pub fn stake(&self) -> u64 {
        self.chip.as_ref().map(|chip| chip.price).unwrap_or(0)
    }

    pub fn is_en_prison(&self) -> bool {
        self.en_prison
    }

    pub fn set_en_prison(&mut self, en_prison: bool) {
        self.en_prison = en_prison;
    }

    pub fn win(&self) -> Option<WinType> {
        self.win
    }

    pub fn has_won(&self) -> bool {
        self.win.is_some()
    }

    /// Assign an outcome. Returns `false` if the bet was already settled this pass.
    pub fn set_win(&mut self, win_type: WinType) -> bool {
        if self.win.is_some() {
            return false;
        }
        self.win = Some(win_type);
        true
    }

    pub fn reset_win(&mut self) {
        self.win = None;
    }

    pub fn has_visuals(&self) -> bool {
        self.stand.is_some() || self.hologram.is_some()
    }

    /// Put `chip` on `slot` and show it on the table.
    pub fn place<V: Visuals + ?Sized>(&mut self, visuals: &mut V, player: &str, chip: Chip, slot: Slot) {
        self.clear_visuals(visuals);
        self.stand = Some(visuals.spawn(
            Visual::Chip {
                player: player.to_string(),
                chip: chip.name.clone(),
            },
            Anchor::Slot(slot),
        ));
        self.hologram = Some(visuals.spawn(
            Visual::Hologram {
                lines: vec![player.to_string(), chip.display_name().to_string()],
            },
            Anchor::Slot(slot),
        ));
        self.chip = Some(chip);
        self.slot = Some(slot);
    }

    pub fn move_to<V: Visuals + ?Sized>(&mut self, visuals: &mut V, slot: Slot) {
        self.slot = Some(slot);
        for id in [self.stand, self.hologram].into_iter().flatten() {
            visuals.teleport(id, Anchor::Slot(slot));
        }
    }

    pub fn clear_visuals<V: Visuals + ?Sized>(&mut self, visuals: &mut V) {
        for id in [self.stand.take(), self.hologram.take()].into_iter().flatten() {
            visuals.destroy(id);
        }
    }
}
