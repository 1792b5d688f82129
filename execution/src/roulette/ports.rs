//! Narrow interfaces a table needs from its host.
//!
//! The table never touches host entities, accounts or storage directly. It calls these
//! ports from the single game thread and treats every failure as non-fatal.

use croupier_types::roulette::{Chip, PlayerId, SessionRecord, Slot};
use serde::Serialize;

use super::Message;

/// Handle of a spawned visual, owned by whoever spawned it.
pub type VisualId = u64;

/// Where on the physical table a visual sits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Anchor {
    /// A cell of the betting layout.
    Slot(Slot),
    /// A pocket of the wheel.
    Pocket(Slot),
    Seat(usize),
    Wheel,
    Croupier,
    Lobby,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Visual {
    Chip { player: PlayerId, chip: String },
    Hologram { lines: Vec<String> },
    Ball,
    Croupier { name: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    MainHand,
    OffHand,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Empty,
    Ball,
}

/// Rendering layer for chips, holograms, the croupier and the ball.
pub trait Visuals {
    fn spawn(&mut self, visual: Visual, at: Anchor) -> VisualId;
    fn teleport(&mut self, id: VisualId, at: Anchor);
    fn destroy(&mut self, id: VisualId);
    fn set_equipment(&mut self, id: VisualId, slot: EquipmentSlot, item: Item);
}

/// Economy provider. Amounts are whole currency units.
pub trait Economy {
    fn balance(&self, player: &str) -> u64;

    fn has(&self, player: &str, amount: u64) -> bool {
        self.balance(player) >= amount
    }

    /// Returns `false` when the provider rejected the transaction.
    fn deposit(&mut self, player: &str, amount: u64) -> bool;

    /// Returns `false` when the provider rejected the transaction.
    fn withdraw(&mut self, player: &str, amount: u64) -> bool;
}

/// Chat and menu delivery.
pub trait Messenger {
    fn send(&mut self, player: &str, message: Message);
    fn open_chip_menu(&mut self, player: &str, chips: &[Chip]);
    fn close_menu(&mut self, player: &str);
}

/// Session history store. Fire-and-forget.
pub trait SessionSink {
    fn save_session(&mut self, record: SessionRecord);
}

/// Last chance to replace the drawn pocket before it is locked in.
pub trait SpinListener {
    fn on_spin_end(&mut self, _table: &str, _drawn: Slot) -> Option<Slot> {
        None
    }
}

pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Everything a table calls out to.
pub trait Host: Economy + Visuals + Messenger + SessionSink + SpinListener + Clock {}

impl<T> Host for T where T: Economy + Visuals + Messenger + SessionSink + SpinListener + Clock {}
