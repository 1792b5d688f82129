//! In-memory host for exercising tables in tests.

use std::collections::{BTreeMap, BTreeSet};

use croupier_types::roulette::{Chip, PlayerId, SessionRecord, Slot};

use crate::roulette::{
    Anchor, Clock, Economy, EquipmentSlot, Item, Message, Messenger, SessionSink, SpinListener,
    Visual, VisualId, Visuals,
};

/// Records every call a table makes so tests can assert on it.
#[derive(Debug, Default)]
pub struct MockHost {
    pub balances: BTreeMap<PlayerId, u64>,
    /// Accounts whose deposits are rejected.
    pub failing_deposits: BTreeSet<PlayerId>,
    pub deposits: Vec<(PlayerId, u64)>,
    pub withdrawals: Vec<(PlayerId, u64)>,
    pub messages: Vec<(PlayerId, Message)>,
    pub open_menus: BTreeMap<PlayerId, Vec<Chip>>,
    pub sessions: Vec<SessionRecord>,
    pub visuals: BTreeMap<VisualId, (Visual, Anchor)>,
    pub equipment: BTreeMap<(VisualId, EquipmentSlot), Item>,
    pub next_visual: VisualId,
    /// Winner forced at the end of every spin.
    pub override_winner: Option<Slot>,
    pub now_ms: u64,
}

impl MockHost {
    pub fn with_balance(mut self, player: &str, amount: u64) -> Self {
        self.balances.insert(player.to_string(), amount);
        self
    }

    pub fn messages_for(&self, player: &str) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|(to, _)| to == player)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn count_key(&self, player: &str, key: &str) -> usize {
        self.messages_for(player)
            .into_iter()
            .filter(|message| message.key() == key)
            .count()
    }

    pub fn has_menu(&self, player: &str) -> bool {
        self.open_menus.contains_key(player)
    }

    pub fn main_hand(&self, id: VisualId) -> Option<&Item> {
        self.equipment.get(&(id, EquipmentSlot::MainHand))
    }

    pub fn count_visuals(&self, predicate: impl Fn(&Visual) -> bool) -> usize {
        self.visuals
            .values()
            .filter(|(visual, _)| predicate(visual))
            .count()
    }
}

impl Economy for MockHost {
    fn balance(&self, player: &str) -> u64 {
        self.balances.get(player).copied().unwrap_or(0)
    }

    fn deposit(&mut self, player: &str, amount: u64) -> bool {
        if self.failing_deposits.contains(player) {
            return false;
        }
        let balance = self.balances.entry(player.to_string()).or_default();
        *balance += amount;
        self.deposits.push((player.to_string(), amount));
        true
    }

    fn withdraw(&mut self, player: &str, amount: u64) -> bool {
        let Some(balance) = self.balances.get_mut(player) else {
            return false;
        };
        if *balance < amount {
            return false;
        }
        *balance -= amount;
        self.withdrawals.push((player.to_string(), amount));
        true
    }
}

impl Visuals for MockHost {
    fn spawn(&mut self, visual: Visual, at: Anchor) -> VisualId {
        self.next_visual += 1;
        self.visuals.insert(self.next_visual, (visual, at));
        self.next_visual
    }

    fn teleport(&mut self, id: VisualId, at: Anchor) {
        if let Some((_, anchor)) = self.visuals.get_mut(&id) {
            *anchor = at;
        }
    }

    fn destroy(&mut self, id: VisualId) {
        self.visuals.remove(&id);
        self.equipment.retain(|(owner, _), _| *owner != id);
    }

    fn set_equipment(&mut self, id: VisualId, slot: EquipmentSlot, item: Item) {
        self.equipment.insert((id, slot), item);
    }
}

impl Messenger for MockHost {
    fn send(&mut self, player: &str, message: Message) {
        self.messages.push((player.to_string(), message));
    }

    fn open_chip_menu(&mut self, player: &str, chips: &[Chip]) {
        self.open_menus.insert(player.to_string(), chips.to_vec());
    }

    fn close_menu(&mut self, player: &str) {
        self.open_menus.remove(player);
    }
}

impl SessionSink for MockHost {
    fn save_session(&mut self, record: SessionRecord) {
        self.sessions.push(record);
    }
}

impl SpinListener for MockHost {
    fn on_spin_end(&mut self, _table: &str, _drawn: Slot) -> Option<Slot> {
        self.override_winner
    }
}

impl Clock for MockHost {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}
