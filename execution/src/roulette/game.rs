use std::collections::BTreeMap;
use std::sync::Arc;

use croupier_types::roulette::{
    Chip, GameRule, GameState, House, PlayerId, RuleError, SettingsError, Slot, SlotType,
    TableSettings,
};
use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

use super::conflict;
use super::layout::{self, Direction, TableSide};
use super::resolution::applies_for_prison;
use super::ports::{Anchor, Host, Visual, VisualId, Visuals};
use super::tasks::{PhaseConfig, PhaseTask, TaskKind};
use super::{Bet, Message};

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum JoinError {
    #[error("player already seated")]
    AlreadySeated,
    #[error("table is full (max={max})")]
    TableFull { max: usize },
    #[error("round already in progress")]
    RoundInProgress,
    #[error("cannot afford the cheapest chip (price={price})")]
    CannotAfford { price: u64 },
}

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum BetError {
    #[error("bets are not open")]
    NotSelecting,
    #[error("player is not seated")]
    NotSeated,
    #[error("chip already chosen for this bet")]
    ChipAlreadyChosen,
    #[error("unknown chip: {0}")]
    UnknownChip(String),
    #[error("chip disabled on this table: {0}")]
    ChipDisabled(String),
    #[error("insufficient funds (price={price})")]
    InsufficientFunds { price: u64 },
    #[error("no slot available")]
    NoSlotAvailable,
    #[error("current bet has no chip on the layout")]
    BetNotPlaced,
    #[error("bet limit reached (max={max})")]
    MaxBets { max: usize },
    #[error("bet is held in prison")]
    InPrison,
}

/// A seated player and their stakes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Seat {
    pub(super) index: usize,
    pub(super) bets: Vec<Bet>,
    pub(super) current: usize,
}

impl Seat {
    pub(super) fn new(index: usize) -> Self {
        Self {
            index,
            bets: vec![Bet::new()],
            current: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    /// Index of the bet the player is currently moving.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_bet(&self) -> Option<&Bet> {
        self.bets.get(self.current)
    }

    pub fn has_prison_bet(&self) -> bool {
        self.bets.iter().any(Bet::is_en_prison)
    }

    /// Never got a chip on the layout this round.
    pub fn is_sleeping(&self) -> bool {
        !self.bets.iter().any(Bet::is_placed)
    }
}

/// One roulette table: its players, their bets and the running phase task.
///
/// Every method runs on the table's game thread. Phase changes happen only inside
/// [`Game::tick`] (when a task elapses) or [`Game::restart`].
#[derive(Debug)]
pub struct Game {
    pub(super) name: String,
    pub(super) settings: TableSettings,
    pub(super) phases: PhaseConfig,
    pub(super) house: Arc<House>,
    pub(super) state: GameState,
    pub(super) players: BTreeMap<PlayerId, Seat>,
    pub(super) task: Option<PhaseTask>,
    pub(super) winner: Option<Slot>,
    pub(super) round: u64,
    pub(super) croupier: Option<VisualId>,
    pub(super) ball: Option<VisualId>,
    pub(super) join_hologram: Option<VisualId>,
    /// Stakes left behind by players who walked away from a locked round.
    pub(super) forfeited: Vec<(PlayerId, Bet)>,
}

impl Game {
    pub fn new(
        name: impl Into<String>,
        settings: TableSettings,
        phases: PhaseConfig,
        house: Arc<House>,
    ) -> Self {
        Self {
            name: name.into(),
            settings,
            phases,
            house,
            state: GameState::Idle,
            players: BTreeMap::new(),
            task: None,
            winner: None,
            round: 1,
            croupier: None,
            ball: None,
            join_hologram: None,
            forfeited: Vec::new(),
        }
    }

    /// Spawn the croupier and the join hologram.
    pub fn open<V: Visuals + ?Sized>(&mut self, visuals: &mut V) {
        if self.croupier.is_none() {
            self.croupier = Some(visuals.spawn(
                Visual::Croupier {
                    name: self.settings.croupier_name.clone(),
                },
                Anchor::Croupier,
            ));
        }
        self.refresh_join_hologram(visuals);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    pub fn phases(&self) -> &PhaseConfig {
        &self.phases
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn winner(&self) -> Option<Slot> {
        self.winner
    }

    pub fn players(&self) -> impl Iterator<Item = (&PlayerId, &Seat)> {
        self.players.iter()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn seat(&self, player: &str) -> Option<&Seat> {
        self.players.get(player)
    }

    pub fn is_seated(&self, player: &str) -> bool {
        self.players.contains_key(player)
    }

    pub fn bets(&self, player: &str) -> Option<&[Bet]> {
        self.players.get(player).map(|seat| seat.bets.as_slice())
    }

    /// The running task, if it is of `kind`.
    pub fn task(&self, kind: TaskKind) -> Option<&PhaseTask> {
        self.task.as_ref().filter(|task| task.kind() == kind)
    }

    pub fn active_task(&self) -> Option<&PhaseTask> {
        self.task.as_ref()
    }

    /// Legal betting slots of this table.
    pub fn slots(&self) -> Vec<Slot> {
        Slot::values(self.settings.table_type, &self.settings.disabled_slots)
    }

    pub fn chips(&self) -> Vec<Chip> {
        self.house
            .available_chips(&self.settings.disabled_chips)
            .cloned()
            .collect()
    }

    /// Replace the current winner. Only pockets of this wheel are accepted.
    pub fn set_winner(&mut self, slot: Slot) -> bool {
        if !slot.is_single() || !self.settings.table_type.allows(slot) {
            return false;
        }
        self.winner = Some(slot);
        true
    }

    /// Drop the running task if it is of `kind`. Safe to call repeatedly.
    pub fn cancel(&mut self, kind: TaskKind) -> bool {
        if self.task.as_ref().map(PhaseTask::kind) == Some(kind) {
            self.task = None;
            debug!(table = %self.name, ?kind, "task cancelled");
            return true;
        }
        false
    }

    pub fn cancel_all(&mut self) {
        self.task = None;
    }

    /// Group the player already holds an active bet in that clashes with `slot`.
    pub fn has_conflict(&self, player: &str, slot: Slot, ignore_current: bool) -> Option<SlotType> {
        let seat = self.players.get(player)?;
        conflict::has_conflict(&seat.bets, slot, ignore_current.then_some(seat.current))
    }

    pub fn join<H: Host>(&mut self, host: &mut H, player: &str) -> Result<usize, JoinError> {
        if self.players.contains_key(player) {
            return Err(JoinError::AlreadySeated);
        }
        if !self.state.accepts_players() {
            return Err(JoinError::RoundInProgress);
        }
        let max = self.settings.max_players;
        if self.players.len() >= max {
            return Err(JoinError::TableFull { max });
        }
        if let Some(chip) = self.house.cheapest(&self.settings.disabled_chips) {
            if !host.has(player, chip.price) {
                host.send(player, Message::CannotAfford { price: chip.price });
                return Err(JoinError::CannotAfford { price: chip.price });
            }
        }

        let index = (0..max)
            .find(|index| !self.players.values().any(|seat| seat.index == *index))
            .unwrap_or(self.players.len());
        self.players.insert(player.to_string(), Seat::new(index));
        let players = self.players.len();
        info!(table = %self.name, player, seat = index, players, "player joined");

        host.send(
            player,
            Message::Joined {
                table: self.name.clone(),
                players,
                max_players: max,
            },
        );
        for other in self.players.keys().filter(|other| other.as_str() != player) {
            host.send(
                other,
                Message::PlayerJoined {
                    player: player.to_string(),
                    players,
                    max_players: max,
                },
            );
        }
        self.refresh_join_hologram(host);

        if players >= self.settings.min_players && self.task.is_none() {
            self.start_starting(host);
        }
        Ok(index)
    }

    /// Remove a player. Stakes bought this round are refunded until the wheel spins and
    /// forfeited to the house after that.
    pub fn leave<H: Host>(&mut self, host: &mut H, player: &str) -> bool {
        let Some(mut seat) = self.players.remove(player) else {
            return false;
        };
        let refundable = matches!(self.state, GameState::Starting | GameState::Selecting);
        let spinning = self.state == GameState::Spinning;
        let held_winner = self.winner.filter(|_| self.state == GameState::Ending);
        let rules = self.settings.rules;
        let mut refund = 0u64;
        for mut bet in seat.bets.drain(..) {
            if refundable && bet.has_chip() && !bet.is_en_prison() {
                refund = refund.saturating_add(bet.stake());
            }
            bet.clear_visuals(host);
            let held = bet.is_placed()
                && held_winner.is_some_and(|winner| applies_for_prison(&rules, winner, &bet, false));
            if (spinning && bet.is_placed()) || held {
                self.forfeited.push((player.to_string(), bet));
            }
        }
        if refund > 0 {
            if host.deposit(player, refund) {
                host.send(player, Message::Refunded { amount: refund });
            } else {
                warn!(table = %self.name, player, amount = refund, "refund deposit failed");
            }
        }
        host.close_menu(player);
        host.send(
            player,
            Message::Left {
                table: self.name.clone(),
            },
        );
        for other in self.players.keys() {
            host.send(
                other,
                Message::PlayerLeft {
                    player: player.to_string(),
                },
            );
        }
        info!(table = %self.name, player, players = self.players.len(), "player left");

        // A spin with forfeited stakes still runs to settle them.
        let settling = spinning && !self.forfeited.is_empty();
        if self.players.is_empty() && self.state != GameState::Idle && !settling {
            self.restart(host);
            return true;
        }
        if self.state == GameState::Starting && self.players.len() < self.settings.min_players {
            self.cancel(TaskKind::Starting);
            self.state = GameState::Idle;
        }
        self.refresh_join_hologram(host);
        true
    }

    /// Buy `chip_name` for the current bet and put it on the first free slot.
    pub fn select_chip<H: Host>(
        &mut self,
        host: &mut H,
        player: &str,
        chip_name: &str,
    ) -> Result<Slot, BetError> {
        if !self.state.is_selecting() {
            return Err(BetError::NotSelecting);
        }
        let seat = self.players.get(player).ok_or(BetError::NotSeated)?;
        let bet = seat.current_bet().ok_or(BetError::NotSeated)?;
        if bet.is_en_prison() {
            return Err(BetError::InPrison);
        }
        if bet.has_chip() {
            return Err(BetError::ChipAlreadyChosen);
        }
        let chip = self
            .house
            .chip(chip_name)
            .cloned()
            .ok_or_else(|| BetError::UnknownChip(chip_name.to_string()))?;
        if self.settings.disabled_chips.contains(&chip.name) {
            return Err(BetError::ChipDisabled(chip.name));
        }
        let slot = self.first_chip_move(player).ok_or(BetError::NoSlotAvailable)?;

        if !host.has(player, chip.price) {
            host.send(player, Message::NotEnoughMoney { price: chip.price });
            return Err(BetError::InsufficientFunds { price: chip.price });
        }
        if !host.withdraw(player, chip.price) {
            warn!(table = %self.name, player, amount = chip.price, "chip withdraw rejected");
            host.send(player, Message::NotEnoughMoney { price: chip.price });
            return Err(BetError::InsufficientFunds { price: chip.price });
        }

        let seat = self.players.get_mut(player).ok_or(BetError::NotSeated)?;
        let current = seat.current;
        let bet = seat.bets.get_mut(current).ok_or(BetError::NotSeated)?;
        let chip_label = chip.display_name().to_string();
        bet.place(host, player, chip, slot);
        host.close_menu(player);
        host.send(player, Message::ChipPlaced { chip: chip_label, slot });
        debug!(table = %self.name, player, %slot, "chip placed");
        Ok(slot)
    }

    /// Move the current chip one legal step as the player sees the table.
    pub fn move_chip<H: Host>(
        &mut self,
        host: &mut H,
        player: &str,
        direction: Direction,
    ) -> Option<Slot> {
        if !self.state.is_selecting() {
            return None;
        }
        let seat = self.players.get(player)?;
        let current = seat.current;
        let bet = seat.bets.get(current)?;
        if bet.is_en_prison() || !bet.has_chip() {
            return None;
        }
        let from = bet.slot()?;
        let side = TableSide::for_seat(seat.index, self.settings.max_players);
        let next = layout::move_from_slot(
            self.settings.table_type,
            from,
            direction.relative_to(side),
            |slot| self.is_legal_for(player, slot, Some(current)),
        )?;

        let bet = self.players.get_mut(player)?.bets.get_mut(current)?;
        bet.move_to(host, next);
        debug!(table = %self.name, player, from = %from, to = %next, "chip moved");
        Some(next)
    }

    /// Put the current chip directly on `slot`. Illegal choices are ignored.
    pub fn select_slot<H: Host>(&mut self, host: &mut H, player: &str, slot: Slot) -> bool {
        if !self.state.is_selecting() {
            return false;
        }
        let Some(seat) = self.players.get(player) else {
            return false;
        };
        let current = seat.current;
        let movable = seat
            .bets
            .get(current)
            .is_some_and(|bet| bet.has_chip() && !bet.is_en_prison());
        if !movable || !self.is_legal_for(player, slot, Some(current)) {
            return false;
        }
        if let Some(bet) = self
            .players
            .get_mut(player)
            .and_then(|seat| seat.bets.get_mut(current))
        {
            bet.move_to(host, slot);
            return true;
        }
        false
    }

    /// Start another wager once the current one is on the layout.
    pub fn new_bet<H: Host>(&mut self, host: &mut H, player: &str) -> Result<usize, BetError> {
        if !self.state.is_selecting() {
            return Err(BetError::NotSelecting);
        }
        let max = self.settings.max_bets;
        let chips = self.chips();
        let seat = self.players.get_mut(player).ok_or(BetError::NotSeated)?;
        if seat.has_prison_bet() {
            return Err(BetError::InPrison);
        }
        if !seat.current_bet().is_some_and(Bet::is_placed) {
            return Err(BetError::BetNotPlaced);
        }
        if seat.bets.len() >= max {
            return Err(BetError::MaxBets { max });
        }
        seat.bets.push(Bet::new());
        seat.current = seat.bets.len() - 1;
        let index = seat.current;
        host.open_chip_menu(player, &chips);
        Ok(index)
    }

    pub fn set_rule(&mut self, rule: GameRule, enabled: bool) -> Result<(), RuleError> {
        if enabled {
            rule.validate(self.settings.table_type, self.settings.min_players)?;
        }
        self.settings.rules.set(rule, enabled);
        info!(table = %self.name, %rule, enabled, "rule toggled");
        Ok(())
    }

    pub fn set_slot_enabled(&mut self, slot: Slot, enabled: bool) {
        if enabled {
            self.settings.disabled_slots.remove(&slot);
        } else {
            self.settings.disabled_slots.insert(slot);
        }
    }

    pub fn set_chip_enabled(&mut self, chip: &str, enabled: bool) -> Result<(), BetError> {
        if self.house.chip(chip).is_none() {
            return Err(BetError::UnknownChip(chip.to_string()));
        }
        if enabled {
            self.settings.disabled_chips.remove(chip);
        } else {
            self.settings.disabled_chips.insert(chip.to_string());
        }
        Ok(())
    }

    pub fn set_house_account(&mut self, account: Option<PlayerId>) {
        self.settings.house_account = account;
    }

    pub fn set_start_time(&mut self, seconds: u32) -> Result<(), SettingsError> {
        if seconds == 0 {
            return Err(SettingsError::NoStartTime);
        }
        self.settings.start_time = seconds;
        Ok(())
    }

    /// Change seat limits. En Prison is switched off if the table stops being single-player.
    pub fn set_player_limits(&mut self, min: usize, max: usize) -> Result<(), SettingsError> {
        let mut settings = self.settings.clone();
        settings.min_players = min;
        settings.max_players = max;
        settings.validate()?;
        if settings.rules.en_prison
            && GameRule::EnPrison
                .validate(settings.table_type, settings.min_players)
                .is_err()
        {
            warn!(table = %self.name, min, "en prison disabled by new player limits");
            settings.rules.set(GameRule::EnPrison, false);
        }
        self.settings = settings;
        Ok(())
    }

    pub(super) fn is_available(&self, slot: Slot) -> bool {
        self.settings.table_type.allows(slot) && !self.settings.disabled_slots.contains(&slot)
    }

    /// Slot is open, free of the player's other chips and of group conflicts.
    pub(super) fn is_legal_for(&self, player: &str, slot: Slot, ignore: Option<usize>) -> bool {
        let Some(seat) = self.players.get(player) else {
            return false;
        };
        self.is_available(slot)
            && !conflict::is_taken(&seat.bets, slot, ignore)
            && conflict::has_conflict(&seat.bets, slot, ignore).is_none()
    }

    /// Initial position for a freshly bought chip.
    pub(super) fn first_chip_move(&self, player: &str) -> Option<Slot> {
        let current = self.players.get(player)?.current;
        self.slots()
            .into_iter()
            .find(|slot| self.is_legal_for(player, *slot, Some(current)))
    }

    pub(super) fn refresh_join_hologram<V: Visuals + ?Sized>(&mut self, visuals: &mut V) {
        if let Some(id) = self.join_hologram.take() {
            visuals.destroy(id);
        }
        if !self.state.accepts_players() {
            return;
        }
        let lines = vec![
            self.name.clone(),
            "Click to join".to_string(),
            format!("{}/{}", self.players.len(), self.settings.max_players),
        ];
        self.join_hologram = Some(visuals.spawn(Visual::Hologram { lines }, Anchor::Lobby));
    }
}
