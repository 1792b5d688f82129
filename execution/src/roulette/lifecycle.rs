//! Phase transitions of a table.
//!
//! `IDLE -> STARTING -> SELECTING -> SPINNING -> ENDING -> IDLE`. Each phase past idle is
//! owned by a [`PhaseTask`]; [`Game::tick`] steps it and performs the transition once it
//! elapses. [`Game::restart`] is the only way back to idle.

use croupier_types::roulette::{GameState, PlayerId, Slot};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use super::ports::{Anchor, EquipmentSlot, Host, Item, Messenger, Visual};
use super::resolution::applies_for_prison;
use super::tasks::{PhaseTask, Step, TaskKind};
use super::{Bet, Game, Message};

impl Game {
    /// Advance the running task by one tick.
    pub fn tick<H: Host, R: Rng + ?Sized>(&mut self, host: &mut H, rng: &mut R) {
        let Some(task) = self.task.as_mut() else {
            return;
        };
        let kind = task.kind();
        let step = task.step();
        if step == Step::Elapsed {
            self.task = None;
        }

        match (kind, step) {
            (TaskKind::Starting, Step::Running { remaining }) => {
                self.broadcast(host, Message::Countdown { seconds: remaining });
            }
            (TaskKind::Starting, Step::Elapsed) => self.start_selecting(host),
            (TaskKind::Selecting, Step::Running { remaining }) => {
                self.broadcast(host, Message::SelectingEnds { seconds: remaining });
            }
            (TaskKind::Selecting, Step::Elapsed) => self.start_spinning(host),
            (TaskKind::Spinning, Step::Running { .. }) => {
                if let Some(drawn) = self.draw(rng) {
                    self.show_pocket(host, drawn);
                }
            }
            (TaskKind::Spinning, Step::Elapsed) => match self.draw(rng) {
                Some(drawn) => self.finish_spin(host, drawn),
                None => self.restart(host),
            },
            (TaskKind::Ending, Step::Running { .. }) => {}
            (TaskKind::Ending, Step::Elapsed) => self.restart(host),
        }
    }

    /// Reset the table for the next round.
    ///
    /// Bets eligible for En Prison stay on the layout flagged as imprisoned. Everything
    /// else is cleared. Players without a carried bet keep their seat only if the table
    /// keeps seats and they can still afford the cheapest chip.
    pub fn restart<H: Host>(&mut self, host: &mut H) {
        self.cancel_all();
        self.credit_forfeits(host);
        if let Some(ball) = self.ball.take() {
            host.destroy(ball);
        }
        if let Some(croupier) = self.croupier {
            host.set_equipment(croupier, EquipmentSlot::MainHand, Item::Empty);
        }

        let winner = self.winner.take();
        let rules = self.settings.rules;
        let keep_seats = self.settings.keep_seats;
        let cheapest = self
            .house
            .cheapest(&self.settings.disabled_chips)
            .map(|chip| chip.price);

        let mut leaving: Vec<PlayerId> = Vec::new();
        for (player, seat) in self.players.iter_mut() {
            let mut carried = Vec::new();
            for mut bet in seat.bets.drain(..) {
                let carry = winner.is_some_and(|winner| applies_for_prison(&rules, winner, &bet, false));
                match (carry, bet.slot()) {
                    (true, Some(slot)) => {
                        bet.set_en_prison(true);
                        bet.reset_win();
                        host.send(player, Message::PrisonCarried { slot });
                        carried.push(bet);
                    }
                    _ => bet.clear_visuals(host),
                }
            }

            if carried.is_empty() {
                let affordable = cheapest.map_or(true, |price| host.has(player, price));
                if keep_seats && affordable {
                    carried.push(Bet::new());
                } else {
                    if let Some(price) = cheapest.filter(|_| !affordable) {
                        host.send(player, Message::CannotAfford { price });
                    }
                    leaving.push(player.clone());
                }
            }
            seat.bets = carried;
            seat.current = 0;
        }

        for player in leaving {
            self.players.remove(&player);
            host.close_menu(&player);
            host.send(
                &player,
                Message::Left {
                    table: self.name.clone(),
                },
            );
            debug!(table = %self.name, player = %player, "player unseated on restart");
        }

        self.state = GameState::Idle;
        self.round += 1;
        self.refresh_join_hologram(host);
        info!(
            table = %self.name,
            round = self.round,
            players = self.players.len(),
            "table restarted"
        );

        if !self.players.is_empty() && self.players.len() >= self.settings.min_players {
            self.start_starting(host);
        }
    }

    /// Close the table: refund stakes that were never settled and tear down every visual.
    pub fn shutdown<H: Host>(&mut self, host: &mut H) {
        self.cancel_all();
        let settled = self.state == GameState::Ending;
        let winner = self.winner.take();
        let rules = self.settings.rules;

        for (player, mut seat) in std::mem::take(&mut self.players) {
            let mut refund = 0u64;
            for bet in seat.bets.iter_mut() {
                let held = winner.is_some_and(|winner| applies_for_prison(&rules, winner, bet, false));
                if bet.has_chip() && (!settled || held) {
                    refund = refund.saturating_add(bet.stake());
                }
                bet.clear_visuals(host);
            }
            if refund > 0 {
                if host.deposit(&player, refund) {
                    host.send(&player, Message::Refunded { amount: refund });
                } else {
                    warn!(table = %self.name, player = %player, amount = refund, "shutdown refund failed");
                }
            }
            host.close_menu(&player);
            host.send(
                &player,
                Message::Left {
                    table: self.name.clone(),
                },
            );
        }

        self.credit_forfeits(host);
        for id in [self.ball.take(), self.croupier.take(), self.join_hologram.take()]
            .into_iter()
            .flatten()
        {
            host.destroy(id);
        }
        self.state = GameState::Idle;
        info!(table = %self.name, "table shut down");
    }

    pub(super) fn start_starting<H: Host>(&mut self, host: &mut H) {
        let seconds = self.settings.start_time;
        self.state = GameState::Starting;
        self.task = Some(PhaseTask::new(TaskKind::Starting, seconds));
        self.broadcast(host, Message::Countdown { seconds });
        info!(table = %self.name, seconds, "countdown started");
    }

    fn start_selecting<H: Host>(&mut self, host: &mut H) {
        let seconds = self.phases.selecting_ticks;
        self.state = GameState::Selecting;
        self.task = Some(PhaseTask::new(TaskKind::Selecting, seconds));
        if let Some(id) = self.join_hologram.take() {
            host.destroy(id);
        }

        let chips = self.chips();
        for (player, seat) in &self.players {
            if seat.has_prison_bet() {
                continue;
            }
            host.open_chip_menu(player, &chips);
            host.send(player, Message::BetsOpen { seconds });
        }
        info!(table = %self.name, round = self.round, players = self.players.len(), "bets open");
    }

    fn start_spinning<H: Host>(&mut self, host: &mut H) {
        self.state = GameState::Spinning;
        for player in self.players.keys() {
            host.close_menu(player);
        }

        let sleeping: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|(_, seat)| seat.is_sleeping())
            .map(|(player, _)| player.clone())
            .collect();
        for player in sleeping {
            if let Some(mut seat) = self.players.remove(&player) {
                for bet in seat.bets.iter_mut() {
                    bet.clear_visuals(host);
                }
            }
            debug!(table = %self.name, player = %player, "sleeping player removed");
        }

        for seat in self.players.values_mut() {
            for bet in seat.bets.iter_mut().filter(|bet| !bet.is_placed()) {
                bet.clear_visuals(host);
            }
            seat.bets.retain(Bet::is_placed);
            seat.current = seat.bets.len().saturating_sub(1);
        }

        if self.players.is_empty() {
            debug!(table = %self.name, "no bets placed");
            self.restart(host);
            return;
        }

        if let Some(croupier) = self.croupier {
            host.set_equipment(croupier, EquipmentSlot::MainHand, Item::Ball);
        }
        if self.ball.is_none() {
            self.ball = Some(host.spawn(Visual::Ball, Anchor::Wheel));
        }
        self.task = Some(PhaseTask::new(TaskKind::Spinning, self.phases.spin_ticks));
        self.broadcast(host, Message::Spinning);
        info!(table = %self.name, round = self.round, players = self.players.len(), "wheel spinning");
    }

    /// Lock the winner, resolve, and either wait out the ending phase or restart.
    fn finish_spin<H: Host>(&mut self, host: &mut H, drawn: Slot) {
        let mut winner = drawn;
        if let Some(chosen) = host.on_spin_end(&self.name, drawn) {
            if chosen.is_single() && self.settings.table_type.allows(chosen) {
                winner = chosen;
            } else {
                warn!(table = %self.name, slot = %chosen, "ignoring illegal winner override");
            }
        }
        self.show_pocket(host, winner);
        self.check_winner(host);

        self.state = GameState::Ending;
        if self.phases.ending_ticks > 0 {
            self.task = Some(PhaseTask::new(TaskKind::Ending, self.phases.ending_ticks));
        } else {
            self.restart(host);
        }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Slot> {
        Slot::pockets(self.settings.table_type).choose(rng).copied()
    }

    fn show_pocket<H: Host>(&mut self, host: &mut H, pocket: Slot) {
        self.winner = Some(pocket);
        if let Some(ball) = self.ball {
            host.teleport(ball, Anchor::Pocket(pocket));
        }
    }

    pub(super) fn broadcast<M: Messenger + ?Sized>(&self, messenger: &mut M, message: Message) {
        for player in self.players.keys() {
            messenger.send(player, message.clone());
        }
    }
}
