//! Bet settlement.
//!
//! Classification runs over every placed bet in this order:
//!
//! 1. **Normal** - the bet's slot is or contains the winning pocket. A bet held in prison
//!    that wins is settled as **En Prison** and only gets its stake back.
//! 2. **La Partage** - zero came out, the bet is even-money, not imprisoned and the rule
//!    is on. Half the stake is returned.
//! 3. **Surrender** - as La Partage, on an american wheel with the Surrender rule on.
//!
//! Anything else loses, except even-money bets that En Prison holds for another spin.

use std::collections::BTreeMap;

use croupier_types::roulette::{
    PlayerId, RuleSet, SessionBet, SessionRecord, Slot, TableType, WinData, WinType,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::ports::Host;
use super::{Bet, Game, Message};

/// Whether a losing bet is held in prison for the next spin.
///
/// `recheck` also accepts bets that are already imprisoned.
pub fn applies_for_prison(rules: &RuleSet, winner: Slot, bet: &Bet, recheck: bool) -> bool {
    rules.en_prison
        && winner.is_zero()
        && !bet.has_won()
        && (recheck || !bet.is_en_prison())
        && bet.slot().is_some_and(|slot| slot.is_even_money())
}

/// Outcome of a single placed bet against `winner`.
pub fn classify(
    rules: &RuleSet,
    table_type: TableType,
    slot: Slot,
    en_prison: bool,
    winner: Slot,
) -> Option<WinType> {
    if slot.contains(winner) {
        return Some(if en_prison {
            WinType::EnPrison
        } else {
            WinType::Normal
        });
    }
    if !winner.is_zero() || !slot.is_even_money() || en_prison {
        return None;
    }
    if rules.la_partage {
        Some(WinType::LaPartage)
    } else if rules.surrender && table_type == TableType::American {
        Some(WinType::Surrender)
    } else {
        None
    }
}

impl Game {
    /// Assign an outcome to every placed bet. Outcomes of a previous pass are cleared
    /// first, so calling this twice yields the same result.
    pub fn resolve(&mut self) -> Vec<WinData> {
        let Some(winner) = self.winner else {
            return Vec::new();
        };
        let rules = self.settings.rules;
        let table_type = self.settings.table_type;

        let mut wins = Vec::new();
        for (player, seat) in self.players.iter_mut() {
            for (bet_index, bet) in seat.bets.iter_mut().enumerate() {
                bet.reset_win();
                let Some(slot) = bet.slot().filter(|_| bet.has_chip()) else {
                    continue;
                };
                let Some(win_type) = classify(&rules, table_type, slot, bet.is_en_prison(), winner)
                else {
                    continue;
                };
                if bet.set_win(win_type) {
                    wins.push(WinData {
                        player: player.clone(),
                        bet_index,
                        win_type,
                    });
                }
            }
        }
        wins
    }

    /// Resolve the round against the current winner, pay out, move losing stakes to the
    /// house account and record the session.
    pub fn check_winner<H: Host>(&mut self, host: &mut H) -> Vec<WinData> {
        let Some(winner) = self.winner else {
            warn!(table = %self.name, "no winner to check");
            return Vec::new();
        };
        let wins = self.resolve();
        self.broadcast(
            host,
            Message::Winner {
                slot: winner,
                color: winner.color(),
            },
        );

        let rules = self.settings.rules;
        let house_account = self.settings.house_account.clone();
        let mut payouts: BTreeMap<PlayerId, u64> = BTreeMap::new();
        let mut house_take = 0u64;
        let mut bets = Vec::new();

        for (player, seat) in &self.players {
            for bet in &seat.bets {
                let (Some(slot), Some(chip)) = (bet.slot(), bet.chip()) else {
                    continue;
                };
                let payout = match bet.win() {
                    Some(win_type) => {
                        let amount = win_type.payout(chip.price, self.house.paytable.multiplier(slot));
                        let total = payouts.entry(player.clone()).or_default();
                        *total = total.saturating_add(amount);
                        host.send(
                            player,
                            Message::Won {
                                slot,
                                amount,
                                win_type,
                            },
                        );
                        amount
                    }
                    None => {
                        if !applies_for_prison(&rules, winner, bet, false) {
                            host.send(player, Message::Lost { slot });
                            if house_account.as_ref() != Some(player) {
                                house_take = house_take.saturating_add(chip.price);
                            }
                        }
                        0
                    }
                };
                bets.push(SessionBet {
                    player: player.clone(),
                    slot,
                    stake: chip.price,
                    payout,
                    win: bet.win(),
                    en_prison: bet.is_en_prison(),
                });
            }
        }

        for (player, bet) in std::mem::take(&mut self.forfeited) {
            let (Some(slot), Some(chip)) = (bet.slot(), bet.chip()) else {
                continue;
            };
            if house_account.as_ref() != Some(&player) {
                house_take = house_take.saturating_add(chip.price);
            }
            bets.push(SessionBet {
                player,
                slot,
                stake: chip.price,
                payout: 0,
                win: None,
                en_prison: bet.is_en_prison(),
            });
        }

        for (player, amount) in &payouts {
            if *amount > 0 && !host.deposit(player, *amount) {
                warn!(table = %self.name, player = %player, amount, "payout deposit failed");
            }
        }
        if let Some(account) = house_account.filter(|_| house_take > 0) {
            if !host.deposit(&account, house_take) {
                warn!(table = %self.name, account = %account, amount = house_take, "house deposit failed");
            }
        }

        let record = SessionRecord {
            id: Uuid::new_v4(),
            table: self.name.clone(),
            winner,
            timestamp_ms: host.now_ms(),
            bets,
        };
        info!(
            table = %self.name,
            round = self.round,
            winner = %winner,
            winning_bets = wins.len(),
            paid = record.total_paid(),
            house_take,
            "round resolved"
        );
        host.save_session(record);
        wins
    }
}

impl Game {
    /// Credit stakes forfeited outside a resolution to the house account.
    pub(super) fn credit_forfeits<H: Host>(&mut self, host: &mut H) {
        if self.forfeited.is_empty() {
            return;
        }
        let house_account = self.settings.house_account.clone();
        let take = self
            .forfeited
            .drain(..)
            .filter(|(player, _)| house_account.as_ref() != Some(player))
            .fold(0u64, |take, (_, bet)| take.saturating_add(bet.stake()));
        if let Some(account) = house_account.filter(|_| take > 0) {
            if !host.deposit(&account, take) {
                warn!(table = %self.name, account = %account, amount = take, "forfeit deposit failed");
            }
        }
    }
}
