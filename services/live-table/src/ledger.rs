use std::collections::BTreeMap;

use croupier_execution::roulette::Economy;
use croupier_types::roulette::PlayerId;
use tracing::debug;

/// In-memory player balances. Unknown players are opened with the starting balance.
#[derive(Clone, Debug)]
pub struct Ledger {
    balances: BTreeMap<PlayerId, u64>,
    starting_balance: u64,
}

impl Ledger {
    pub fn new(starting_balance: u64) -> Self {
        Self {
            balances: BTreeMap::new(),
            starting_balance,
        }
    }

    /// Open an account for `player` if there is none yet.
    pub fn ensure(&mut self, player: &str) -> u64 {
        if let Some(balance) = self.balances.get(player) {
            return *balance;
        }
        debug!(player, balance = self.starting_balance, "account opened");
        self.balances
            .insert(player.to_string(), self.starting_balance);
        self.starting_balance
    }

    pub fn accounts(&self) -> usize {
        self.balances.len()
    }
}

impl Economy for Ledger {
    fn balance(&self, player: &str) -> u64 {
        self.balances.get(player).copied().unwrap_or(0)
    }

    /// Unknown accounts are opened with the starting balance before the credit.
    fn deposit(&mut self, player: &str, amount: u64) -> bool {
        self.ensure(player);
        let Some(balance) = self.balances.get_mut(player) else {
            return false;
        };
        match balance.checked_add(amount) {
            Some(updated) => {
                *balance = updated;
                true
            }
            None => false,
        }
    }

    fn withdraw(&mut self, player: &str, amount: u64) -> bool {
        match self.balances.get_mut(player) {
            Some(balance) if *balance >= amount => {
                *balance -= amount;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accounts_open_once() {
        let mut ledger = Ledger::new(500);
        assert_eq!(ledger.balance("alice"), 0);
        assert_eq!(ledger.ensure("alice"), 500);
        assert!(ledger.withdraw("alice", 200));
        assert_eq!(ledger.ensure("alice"), 300);
        assert_eq!(ledger.accounts(), 1);
    }

    #[test]
    fn test_withdraw_never_overdraws() {
        let mut ledger = Ledger::new(100);
        ledger.ensure("alice");
        assert!(!ledger.withdraw("alice", 101));
        assert!(!ledger.withdraw("bob", 1));
        assert!(ledger.has("alice", 100));
        assert!(ledger.withdraw("alice", 100));
        assert_eq!(ledger.balance("alice"), 0);
    }

    #[test]
    fn test_first_deposit_opens_account() {
        let mut ledger = Ledger::new(500);
        assert!(ledger.deposit("house", 100));
        assert_eq!(ledger.balance("house"), 600);
        assert_eq!(ledger.ensure("house"), 600);
        assert_eq!(ledger.accounts(), 1);
    }

    #[test]
    fn test_deposit_rejects_overflow() {
        let mut ledger = Ledger::new(0);
        assert!(ledger.deposit("house", u64::MAX));
        assert!(!ledger.deposit("house", 1));
        assert_eq!(ledger.balance("house"), u64::MAX);
    }
}
