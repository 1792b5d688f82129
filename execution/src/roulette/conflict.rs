use croupier_types::roulette::{Slot, SlotType};

use super::Bet;

/// Group the player already holds an active bet in, if betting on `slot` would clash.
///
/// Bets held in prison do not count. `ignore` exempts the bet being moved.
pub fn has_conflict(bets: &[Bet], slot: Slot, ignore: Option<usize>) -> Option<SlotType> {
    let slot_type = slot.slot_type()?;
    bets.iter()
        .enumerate()
        .filter(|(index, bet)| Some(*index) != ignore && !bet.is_en_prison())
        .filter_map(|(_, bet)| bet.slot())
        .any(|other| other.slot_type() == Some(slot_type))
        .then_some(slot_type)
}

/// Whether another of the player's bets already sits on `slot`.
pub fn is_taken(bets: &[Bet], slot: Slot, ignore: Option<usize>) -> bool {
    bets.iter()
        .enumerate()
        .any(|(index, bet)| Some(index) != ignore && bet.slot() == Some(slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockHost;
    use croupier_types::roulette::Chip;

    fn placed(host: &mut MockHost, slot: Slot) -> Bet {
        let mut bet = Bet::new();
        bet.place(host, "alice", Chip::new("chip_100", 100), slot);
        bet
    }

    #[test]
    fn test_red_conflicts_with_black() {
        let mut host = MockHost::default();
        let bets = vec![placed(&mut host, Slot::Red)];
        assert_eq!(has_conflict(&bets, Slot::Black, None), Some(SlotType::Color));
        assert_eq!(has_conflict(&bets, Slot::Even, None), None);
        assert_eq!(has_conflict(&bets, Slot::Number(7), None), None);
    }

    #[test]
    fn test_current_bet_is_exempt() {
        let mut host = MockHost::default();
        let bets = vec![placed(&mut host, Slot::Dozen(1))];
        assert_eq!(has_conflict(&bets, Slot::Dozen(2), Some(0)), None);
        assert_eq!(has_conflict(&bets, Slot::Dozen(2), None), Some(SlotType::Dozen));
    }

    #[test]
    fn test_prison_bets_do_not_conflict() {
        let mut host = MockHost::default();
        let mut bet = placed(&mut host, Slot::Low);
        bet.set_en_prison(true);
        let bets = vec![bet];
        assert_eq!(has_conflict(&bets, Slot::High, None), None);
        assert!(is_taken(&bets, Slot::Low, None));
        assert!(!is_taken(&bets, Slot::Low, Some(0)));
    }
}
