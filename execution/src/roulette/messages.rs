use croupier_types::roulette::{Slot, SlotColor, WinType};
use serde::Serialize;

/// Templated notification for one player. The host renders it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "key", rename_all = "snake_case")]
pub enum Message {
    Joined { table: String, players: usize, max_players: usize },
    PlayerJoined { player: String, players: usize, max_players: usize },
    Left { table: String },
    PlayerLeft { player: String },
    Countdown { seconds: u32 },
    BetsOpen { seconds: u32 },
    SelectingEnds { seconds: u32 },
    ChipPlaced { chip: String, slot: Slot },
    NotEnoughMoney { price: u64 },
    Refunded { amount: u64 },
    PrisonCarried { slot: Slot },
    Spinning,
    Winner { slot: Slot, color: SlotColor },
    Won { slot: Slot, amount: u64, win_type: WinType },
    Lost { slot: Slot },
    CannotAfford { price: u64 },
}

impl Message {
    /// Template key used to look up the rendered text.
    pub fn key(&self) -> &'static str {
        match self {
            Message::Joined { .. } => "joined",
            Message::PlayerJoined { .. } => "player_joined",
            Message::Left { .. } => "left",
            Message::PlayerLeft { .. } => "player_left",
            Message::Countdown { .. } => "countdown",
            Message::BetsOpen { .. } => "bets_open",
            Message::SelectingEnds { .. } => "selecting_ends",
            Message::ChipPlaced { .. } => "chip_placed",
            Message::NotEnoughMoney { .. } => "not_enough_money",
            Message::Refunded { .. } => "refunded",
            Message::PrisonCarried { .. } => "prison_carried",
            Message::Spinning => "spinning",
            Message::Winner { .. } => "winner",
            Message::Won { .. } => "won",
            Message::Lost { .. } => "lost",
            Message::CannotAfford { .. } => "cannot_afford",
        }
    }

    /// Placeholder values substituted into the template.
    pub fn substitutions(&self) -> Vec<(&'static str, String)> {
        match self {
            Message::Joined { table, players, max_players } => vec![
                ("table", table.clone()),
                ("players", players.to_string()),
                ("max", max_players.to_string()),
            ],
            Message::PlayerJoined { player, players, max_players } => vec![
                ("player", player.clone()),
                ("players", players.to_string()),
                ("max", max_players.to_string()),
            ],
            Message::Left { table } => vec![("table", table.clone())],
            Message::PlayerLeft { player } => vec![("player", player.clone())],
            Message::Countdown { seconds }
            | Message::BetsOpen { seconds }
            | Message::SelectingEnds { seconds } => vec![("seconds", seconds.to_string())],
            Message::ChipPlaced { chip, slot } => {
                vec![("chip", chip.clone()), ("slot", slot.label())]
            }
            Message::NotEnoughMoney { price } | Message::CannotAfford { price } => {
                vec![("price", price.to_string())]
            }
            Message::Refunded { amount } => vec![("amount", amount.to_string())],
            Message::PrisonCarried { slot } | Message::Lost { slot } => {
                vec![("slot", slot.label())]
            }
            Message::Spinning => Vec::new(),
            Message::Winner { slot, color } => vec![
                ("slot", slot.label()),
                ("color", format!("{color:?}").to_lowercase()),
            ],
            Message::Won { slot, amount, win_type } => vec![
                ("slot", slot.label()),
                ("amount", amount.to_string()),
                ("win_type", win_type.as_str().to_string()),
            ],
        }
    }
}
