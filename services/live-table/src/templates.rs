use std::collections::BTreeMap;

use croupier_execution::Message;
use tracing::warn;

const DEFAULTS: [(&str, &str); 16] = [
    ("joined", "You joined %table% (%players%/%max%)."),
    ("player_joined", "%player% joined the table (%players%/%max%)."),
    ("left", "You left %table%."),
    ("player_left", "%player% left the table."),
    ("countdown", "The game starts in %seconds% seconds."),
    ("bets_open", "Place your bets! %seconds% seconds left."),
    ("selecting_ends", "Bets close in %seconds% seconds."),
    ("chip_placed", "%chip% placed on %slot%."),
    ("not_enough_money", "You need %price% to buy that chip."),
    ("refunded", "%amount% was refunded to you."),
    ("prison_carried", "Your bet on %slot% stays in prison for the next spin."),
    ("spinning", "No more bets. The wheel is spinning!"),
    ("winner", "The ball landed on %slot% (%color%)."),
    ("won", "You won %amount% on %slot% (%win_type%)."),
    ("lost", "You lost your bet on %slot%."),
    ("cannot_afford", "You can no longer afford a chip (%price%)."),
];

/// Player-facing text for each [`Message`] key with `%placeholder%` substitution.
#[derive(Clone, Debug)]
pub struct Templates {
    entries: BTreeMap<String, String>,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            entries: DEFAULTS
                .iter()
                .map(|(key, text)| (key.to_string(), text.to_string()))
                .collect(),
        }
    }
}

impl Templates {
    /// Defaults with `overrides` applied. Overrides for unknown keys are ignored.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut templates = Self::default();
        for (key, text) in overrides {
            match templates.entries.get_mut(key) {
                Some(entry) => *entry = text.clone(),
                None => warn!(key = %key, "ignoring template for unknown message"),
            }
        }
        templates
    }

    pub fn render(&self, message: &Message) -> String {
        let Some(template) = self.entries.get(message.key()) else {
            return message.key().to_string();
        };
        message
            .substitutions()
            .into_iter()
            .fold(template.clone(), |text, (name, value)| {
                text.replace(&format!("%{name}%"), &value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use croupier_types::roulette::{Slot, SlotColor, WinType};

    #[test]
    fn test_every_message_has_a_default() {
        let templates = Templates::default();
        assert_eq!(templates.entries.len(), DEFAULTS.len());
        assert_eq!(
            templates.render(&Message::Spinning),
            "No more bets. The wheel is spinning!"
        );
    }

    #[test]
    fn test_placeholders_are_substituted() {
        let templates = Templates::default();
        assert_eq!(
            templates.render(&Message::Won {
                slot: Slot::Red,
                amount: 200,
                win_type: WinType::Normal,
            }),
            "You won 200 on Red (normal)."
        );
        assert_eq!(
            templates.render(&Message::Winner {
                slot: Slot::Zero,
                color: SlotColor::Green,
            }),
            "The ball landed on 0 (green)."
        );
    }

    #[test]
    fn test_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("lost".to_string(), "Unlucky: %slot%".to_string());
        overrides.insert("nonsense".to_string(), "ignored".to_string());
        let templates = Templates::with_overrides(&overrides);
        assert_eq!(
            templates.render(&Message::Lost {
                slot: Slot::Dozen(3)
            }),
            "Unlucky: 3rd 12"
        );
        assert!(!templates.entries.contains_key("nonsense"));
    }
}
