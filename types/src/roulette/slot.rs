use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::TableType;

/// Red numbers on a roulette wheel.
pub const RED_NUMBERS: [u8; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];

/// Highest single number on the layout.
pub const MAX_NUMBER: u8 = 36;

const NAME_PREFIX: &str = "SLOT_";

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum SlotParseError {
    #[error("unknown slot name: {0}")]
    Unknown(String),
    #[error("slot number out of range (got={got}, max={max})")]
    OutOfRange { got: u8, max: u8 },
}

/// Colour classification of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotColor {
    Red,
    Black,
    Green,
    Mixed,
}

/// One betting cell or betting group on the layout.
///
/// `Number` holds 1..=36, `Column` and `Dozen` hold 1..=3. Use the checked constructors
/// when building slots from untrusted input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Slot {
    Zero,
    DoubleZero,
    Number(u8),
    Column(u8),
    Dozen(u8),
    Low,
    Even,
    Red,
    Black,
    Odd,
    High,
}

impl Slot {
    /// Single-number slot for `0..=36`.
    pub fn number(n: u8) -> Option<Self> {
        match n {
            0 => Some(Slot::Zero),
            1..=MAX_NUMBER => Some(Slot::Number(n)),
            _ => None,
        }
    }

    pub fn column(index: u8) -> Option<Self> {
        (1..=3).contains(&index).then_some(Slot::Column(index))
    }

    pub fn dozen(index: u8) -> Option<Self> {
        (1..=3).contains(&index).then_some(Slot::Dozen(index))
    }

    /// Every slot in layout order, regardless of table type.
    pub fn all() -> impl Iterator<Item = Slot> {
        [Slot::Zero, Slot::DoubleZero]
            .into_iter()
            .chain((1..=MAX_NUMBER).map(Slot::Number))
            .chain((1..=3).map(Slot::Column))
            .chain((1..=3).map(Slot::Dozen))
            .chain([Slot::Low, Slot::Even, Slot::Red, Slot::Black, Slot::Odd, Slot::High])
    }

    /// The legal betting slots for a table: the opposite zero and disabled slots removed.
    pub fn values(table_type: TableType, disabled: &BTreeSet<Slot>) -> Vec<Slot> {
        Slot::all()
            .filter(|slot| table_type.allows(*slot))
            .filter(|slot| !disabled.contains(slot))
            .collect()
    }

    /// The pockets of the wheel (every single slot the ball can land on).
    pub fn pockets(table_type: TableType) -> Vec<Slot> {
        Slot::all()
            .filter(|slot| slot.is_single() && table_type.allows(*slot))
            .collect()
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Slot::Zero | Slot::DoubleZero | Slot::Number(_))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Slot::Zero | Slot::DoubleZero)
    }

    /// Outside bets paying 1:1 (the only ones the zero house rules apply to).
    pub fn is_even_money(&self) -> bool {
        matches!(
            self,
            Slot::Low | Slot::High | Slot::Even | Slot::Odd | Slot::Red | Slot::Black
        )
    }

    pub fn slot_type(&self) -> Option<SlotType> {
        match self {
            Slot::Red | Slot::Black => Some(SlotType::Color),
            Slot::Even | Slot::Odd => Some(SlotType::OddEven),
            Slot::Low | Slot::High => Some(SlotType::HighLow),
            Slot::Column(_) => Some(SlotType::Column),
            Slot::Dozen(_) => Some(SlotType::Dozen),
            Slot::Zero | Slot::DoubleZero | Slot::Number(_) => None,
        }
    }

    pub fn color(&self) -> SlotColor {
        match self {
            Slot::Zero | Slot::DoubleZero => SlotColor::Green,
            Slot::Number(n) if is_red(*n) => SlotColor::Red,
            Slot::Number(_) => SlotColor::Black,
            Slot::Red => SlotColor::Red,
            Slot::Black => SlotColor::Black,
            _ => SlotColor::Mixed,
        }
    }

    /// Whether a bet on `self` wins when the ball lands on `pocket`.
    pub fn contains(&self, pocket: Slot) -> bool {
        if *self == pocket {
            return true;
        }
        match pocket {
            Slot::Number(n) => self.covers(n),
            _ => false,
        }
    }

    fn covers(&self, n: u8) -> bool {
        if !(1..=MAX_NUMBER).contains(&n) {
            return false;
        }
        match self {
            Slot::Number(own) => *own == n,
            Slot::Column(c) => (n - 1) % 3 + 1 == *c,
            Slot::Dozen(d) => (n - 1) / 12 + 1 == *d,
            Slot::Low => n <= 18,
            Slot::High => n >= 19,
            Slot::Even => n % 2 == 0,
            Slot::Odd => n % 2 == 1,
            Slot::Red => is_red(n),
            Slot::Black => !is_red(n),
            Slot::Zero | Slot::DoubleZero => false,
        }
    }

    /// Total return multiplier (stake included) before configuration overrides.
    pub fn default_multiplier(&self) -> u64 {
        match self {
            Slot::Zero | Slot::DoubleZero | Slot::Number(_) => 36,
            Slot::Column(_) | Slot::Dozen(_) => 3,
            _ => 2,
        }
    }

    /// Probability of this slot winning, formatted for display.
    pub fn chance(&self, table_type: TableType) -> &'static str {
        match (table_type, self.is_single(), self.is_even_money()) {
            (TableType::European, true, _) => "1/37 (2.7%)",
            (TableType::American, true, _) => "1/38 (2.6%)",
            (TableType::European, false, true) => "18/37 (48.6%)",
            (TableType::American, false, true) => "18/38 (47.4%)",
            (TableType::European, false, false) => "12/37 (32.4%)",
            (TableType::American, false, false) => "12/38 (31.6%)",
        }
    }

    /// Stable configuration name, e.g. `SLOT_17` or `SLOT_COLUMN_2`.
    pub fn name(&self) -> String {
        match self {
            Slot::Zero => "SLOT_0".to_string(),
            Slot::DoubleZero => "SLOT_00".to_string(),
            Slot::Number(n) => format!("SLOT_{n}"),
            Slot::Column(c) => format!("SLOT_COLUMN_{c}"),
            Slot::Dozen(d) => format!("SLOT_DOZEN_{d}"),
            Slot::Low => "SLOT_LOW".to_string(),
            Slot::High => "SLOT_HIGH".to_string(),
            Slot::Even => "SLOT_EVEN".to_string(),
            Slot::Odd => "SLOT_ODD".to_string(),
            Slot::Red => "SLOT_RED".to_string(),
            Slot::Black => "SLOT_BLACK".to_string(),
        }
    }

    /// Player-facing label.
    pub fn label(&self) -> String {
        match self {
            Slot::Zero => "0".to_string(),
            Slot::DoubleZero => "00".to_string(),
            Slot::Number(n) => n.to_string(),
            Slot::Column(c) => format!("{} column", ordinal(*c)),
            Slot::Dozen(d) => format!("{} 12", ordinal(*d)),
            Slot::Low => "1-18".to_string(),
            Slot::High => "19-36".to_string(),
            Slot::Even => "Even".to_string(),
            Slot::Odd => "Odd".to_string(),
            Slot::Red => "Red".to_string(),
            Slot::Black => "Black".to_string(),
        }
    }
}

fn ordinal(n: u8) -> &'static str {
    match n {
        1 => "1st",
        2 => "2nd",
        _ => "3rd",
    }
}

/// Check if a number is red.
pub fn is_red(number: u8) -> bool {
    RED_NUMBERS.contains(&number)
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Slot {
    type Err = SlotParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let name = raw.trim().to_ascii_uppercase();
        let rest = name
            .strip_prefix(NAME_PREFIX)
            .ok_or_else(|| SlotParseError::Unknown(raw.to_string()))?;
        let parse_index = |value: &str, max: u8| -> Result<u8, SlotParseError> {
            let index = value
                .parse::<u8>()
                .map_err(|_| SlotParseError::Unknown(raw.to_string()))?;
            if index == 0 || index > max {
                return Err(SlotParseError::OutOfRange { got: index, max });
            }
            Ok(index)
        };
        match rest {
            "0" => Ok(Slot::Zero),
            "00" => Ok(Slot::DoubleZero),
            "LOW" => Ok(Slot::Low),
            "HIGH" => Ok(Slot::High),
            "EVEN" => Ok(Slot::Even),
            "ODD" => Ok(Slot::Odd),
            "RED" => Ok(Slot::Red),
            "BLACK" => Ok(Slot::Black),
            _ => {
                if let Some(index) = rest.strip_prefix("COLUMN_") {
                    return parse_index(index, 3).map(Slot::Column);
                }
                if let Some(index) = rest.strip_prefix("DOZEN_") {
                    return parse_index(index, 3).map(Slot::Dozen);
                }
                parse_index(rest, MAX_NUMBER).map(Slot::Number)
            }
        }
    }
}

impl TryFrom<String> for Slot {
    type Error = SlotParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Slot> for String {
    fn from(slot: Slot) -> Self {
        slot.name()
    }
}

/// Group of mutually exclusive outside bets.
///
/// A player may hold at most one active, non-prison bet on members of the same group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Color,
    OddEven,
    HighLow,
    Column,
    Dozen,
}

impl SlotType {
    pub const ALL: [SlotType; 5] = [
        SlotType::Color,
        SlotType::OddEven,
        SlotType::HighLow,
        SlotType::Column,
        SlotType::Dozen,
    ];

    pub fn members(&self) -> &'static [Slot] {
        match self {
            SlotType::Color => &[Slot::Red, Slot::Black],
            SlotType::OddEven => &[Slot::Even, Slot::Odd],
            SlotType::HighLow => &[Slot::Low, Slot::High],
            SlotType::Column => &[Slot::Column(1), Slot::Column(2), Slot::Column(3)],
            SlotType::Dozen => &[Slot::Dozen(1), Slot::Dozen(2), Slot::Dozen(3)],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotType::Color => "color",
            SlotType::OddEven => "odd/even",
            SlotType::HighLow => "high/low",
            SlotType::Column => "column",
            SlotType::Dozen => "dozen",
        }
    }
}
