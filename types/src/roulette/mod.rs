//! Roulette table domain types.
//!
//! Defines the betting layout (slots and their exclusivity groups), table/rule/state enums,
//! chips and the paytable, table settings and the session records produced by a round.

mod chip;
mod session;
mod settings;
mod slot;
mod table;

pub use chip::*;
pub use session::*;
pub use settings::*;
pub use slot::*;
pub use table::*;

#[cfg(test)]
mod tests;
