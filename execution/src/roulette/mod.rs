//! Roulette table engine.
//!
//! A [`Game`] is one table. It owns its players, their [`Bet`]s and the single running
//! phase task, and reaches the outside world only through the [`ports::Host`] traits.
//! All mutation happens on the thread that ticks the table.

mod bet;
mod conflict;
mod game;
pub mod layout;
mod lifecycle;
mod messages;
pub mod ports;
mod resolution;
pub mod tasks;

pub use bet::*;
pub use conflict::*;
pub use game::*;
pub use layout::{Direction, TableSide};
pub use messages::*;
pub use ports::*;
pub use resolution::*;
pub use tasks::{PhaseConfig, PhaseTask, Step, TaskKind};
