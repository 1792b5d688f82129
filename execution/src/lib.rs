//! Croupier execution layer.
//!
//! This crate contains the roulette table state machine and bet settlement. It is
//! host-agnostic: tables talk to economy, rendering, chat and storage through the
//! traits in [`roulette::ports`].
//!
//! ## Determinism requirements
//! - Do not read wall-clock time inside a table; use the host [`roulette::Clock`].
//! - Randomness only comes from the RNG handed to [`Game::tick`].
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! ## Minimal table loop (example)
//! ```rust,ignore
//! use std::sync::Arc;
//! use croupier_execution::{Game, PhaseConfig};
//! use croupier_types::roulette::{House, TableSettings};
//!
//! let mut game = Game::new("main", TableSettings::default(), PhaseConfig::default(), Arc::new(House::default()));
//! game.open(&mut host);
//! game.join(&mut host, "alice")?;
//! loop {
//!     game.tick(&mut host, &mut rng);
//! }
//! ```

pub mod roulette;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use roulette::{
    BetError, Direction, Game, Host, JoinError, Message, PhaseConfig, Seat, TaskKind,
};
