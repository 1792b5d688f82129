//! Common types used throughout croupier.

pub mod roulette;
