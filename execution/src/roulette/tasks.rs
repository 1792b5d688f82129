//! Countdown tasks driving a table through its phases.
//!
//! A table holds at most one task. The host ticks the table at a fixed interval and the
//! task counts down; when it elapses the table performs the transition it owns:
//!
//! 1. **Starting** - countdown before bets open (seconds from the table settings)
//! 2. **Selecting** - players buy chips and move them on the layout
//! 3. **Spinning** - a pocket is drawn every tick; the last draw is kept
//! 4. **Ending** - celebration window before the table restarts
//!
//! Tasks never block; cancelling is dropping the task from the table.

use croupier_types::roulette::GameState;

/// Phase lengths in ticks. The starting countdown comes from the table settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseConfig {
    /// Length of the selecting phase.
    pub selecting_ticks: u32,
    /// Number of draws while the wheel spins.
    pub spin_ticks: u32,
    /// Delay between resolution and restart. Zero restarts at once.
    pub ending_ticks: u32,
}

impl PhaseConfig {
    pub fn new(selecting_ticks: u32, spin_ticks: u32, ending_ticks: u32) -> Self {
        Self {
            selecting_ticks,
            spin_ticks,
            ending_ticks,
        }
    }

    /// Validate the configuration (selecting and spinning must last at least a tick).
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.selecting_ticks == 0 {
            return Err("selecting_ticks must be greater than zero");
        }
        if self.spin_ticks == 0 {
            return Err("spin_ticks must be greater than zero");
        }
        Ok(())
    }

    /// Total length of a round after the starting countdown.
    pub fn total_round_ticks(&self) -> u32 {
        self.selecting_ticks
            .saturating_add(self.spin_ticks)
            .saturating_add(self.ending_ticks)
    }
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self::new(20, 8, 5)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    Starting,
    Selecting,
    Spinning,
    Ending,
}

impl TaskKind {
    /// State the table is in while this task runs.
    pub fn state(&self) -> GameState {
        match self {
            TaskKind::Starting => GameState::Starting,
            TaskKind::Selecting => GameState::Selecting,
            TaskKind::Spinning => GameState::Spinning,
            TaskKind::Ending => GameState::Ending,
        }
    }
}

/// Result of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Still counting; `remaining` ticks left.
    Running { remaining: u32 },
    /// The countdown reached zero on this tick.
    Elapsed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseTask {
    kind: TaskKind,
    total: u32,
    remaining: u32,
}

impl PhaseTask {
    pub fn new(kind: TaskKind, ticks: u32) -> Self {
        Self {
            kind,
            total: ticks,
            remaining: ticks,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn step(&mut self) -> Step {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Step::Elapsed
        } else {
            Step::Running {
                remaining: self.remaining,
            }
        }
    }
}
