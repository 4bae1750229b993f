//! Outbound engine events.
//!
//! The [`PetService`](super::service::PetService) and its components emit
//! these through the [`EventSink`](super::ports::EventSink) port.  Adapters
//! on the other side decide what to do with them: log a line, post a
//! notification, refresh a screen.

use crate::day::Day;
use crate::pet::PetRecord;

/// Structured events emitted by the engine core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PetEvent {
    /// A mutation was committed locally (carries the new record).
    StatsChanged(PetRecord),

    /// Health or happiness reached zero.  The local row is gone.
    Departed,

    /// A feed was applied.
    Fed { feeds_done_today: u8, remaining: u8 },

    /// A feed was requested but the step allowance is used up.
    FeedDenied {
        steps_today: u64,
        /// Step count that unlocks the next feed; `None` at the daily cap.
        next_threshold: Option<u64>,
    },

    /// The decay job removed `points` of hunger.
    Decayed { points: u8, hunger: u8 },

    /// Hunger crossed below the alert threshold (at most once per day).
    HungerAlert { hunger: u8 },

    /// Today's step count changed.
    StepsUpdated { steps: u64 },

    /// A multiple of the milestone interval was crossed.
    StepMilestone { steps: u64 },

    /// The daily step goal was reached for the first time today.
    DailyGoalReached { steps: u64 },

    /// End-of-day step report.
    DailySummary { day: Day, steps: u64 },

    /// All pet and step data was wiped.
    Reset,
}
