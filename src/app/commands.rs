//! Inbound commands to the engine.
//!
//! These represent actions requested by the outside world (UI, login
//! flow, background scheduler) that the
//! [`PetService`](super::service::PetService) interprets and acts upon.

use crate::config::EngineConfig;

/// Commands that external adapters can send into the engine core.
#[derive(Debug, Clone)]
pub enum PetCommand {
    /// Feed the pet if today's steps allow it.
    Feed,

    /// Set hunger directly (clamped).
    SetHunger(i32),

    /// Apply signed deltas to hunger, health and happiness.
    AdjustStats {
        hunger: i32,
        health: i32,
        happiness: i32,
    },

    /// Change the display name.
    Rename(String),

    /// Replace the local record with the remote copy (after login).
    SyncFromRemote,

    /// Wipe all local and remote pet and step data.
    Reset,

    /// Run the decay job now, outside the schedule.
    RunDecay,

    /// Run the daily summary job now, outside the schedule.
    RunDailySummary,

    /// Hot-reload configuration.  Rejected if it fails validation.
    UpdateConfig(EngineConfig),
}
