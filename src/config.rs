//! Engine configuration parameters
//!
//! All tunable parameters for the StepPet engine.
//! Values can be overridden through [`ConfigPort`](crate::app::ports::ConfigPort).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::pet::FEEDS_MAX;

/// Core engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    // --- Decay ---
    /// Minutes for hunger to fall from 100 to 0 with no feeding
    pub full_decay_minutes: u32,
    /// Hunger below this value is "hungry" and triggers the daily alert
    pub hunger_threshold: u8,
    /// Health/happiness lost per decay cycle while hunger is above zero
    pub decay_penalty: u8,
    /// Health/happiness lost per decay cycle while hunger is zero
    pub starvation_penalty: u8,

    // --- Feeding ---
    /// Steps required to unlock one feed
    pub steps_per_feed: u32,
    /// Daily feed cap
    pub max_feeds_per_day: u8,
    /// Stat boost applied to hunger, health and happiness per feed
    pub feed_boost: u8,

    // --- Steps ---
    /// Every multiple of this step count grants a +1 health/happiness boost
    pub milestone_interval: u32,
    /// Daily step goal that unlocks the once-per-day reward
    pub daily_goal_steps: u32,

    // --- Scheduling ---
    /// Cadence of the decay job (minutes)
    pub decay_interval_minutes: u32,
    /// Daily summary time-of-day
    pub summary_hour: u8,
    pub summary_minute: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Decay
            full_decay_minutes: 1440, // 24 h
            hunger_threshold: 20,
            decay_penalty: 1,
            starvation_penalty: 5,

            // Feeding
            steps_per_feed: 1000,
            max_feeds_per_day: 10,
            feed_boost: 10,

            // Steps
            milestone_interval: 100,
            daily_goal_steps: 10_000,

            // Scheduling
            decay_interval_minutes: 30,
            summary_hour: 22,
            summary_minute: 15,
        }
    }
}

impl EngineConfig {
    /// Range-check every field.  Called before any config is persisted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(60..=10_080).contains(&self.full_decay_minutes) {
            return Err(ConfigError::ValidationFailed(
                "full_decay_minutes must be 60–10080",
            ));
        }
        if !(1..=99).contains(&self.hunger_threshold) {
            return Err(ConfigError::ValidationFailed(
                "hunger_threshold must be 1–99",
            ));
        }
        if self.decay_penalty > self.starvation_penalty {
            return Err(ConfigError::ValidationFailed(
                "decay_penalty must not exceed starvation_penalty",
            ));
        }
        if self.starvation_penalty > 100 {
            return Err(ConfigError::ValidationFailed(
                "starvation_penalty must be 0–100",
            ));
        }
        if self.steps_per_feed == 0 {
            return Err(ConfigError::ValidationFailed(
                "steps_per_feed must be > 0",
            ));
        }
        if !(1..=FEEDS_MAX).contains(&self.max_feeds_per_day) {
            return Err(ConfigError::ValidationFailed(
                "max_feeds_per_day must be 1–10",
            ));
        }
        if self.feed_boost > 100 {
            return Err(ConfigError::ValidationFailed("feed_boost must be 0–100"));
        }
        if self.milestone_interval == 0 {
            return Err(ConfigError::ValidationFailed(
                "milestone_interval must be > 0",
            ));
        }
        if self.daily_goal_steps == 0 {
            return Err(ConfigError::ValidationFailed(
                "daily_goal_steps must be > 0",
            ));
        }
        if !(15..=60).contains(&self.decay_interval_minutes) {
            return Err(ConfigError::ValidationFailed(
                "decay_interval_minutes must be 15–60",
            ));
        }
        if self.summary_hour > 23 || self.summary_minute > 59 {
            return Err(ConfigError::ValidationFailed(
                "summary time must be a valid hh:mm",
            ));
        }
        Ok(())
    }
}
