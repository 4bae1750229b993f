//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each engine event as one structured
//! line through the `log` facade.  Whatever logger the host installs
//! (logcat bridge, env_logger, a file) receives them.

use log::{info, warn};

use crate::app::events::PetEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`PetEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &PetEvent) {
        match event {
            PetEvent::StatsChanged(p) => {
                info!(
                    "STATS | hunger={} health={} happiness={} | feeds={} on {}",
                    p.hunger, p.health, p.happiness, p.feeds_done_today, p.last_feed_date
                );
            }
            PetEvent::Departed => {
                warn!("PET | departed");
            }
            PetEvent::Fed {
                feeds_done_today,
                remaining,
            } => {
                info!("FEED | ok, done={} remaining={}", feeds_done_today, remaining);
            }
            PetEvent::FeedDenied {
                steps_today,
                next_threshold,
            } => match next_threshold {
                Some(n) => info!("FEED | denied at {} steps, next at {}", steps_today, n),
                None => info!("FEED | denied at {} steps, daily cap reached", steps_today),
            },
            PetEvent::Decayed { points, hunger } => {
                info!("DECAY | -{} -> hunger={}", points, hunger);
            }
            PetEvent::HungerAlert { hunger } => {
                info!("ALERT | hungry, hunger={}", hunger);
            }
            PetEvent::StepsUpdated { steps } => {
                info!("STEPS | today={}", steps);
            }
            PetEvent::StepMilestone { steps } => {
                info!("STEPS | milestone at {}", steps);
            }
            PetEvent::DailyGoalReached { steps } => {
                info!("STEPS | daily goal reached ({})", steps);
            }
            PetEvent::DailySummary { day, steps } => {
                info!("SUMMARY | {} steps={}", day, steps);
            }
            PetEvent::Reset => {
                info!("PET | all data reset");
            }
        }
    }
}
