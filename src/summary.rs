//! Daily step summary job.
//!
//! Runs once a day (22:15 by default).  Reports the day's step total as a
//! [`PetEvent::DailySummary`] and captures the hardware baseline for the
//! next day, so steps walked before the app is next opened still count.
//! Without a signed-in user there is no remote total to report and the run
//! is a successful no-op.

use log::{info, warn};

use crate::app::events::PetEvent;
use crate::app::ports::{Clock, EventSink, IdentityPort, RemoteStore, StepSensor, StoragePort};
use crate::day::Day;
use crate::error::Result;
use crate::mirror::{Fetch, Mirror};
use crate::steps::StepAggregator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryOutcome {
    Reported { day: Day, steps: u64 },
    SkippedNoAuth,
}

pub struct SummaryJob<R, I> {
    mirror: Mirror<R, I>,
}

impl<R: RemoteStore, I: IdentityPort> SummaryJob<R, I> {
    pub fn new(mirror: Mirror<R, I>) -> Self {
        Self { mirror }
    }

    pub async fn run<T, C, S, R2, I2>(
        &self,
        day: Day,
        steps: &StepAggregator<T, C, S, R2, I2>,
        sink: &mut impl EventSink,
    ) -> Result<SummaryOutcome>
    where
        T: StepSensor,
        C: Clock,
        S: StoragePort,
        R2: RemoteStore,
        I2: IdentityPort,
    {
        let remote = match self.mirror.fetch_steps(day).await {
            Fetch::SkippedNoAuth => {
                info!("Summary: not signed in, skipping");
                return Ok(SummaryOutcome::SkippedNoAuth);
            }
            Fetch::Failed(e) => {
                warn!("Summary: remote total unavailable ({}), using 0", e);
                0
            }
            Fetch::Fetched(doc) => doc.map_or(0, |r| r.count),
        };
        let total = remote.max(steps.steps_today().await?);

        info!("Summary: {} steps on {}", total, day);
        sink.emit(&PetEvent::DailySummary { day, steps: total });

        if let Some(b) = steps.capture_next_day_baseline().await? {
            info!("Summary: baseline for {} set to {}", b.day, b.raw);
        }
        Ok(SummaryOutcome::Reported { day, steps: total })
    }
}
