//! Step history read from the remote per-day documents.
//!
//! Read-only views for the history screen: the last seven days as a fixed
//! window, and whole-history statistics.

use std::collections::BTreeMap;

use crate::app::ports::{IdentityPort, RemoteStore};
use crate::day::Day;
use crate::mirror::Mirror;

pub const WEEK_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySteps {
    pub day: Day,
    pub steps: u64,
}

/// Seven consecutive days ending today, oldest first.
pub type Week = heapless::Vec<DaySteps, WEEK_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStats {
    pub total: u64,
    /// Integer mean over all stored days.
    pub average: u64,
    pub best: DaySteps,
    /// Lowest day with at least one step, if any.
    pub worst_nonzero: Option<DaySteps>,
    /// Consecutive non-zero days counting back from the latest stored day.
    pub streak: u32,
    pub days: u32,
}

/// Statistics over `(day, steps)` pairs in any order.  `None` when empty.
pub fn compute_stats(history: &[(Day, u64)]) -> Option<StepStats> {
    let by_day: BTreeMap<Day, u64> = history.iter().copied().collect();
    let (&latest, _) = by_day.last_key_value()?;

    let total = by_day.values().fold(0u64, |acc, s| acc.saturating_add(*s));
    let days = by_day.len() as u32;
    let as_steps = |(&day, &steps): (&Day, &u64)| DaySteps { day, steps };

    // Ties go to the most recent day.
    let best = by_day.iter().max_by_key(|(_, s)| **s).map(as_steps)?;
    let worst_nonzero = by_day
        .iter()
        .rev()
        .filter(|(_, s)| **s > 0)
        .min_by_key(|(_, s)| **s)
        .map(as_steps);

    let mut streak = 0;
    let mut day = latest;
    while by_day.get(&day).is_some_and(|s| *s > 0) {
        streak += 1;
        let prev = day.pred();
        if prev == day {
            break;
        }
        day = prev;
    }

    Some(StepStats {
        total,
        average: total / u64::from(days),
        best,
        worst_nonzero,
        streak,
        days,
    })
}

pub struct StepHistory<R, I> {
    mirror: Mirror<R, I>,
}

impl<R: RemoteStore, I: IdentityPort> StepHistory<R, I> {
    pub fn new(mirror: Mirror<R, I>) -> Self {
        Self { mirror }
    }

    /// The seven days ending at `today`.  Missing days, and every day when
    /// the remote is unreachable or nobody is signed in, read as 0.
    pub async fn last_7_days(&self, today: Day) -> Week {
        let stored: BTreeMap<Day, u64> = self
            .mirror
            .list_steps()
            .await
            .fetched()
            .unwrap_or_default()
            .into_iter()
            .map(|(day, r)| (day, r.count))
            .collect();

        let mut days = [today; WEEK_LEN];
        for i in (0..WEEK_LEN - 1).rev() {
            days[i] = days[i + 1].pred();
        }
        days.iter()
            .map(|&day| DaySteps {
                day,
                steps: stored.get(&day).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Whole-history statistics; `None` when signed out, unreachable, or
    /// there is no history yet.
    pub async fn global_stats(&self) -> Option<StepStats> {
        let history = self.mirror.list_steps().await.fetched()?;
        let pairs: Vec<(Day, u64)> = history.into_iter().map(|(d, r)| (d, r.count)).collect();
        compute_stats(&pairs)
    }
}
