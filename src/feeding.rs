//! Feed-throttle rule.
//!
//! One feed is unlocked per `steps_per_feed` steps walked today, up to
//! `max_feeds_per_day`.  The persisted `feeds_done_today` only counts for
//! the day in `last_feed_date`; on any other day the effective count is 0.
//! That reset is never written on read.  It is persisted together with the
//! next successful feed.
//!
//! Everything here is pure.  The atomic read-check-write lives in
//! [`VitalityRepository::feed_if_allowed`](crate::repository::VitalityRepository::feed_if_allowed).

use crate::config::EngineConfig;
use crate::day::Day;
use crate::pet::PetRecord;

/// Feeds already used today, honouring the lazy daily reset.
pub fn effective_feeds_done(record: &PetRecord, today: Day) -> u8 {
    if record.last_feed_date == today {
        record.feeds_done_today
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedThrottle {
    steps_per_feed: u32,
    max_feeds_per_day: u8,
    boost: u8,
}

impl Default for FeedThrottle {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl FeedThrottle {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            steps_per_feed: config.steps_per_feed.max(1),
            max_feeds_per_day: config.max_feeds_per_day,
            boost: config.feed_boost,
        }
    }

    /// `clamp(steps / steps_per_feed, 0, max_feeds_per_day)`
    pub fn max_feeds_allowed(&self, steps_today: u64) -> u8 {
        let unlocked = steps_today / u64::from(self.steps_per_feed);
        unlocked.min(u64::from(self.max_feeds_per_day)) as u8
    }

    pub fn can_feed(&self, record: &PetRecord, steps_today: u64, today: Day) -> bool {
        effective_feeds_done(record, today) < self.max_feeds_allowed(steps_today)
    }

    pub fn remaining_feeds(&self, record: &PetRecord, steps_today: u64, today: Day) -> u8 {
        self.max_feeds_allowed(steps_today)
            .saturating_sub(effective_feeds_done(record, today))
    }

    /// Step count at which the next feed unlocks, or `None` once every
    /// feed of the day has been used.
    pub fn next_feed_threshold(&self, record: &PetRecord, today: Day) -> Option<u64> {
        let done = effective_feeds_done(record, today);
        (done < self.max_feeds_per_day)
            .then(|| (u64::from(done) + 1) * u64::from(self.steps_per_feed))
    }

    /// The record after one feed: boost every stat, count the feed for
    /// `today` (restarting from 0 on a new day).
    pub fn apply(&self, record: &PetRecord, today: Day) -> PetRecord {
        let boost = i32::from(self.boost);
        let mut fed = record.with_deltas(boost, boost, boost);
        fed.feeds_done_today = effective_feeds_done(record, today).saturating_add(1);
        fed.last_feed_date = today;
        fed
    }
}

/// Result of a feed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    /// The boost was applied and persisted.
    Fed(PetRecord),
    /// Not enough steps for another feed today.  Not an error.
    Denied { next_threshold: Option<u64> },
    /// The pet has departed; nothing to feed.
    Departed,
}
