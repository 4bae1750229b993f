//! Time-proportional stat decay.
//!
//! Hunger falls linearly with wall-clock time: a full 100 → 0 drop spans
//! `full_decay_minutes` (24 h by default).  Each run also costs health and
//! happiness, a little while hunger remains, a lot once it is zero.
//!
//! ```text
//!   no decay clock ──▶ Initialized   (anchor clock, remember hunger)
//!   < 1 minute     ──▶ TooSoon       (remember hunger only)
//!   < 1 point      ──▶ BelowResolution (clock NOT advanced)
//!   otherwise      ──▶ Applied / Departed
//! ```
//!
//! The decay clock only advances by the time the applied points account
//! for, so the fractional remainder carries into the next run and repeated
//! runs add up to exactly the same loss as one long run.
//!
//! The steps of a run persist independently (stats, alert marker, observed
//! hunger, clock).  A crash between them can leave stats applied without
//! the clock advanced; the next run then decays that interval again.  Runs
//! are periodic and self-correcting, so this gap is accepted.

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, info};

use crate::app::events::PetEvent;
use crate::app::ports::{Clock, EventSink, IdentityPort, LocalPetStore, RemoteStore, StoragePort};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::pet::STAT_MAX;
use crate::prefs::Prefs;
use crate::repository::{Mutation, VitalityRepository};

const MS_PER_MINUTE: i64 = 60_000;

/// Result of one decay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayOutcome {
    /// First run ever: the clock was anchored, nothing decayed.
    Initialized,
    /// Less than a minute since the last run.
    TooSoon,
    /// Elapsed time not yet worth one point; the clock keeps its anchor.
    BelowResolution,
    Applied { points: u8, hunger: u8, alerted: bool },
    /// The pet departed during this run or had already.
    Departed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayPolicy {
    pub full_decay_minutes: u32,
    pub hunger_threshold: u8,
    pub decay_penalty: u8,
    pub starvation_penalty: u8,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl DecayPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            full_decay_minutes: config.full_decay_minutes.max(1),
            hunger_threshold: config.hunger_threshold,
            decay_penalty: config.decay_penalty,
            starvation_penalty: config.starvation_penalty,
        }
    }

    /// Milliseconds of elapsed time worth one hunger point.
    fn ms_per_point(&self) -> i64 {
        i64::from(self.full_decay_minutes) * MS_PER_MINUTE / i64::from(STAT_MAX)
    }

    /// Whole hunger points earned by `elapsed_ms` (floor).
    pub fn points_for(&self, elapsed_ms: i64) -> i64 {
        if elapsed_ms <= 0 {
            return 0;
        }
        elapsed_ms * i64::from(STAT_MAX) / (i64::from(self.full_decay_minutes) * MS_PER_MINUTE)
    }

    /// Health and happiness lost in a run that leaves hunger at `hunger`.
    pub fn penalty(&self, hunger: u8) -> u8 {
        if hunger == 0 {
            self.starvation_penalty
        } else {
            self.decay_penalty
        }
    }
}

/// The decay job.  Owns its preference handle; the repository is passed in
/// per run.
pub struct DecayProcess<S> {
    prefs: Prefs<S>,
    policy: DecayPolicy,
}

impl<S: StoragePort> DecayProcess<S> {
    pub fn new(prefs: Prefs<S>, policy: DecayPolicy) -> Self {
        Self { prefs, policy }
    }

    pub fn set_policy(&mut self, policy: DecayPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> DecayPolicy {
        self.policy
    }

    /// One decay run.  Safe to re-run: with an unchanged clock anchor no
    /// interval is decayed twice.
    pub async fn run<L, R, I, C, S2>(
        &self,
        repo: &VitalityRepository<L, R, I, C, S2>,
        sink: &mut impl EventSink,
    ) -> Result<DecayOutcome>
    where
        L: LocalPetStore,
        R: RemoteStore,
        I: IdentityPort,
        C: Clock,
        S2: StoragePort,
    {
        if repo.is_departed() {
            return Ok(DecayOutcome::Departed);
        }
        let now = repo.now();
        let current = repo.current_or_default().await?;

        // 1. First run: anchor.
        let Some(last) = self.prefs.last_decay_at() else {
            self.prefs.set_last_decay_at(now)?;
            self.prefs.set_last_observed_hunger(current.hunger)?;
            info!("Decay: clock initialised at hunger={}", current.hunger);
            return Ok(DecayOutcome::Initialized);
        };

        // 2. Under a minute (or the clock went backwards).
        let elapsed_ms = (now - last).num_milliseconds();
        if elapsed_ms < MS_PER_MINUTE {
            if elapsed_ms < 0 {
                debug!("Decay: clock moved backwards, re-anchoring");
                self.prefs.set_last_decay_at(now)?;
            }
            self.prefs.set_last_observed_hunger(current.hunger)?;
            return Ok(DecayOutcome::TooSoon);
        }

        // 3–4. Whole points only; keep the anchor when there are none.
        let points = self.policy.points_for(elapsed_ms);
        if points < 1 {
            debug!("Decay: {} ms elapsed, below one point", elapsed_ms);
            return Ok(DecayOutcome::BelowResolution);
        }
        let applied = points.min(i64::from(STAT_MAX)) as u8;

        // 5–6. Hunger loss and penalty in one serialized update, computed
        // from the committed record so a concurrent feed is not lost.
        let policy = self.policy;
        let mutation = repo
            .update(|r| {
                let hunger = r.hunger.saturating_sub(applied);
                let penalty = -i32::from(policy.penalty(hunger));
                r.with_hunger(i32::from(hunger))
                    .with_deltas(0, penalty, penalty)
            })
            .await?;
        let record = match &mutation {
            Mutation::Alive(record) => record.clone(),
            Mutation::Departed | Mutation::AlreadyDeparted => {
                mutation.emit(sink);
                return Ok(DecayOutcome::Departed);
            }
        };

        // 7. Threshold crossing, at most once per calendar day.
        let observed = self.prefs.last_observed_hunger().unwrap_or(current.hunger);
        let threshold = self.policy.hunger_threshold;
        let today = repo.today();
        let crossed = observed >= threshold && record.hunger < threshold;
        let alerted = crossed && self.prefs.hunger_alert_day() != Some(today);
        if alerted {
            sink.emit(&PetEvent::HungerAlert {
                hunger: record.hunger,
            });
            self.prefs.set_hunger_alert_day(today)?;
        }

        // 8. Remember hunger; advance the clock by what was consumed.
        self.prefs.set_last_observed_hunger(record.hunger)?;
        self.prefs.set_last_decay_at(self.advanced_anchor(last, now, points))?;

        info!(
            "Decay: -{} hunger -> {} (health={}, happiness={})",
            applied, record.hunger, record.health, record.happiness
        );
        sink.emit(&PetEvent::Decayed {
            points: applied,
            hunger: record.hunger,
        });
        mutation.emit(sink);

        Ok(DecayOutcome::Applied {
            points: applied,
            hunger: record.hunger,
            alerted,
        })
    }

    /// New clock anchor after applying `points`.  Past a full span there is
    /// nothing left to carry.
    fn advanced_anchor(&self, last: NaiveDateTime, now: NaiveDateTime, points: i64) -> NaiveDateTime {
        if points >= i64::from(STAT_MAX) {
            return now;
        }
        let consumed = TimeDelta::milliseconds(points * self.policy.ms_per_point());
        (last + consumed).min(now)
    }
}
