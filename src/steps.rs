//! Step aggregator: today's step count.
//!
//! The platform exposes a cumulative hardware counter that only grows
//! within a boot cycle.  The aggregator records the counter value at the
//! first observation of each day (the baseline) and reports
//! `max(0, raw - baseline)` as local progress.  That is reconciled with the
//! remote per-day document by taking the maximum, so neither a reboot nor
//! a reinstall ever makes the displayed count go down.
//!
//! Discrete step events and fresh counter readings both feed the same
//! count.  Crossing a multiple of `milestone_interval` is reported so the
//! caller can grant the small stat boost.  The first time in a day the
//! count is seen at or above the daily goal (on an input or at start)
//! emits [`PetEvent::DailyGoalReached`] once, guarded by a persisted
//! reward date.
//!
//! Lifecycle is explicit: [`StepAggregator::start`] when the app comes to
//! the foreground, [`StepAggregator::stop`] when it leaves.  Events that
//! arrive while stopped are ignored.

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use log::{debug, info, warn};

use crate::app::events::PetEvent;
use crate::app::ports::{
    Clock, EventSink, IdentityPort, RemoteStore, StepEvent, StepSensor, StoragePort,
};
use crate::config::EngineConfig;
use crate::day::Day;
use crate::error::Result;
use crate::mirror::{Mirror, MirrorOutcome, StepRecord};
use crate::prefs::{Baseline, Prefs};

/// `max(remote, local, current)`: reconciliation never lowers the count.
pub fn reconcile(remote: u64, local: u64, current: u64) -> u64 {
    remote.max(local).max(current)
}

/// Number of multiples of `interval` crossed going from `old` to `new`.
pub fn milestones_crossed(old: u64, new: u64, interval: u32) -> u32 {
    if interval == 0 || new <= old {
        return 0;
    }
    let interval = u64::from(interval);
    u32::try_from(new / interval - old / interval).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPolicy {
    pub milestone_interval: u32,
    pub daily_goal: u32,
}

impl Default for StepPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl StepPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            milestone_interval: config.milestone_interval,
            daily_goal: config.daily_goal_steps,
        }
    }
}

/// What a step input changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepUpdate {
    pub steps: u64,
    /// Milestone multiples crossed by this input (one stat boost each).
    pub milestones: u32,
    pub goal_reached: bool,
}

#[derive(Debug)]
struct StepState {
    running: bool,
    day: Option<Day>,
    steps: u64,
    baseline: Option<Baseline>,
    last_raw: Option<u64>,
}

pub struct StepAggregator<T, C, S, R, I> {
    sensor: T,
    clock: C,
    prefs: Prefs<S>,
    mirror: Mirror<R, I>,
    policy: StepPolicy,
    state: Mutex<NoopRawMutex, StepState>,
}

impl<T, C, S, R, I> StepAggregator<T, C, S, R, I>
where
    T: StepSensor,
    C: Clock,
    S: StoragePort,
    R: RemoteStore,
    I: IdentityPort,
{
    pub fn new(sensor: T, clock: C, prefs: Prefs<S>, mirror: Mirror<R, I>, policy: StepPolicy) -> Self {
        Self {
            sensor,
            clock,
            prefs,
            mirror,
            policy,
            state: Mutex::new(StepState {
                running: false,
                day: None,
                steps: 0,
                baseline: None,
                last_raw: None,
            }),
        }
    }

    pub fn set_policy(&mut self, policy: StepPolicy) {
        self.policy = policy;
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Begin tracking: capture today's baseline if none exists yet,
    /// reconcile with the remote document and push the result back.
    pub async fn start(&self, sink: &mut impl EventSink) -> Result<u64> {
        let today = self.clock.today();
        let raw = self.sensor.read_total();
        let mut st = self.state.lock().await;

        if st.day != Some(today) {
            st.steps = 0;
        }
        st.day = Some(today);
        st.running = true;

        let local = match raw {
            Some(raw) => {
                let baseline = self.baseline_for(today, raw, st.steps)?;
                st.baseline = Some(baseline);
                st.last_raw = Some(raw);
                baseline.delta(raw)
            }
            None => {
                warn!("Steps: no hardware counter, counting step events only");
                0
            }
        };
        let remote = self
            .mirror
            .fetch_steps(today)
            .await
            .fetched()
            .flatten()
            .map_or(0, |r| r.count);
        st.steps = reconcile(remote, local, st.steps);
        info!(
            "Steps: started, local={} remote={} -> {}",
            local, remote, st.steps
        );

        self.push(today, &st).await;
        sink.emit(&PetEvent::StepsUpdated { steps: st.steps });
        // Steps walked while stopped, or already counted remotely, may
        // have reached the goal without any input crossing it.
        self.check_goal(st.steps, sink)?;
        Ok(st.steps)
    }

    /// Stop tracking and push the final count remotely.
    pub async fn stop(&self) -> MirrorOutcome {
        let mut st = self.state.lock().await;
        if !st.running {
            return MirrorOutcome::Succeeded;
        }
        st.running = false;
        info!("Steps: stopped at {}", st.steps);
        match st.day {
            Some(day) => self.push(day, &st).await,
            None => MirrorOutcome::Succeeded,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    // ── Inputs ────────────────────────────────────────────────

    pub async fn handle(&self, event: StepEvent, sink: &mut impl EventSink) -> Result<StepUpdate> {
        match event {
            StepEvent::Step => self.record_steps(1, sink).await,
            StepEvent::CounterTotal(raw) => self.record_total(raw, sink).await,
        }
    }

    /// `n` discrete steps detected.
    pub async fn record_steps(&self, n: u64, sink: &mut impl EventSink) -> Result<StepUpdate> {
        let mut st = self.state.lock().await;
        if !st.running {
            return Ok(StepUpdate {
                steps: st.steps,
                ..StepUpdate::default()
            });
        }
        self.roll_over_if_needed(&mut st).await?;
        let new = st.steps.saturating_add(n);
        self.advance(&mut st, new, sink)
    }

    /// Fresh reading of the cumulative hardware counter.
    pub async fn record_total(&self, raw: u64, sink: &mut impl EventSink) -> Result<StepUpdate> {
        let mut st = self.state.lock().await;
        if !st.running {
            return Ok(StepUpdate {
                steps: st.steps,
                ..StepUpdate::default()
            });
        }
        self.roll_over_if_needed(&mut st).await?;
        let today = self.clock.today();
        let baseline = match st.baseline {
            Some(b) if b.day == today && raw >= b.raw => b,
            // First reading today, or the counter restarted (reboot).
            _ => self.baseline_for(today, raw, st.steps)?,
        };
        st.baseline = Some(baseline);
        st.last_raw = Some(raw);
        let new = reconcile(0, baseline.delta(raw), st.steps);
        self.advance(&mut st, new, sink)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Today's steps.  Rolls over to 0 first if the day changed.
    pub async fn steps_today(&self) -> Result<u64> {
        let mut st = self.state.lock().await;
        self.roll_over_if_needed(&mut st).await?;
        Ok(st.steps)
    }

    // ── Baseline maintenance ──────────────────────────────────

    /// Capture tomorrow's baseline from the sensor now (daily summary).
    /// Only when not running; a running aggregator re-captures at midnight.
    pub async fn capture_next_day_baseline(&self) -> Result<Option<Baseline>> {
        let st = self.state.lock().await;
        if st.running {
            return Ok(None);
        }
        let Some(raw) = self.sensor.read_total() else {
            return Ok(None);
        };
        let baseline = Baseline::new(self.clock.today().succ(), raw);
        self.prefs.set_step_baseline(baseline)?;
        debug!("Steps: next-day baseline captured at {}", raw);
        Ok(Some(baseline))
    }

    /// Forget today's progress (after a full data reset).  A running
    /// aggregator re-captures its baseline from the current reading.
    pub async fn clear(&self) -> Result<()> {
        let mut st = self.state.lock().await;
        st.steps = 0;
        st.baseline = None;
        if st.running {
            if let Some(raw) = self.sensor.read_total() {
                let baseline = Baseline::new(self.clock.today(), raw);
                self.prefs.set_step_baseline(baseline)?;
                st.baseline = Some(baseline);
                st.last_raw = Some(raw);
            }
        }
        Ok(())
    }

    // ── Internal ──────────────────────────────────────────────

    /// Stored baseline for `today`, or a freshly captured one.  A counter
    /// below the stored baseline means the device rebooted: keep what was
    /// already counted as `carried`.
    fn baseline_for(&self, today: Day, raw: u64, counted: u64) -> Result<Baseline> {
        let stored = self.prefs.step_baseline().filter(|b| b.day == today);
        let baseline = match stored {
            Some(b) if raw >= b.raw => return Ok(b),
            // The counter restarted from zero: everything it reads now was
            // walked after the reboot.
            Some(b) => {
                info!("Steps: counter restarted ({} < {}), rebasing", raw, b.raw);
                Baseline {
                    day: today,
                    raw: 0,
                    carried: counted.max(b.carried),
                }
            }
            None => {
                info!("Steps: baseline for {} captured at {}", today, raw);
                Baseline::new(today, raw)
            }
        };
        self.prefs.set_step_baseline(baseline)?;
        Ok(baseline)
    }

    async fn roll_over_if_needed(&self, st: &mut StepState) -> Result<()> {
        let today = self.clock.today();
        let Some(day) = st.day else {
            st.day = Some(today);
            return Ok(());
        };
        if day == today {
            return Ok(());
        }
        info!("Steps: day rolled over ({} -> {}), {} steps on {}", day, today, st.steps, day);
        self.push(day, st).await;
        st.day = Some(today);
        st.steps = 0;
        st.baseline = match self.sensor.read_total() {
            Some(raw) => {
                let baseline = Baseline::new(today, raw);
                self.prefs.set_step_baseline(baseline)?;
                st.last_raw = Some(raw);
                Some(baseline)
            }
            None => None,
        };
        Ok(())
    }

    fn advance(&self, st: &mut StepState, new: u64, sink: &mut impl EventSink) -> Result<StepUpdate> {
        let old = st.steps;
        if new <= old {
            return Ok(StepUpdate {
                steps: old,
                ..StepUpdate::default()
            });
        }
        st.steps = new;
        sink.emit(&PetEvent::StepsUpdated { steps: new });

        let milestones = milestones_crossed(old, new, self.policy.milestone_interval);
        if milestones > 0 {
            let interval = u64::from(self.policy.milestone_interval);
            sink.emit(&PetEvent::StepMilestone {
                steps: new / interval * interval,
            });
        }

        let goal_reached = self.check_goal(new, sink)?;

        Ok(StepUpdate {
            steps: new,
            milestones,
            goal_reached,
        })
    }

    /// Emit the daily goal event if `steps` is at or above the goal and no
    /// reward was recorded today.
    fn check_goal(&self, steps: u64, sink: &mut impl EventSink) -> Result<bool> {
        if steps < u64::from(self.policy.daily_goal) {
            return Ok(false);
        }
        let today = self.clock.today();
        if self.prefs.reward_day() == Some(today) {
            return Ok(false);
        }
        self.prefs.set_reward_day(today)?;
        info!("Steps: daily goal reached ({})", steps);
        sink.emit(&PetEvent::DailyGoalReached { steps });
        Ok(true)
    }

    async fn push(&self, day: Day, st: &StepState) -> MirrorOutcome {
        let record = StepRecord {
            count: st.steps,
            android_total: st.last_raw.unwrap_or(0),
        };
        self.mirror.push_steps(day, record).await
    }
}
