//! Pet service: the composition root of the engine.
//!
//! [`PetService`] owns the repository, the decay and summary jobs, the
//! step aggregator, the history reader and the scheduler.  It exposes a
//! platform-agnostic API; all I/O flows through the port adapters given to
//! [`PetService::new`] and the event sink passed at each call site.
//!
//! ```text
//!  UI / login ──▶ handle_command ─┐
//!  step source ──▶ on_step_event ─┤   ┌──────────────────────────┐
//!  host timer ───▶ tick ──────────┴──▶│        PetService        │──▶ EventSink
//!                                     │ Repo · Decay · Steps ·   │
//!                                     │ Summary · History · Sched│
//!                                     └──────────────────────────┘
//! ```
//!
//! Job bodies report failures as [`anyhow::Error`]; the runner maps any
//! failure to [`JobResult::Retry`] and the job is run again on the next
//! tick.  Re-running is safe: decay never decays an interval twice and the
//! summary only reports.

use anyhow::Context;
use futures_lite::{Stream, StreamExt};
use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::decay::{DecayOutcome, DecayPolicy, DecayProcess};
use crate::error::{Error, Result};
use crate::feeding::{FeedOutcome, FeedThrottle, effective_feeds_done};
use crate::history::{StepHistory, StepStats, Week};
use crate::mirror::{Mirror, MirrorOutcome};
use crate::pet::{PetRecord, Vitality};
use crate::prefs::Prefs;
use crate::repository::{SyncOutcome, VitalityRepository};
use crate::scheduler::{Schedule, ScheduleKind, Scheduler};
use crate::steps::{StepAggregator, StepPolicy, StepUpdate};
use crate::summary::{SummaryJob, SummaryOutcome};

use super::commands::PetCommand;
use super::events::PetEvent;
use super::ports::{
    Clock, ConfigPort, EventSink, IdentityPort, LocalPetStore, PetReceiver, RemoteStore,
    ScheduleFiredKind, SchedulerDelegate, StepEvent, StepSensor, StoragePort,
};

/// Periodic decay job.
pub const JOB_DECAY: &str = "pet-decay";
/// Daily step summary job.
pub const JOB_SUMMARY: &str = "daily-step-summary";
/// Decay run right after startup, catching up time spent closed.
pub const JOB_STARTUP_DECAY: &str = "startup-decay";

/// What a job run tells the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobResult {
    Success,
    Retry,
}

/// Collects the labels of schedules that fired during one tick.
#[derive(Default)]
struct DueJobs(Vec<String>);

impl SchedulerDelegate for DueJobs {
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind) {
        debug!("PetService: '{}' due ({:?})", label, kind);
        if !self.0.iter().any(|l| l == label) {
            self.0.push(label.to_string());
        }
    }
}

fn decay_schedule(config: &EngineConfig) -> ScheduleKind {
    ScheduleKind::Periodic {
        interval_secs: config.decay_interval_minutes * 60,
    }
}

fn summary_schedule(config: &EngineConfig) -> ScheduleKind {
    ScheduleKind::DailyAt {
        hour: config.summary_hour,
        minute: config.summary_minute,
    }
}

// ───────────────────────────────────────────────────────────────
// PetService
// ───────────────────────────────────────────────────────────────

pub struct PetService<L, R, I, C, S, T> {
    config: EngineConfig,
    throttle: FeedThrottle,
    repo: VitalityRepository<L, R, I, C, S>,
    decay: DecayProcess<S>,
    steps: StepAggregator<T, C, S, R, I>,
    summary: SummaryJob<R, I>,
    history: StepHistory<R, I>,
    scheduler: Scheduler,
    clock: C,
    /// Jobs that asked for a retry, run again on the next tick.
    retry: Vec<String>,
}

impl<L, R, I, C, S, T> PetService<L, R, I, C, S, T>
where
    L: LocalPetStore,
    R: RemoteStore + Clone,
    I: IdentityPort + Clone,
    C: Clock + Clone,
    S: StoragePort + Clone,
    T: StepSensor,
{
    /// Wire the engine from its adapters.  Shared adapters (`R`, `I`, `C`,
    /// `S`) are cloned into each component, so pass cheap handles (`Rc`).
    ///
    /// Registers the decay, summary and startup-decay schedules; call
    /// [`start`](Self::start) next.
    pub fn new(
        config: EngineConfig,
        local: L,
        remote: R,
        identity: I,
        clock: C,
        storage: S,
        sensor: T,
    ) -> Self {
        let mirror = Mirror::new(remote, identity);
        let prefs = Prefs::new(storage);

        let mut scheduler = Scheduler::new();
        for (label, kind) in [
            (JOB_STARTUP_DECAY, ScheduleKind::OneShot { delay_secs: 0 }),
            (JOB_DECAY, decay_schedule(&config)),
            (JOB_SUMMARY, summary_schedule(&config)),
        ] {
            scheduler.add(Schedule {
                label,
                kind,
                enabled: true,
            });
        }

        Self {
            throttle: FeedThrottle::from_config(&config),
            repo: VitalityRepository::new(local, mirror.clone(), prefs.clone(), clock.clone()),
            decay: DecayProcess::new(prefs.clone(), DecayPolicy::from_config(&config)),
            steps: StepAggregator::new(
                sensor,
                clock.clone(),
                prefs,
                mirror.clone(),
                StepPolicy::from_config(&config),
            ),
            summary: SummaryJob::new(mirror.clone()),
            history: StepHistory::new(mirror),
            scheduler,
            clock,
            config,
            retry: Vec::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// App came to the foreground: load (or create) the pet and start
    /// step tracking.
    pub async fn start(&self, sink: &mut impl EventSink) -> Result<()> {
        let pet = self.repo.current_or_default().await?;
        if self.repo.is_departed() {
            sink.emit(&PetEvent::Departed);
        } else {
            sink.emit(&PetEvent::StatsChanged(pet));
        }
        let steps = self.steps.start(sink).await?;
        info!("PetService started ({} steps today)", steps);
        Ok(())
    }

    /// App left the foreground: stop step tracking and push the count.
    pub async fn stop(&self) -> MirrorOutcome {
        let outcome = self.steps.stop().await;
        info!("PetService stopped (steps mirror: {:?})", outcome);
        outcome
    }

    // ── Scheduling ────────────────────────────────────────────

    /// Advance the scheduler by `tick_secs` and run every job that came
    /// due, plus any job that asked for a retry last time.
    pub async fn tick(
        &mut self,
        tick_secs: u32,
        sink: &mut impl EventSink,
    ) -> Vec<(String, JobResult)> {
        let mut due = DueJobs(core::mem::take(&mut self.retry));
        self.scheduler.tick(self.clock.now(), tick_secs, &mut due);

        let mut results = Vec::with_capacity(due.0.len());
        for label in due.0 {
            let result = self.run_job(&label, sink).await;
            if result == JobResult::Retry {
                self.retry.push(label.clone());
            }
            results.push((label, result));
        }
        results
    }

    /// Run one job by label.  Any failure means "retry".
    pub async fn run_job(&self, label: &str, sink: &mut impl EventSink) -> JobResult {
        let result: anyhow::Result<()> = match label {
            JOB_DECAY | JOB_STARTUP_DECAY => self
                .decay
                .run(&self.repo, sink)
                .await
                .map(|outcome| debug!("Jobs: decay -> {:?}", outcome))
                .context("decay run failed"),
            JOB_SUMMARY => self
                .summary
                .run(self.clock.today(), &self.steps, sink)
                .await
                .map(|outcome| debug!("Jobs: summary -> {:?}", outcome))
                .context("daily summary failed"),
            other => {
                warn!("Jobs: unknown job '{}' ignored", other);
                Ok(())
            }
        };
        match result {
            Ok(()) => JobResult::Success,
            Err(e) => {
                warn!("Jobs: '{}' failed: {:#}; will retry", label, e);
                JobResult::Retry
            }
        }
    }

    pub async fn run_decay(&self, sink: &mut impl EventSink) -> Result<DecayOutcome> {
        self.decay.run(&self.repo, sink).await
    }

    pub async fn run_daily_summary(&self, sink: &mut impl EventSink) -> Result<SummaryOutcome> {
        self.summary
            .run(self.clock.today(), &self.steps, sink)
            .await
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (UI, login flow, debug tools).
    pub async fn handle_command(&mut self, cmd: PetCommand, sink: &mut impl EventSink) -> Result<()> {
        match cmd {
            PetCommand::Feed => {
                self.feed(sink).await?;
            }
            PetCommand::SetHunger(level) => {
                self.repo.set_hunger(level).await?.emit(sink);
            }
            PetCommand::AdjustStats {
                hunger,
                health,
                happiness,
            } => {
                self.repo
                    .apply_stat_delta(hunger, health, happiness)
                    .await?
                    .emit(sink);
            }
            PetCommand::Rename(name) => {
                self.repo.rename(&name).await?.emit(sink);
            }
            PetCommand::SyncFromRemote => {
                self.sync_from_remote(sink).await?;
            }
            PetCommand::Reset => {
                self.reset(sink).await?;
            }
            PetCommand::RunDecay => {
                self.run_job(JOB_DECAY, sink).await;
            }
            PetCommand::RunDailySummary => {
                self.run_job(JOB_SUMMARY, sink).await;
            }
            PetCommand::UpdateConfig(config) => {
                self.update_config(config)?;
            }
        }
        Ok(())
    }

    /// Feed if today's steps allow it.
    pub async fn feed(&self, sink: &mut impl EventSink) -> Result<FeedOutcome> {
        let steps = self.steps.steps_today().await?;
        let outcome = self.repo.feed_if_allowed(steps, &self.throttle).await?;
        match &outcome {
            FeedOutcome::Fed(record) => {
                sink.emit(&PetEvent::Fed {
                    feeds_done_today: record.feeds_done_today,
                    remaining: self
                        .throttle
                        .remaining_feeds(record, steps, self.clock.today()),
                });
                sink.emit(&PetEvent::StatsChanged(record.clone()));
            }
            FeedOutcome::Denied { next_threshold } => {
                sink.emit(&PetEvent::FeedDenied {
                    steps_today: steps,
                    next_threshold: *next_threshold,
                });
            }
            FeedOutcome::Departed => {}
        }
        Ok(outcome)
    }

    pub async fn sync_from_remote(&self, sink: &mut impl EventSink) -> Result<SyncOutcome> {
        let outcome = self.repo.sync_from_remote().await?;
        match &outcome {
            SyncOutcome::Pulled(record) | SyncOutcome::Seeded(record) => {
                sink.emit(&PetEvent::StatsChanged(record.clone()));
            }
            SyncOutcome::Departed => sink.emit(&PetEvent::Departed),
            SyncOutcome::SkippedNoAuth | SyncOutcome::Failed => {}
        }
        Ok(outcome)
    }

    /// Wipe all pet and step data, locally and (best effort) remotely.
    pub async fn reset(&self, sink: &mut impl EventSink) -> Result<MirrorOutcome> {
        let outcome = self.repo.reset().await?;
        self.steps.clear().await?;
        sink.emit(&PetEvent::Reset);
        Ok(outcome)
    }

    /// Validate and apply a new configuration at runtime.
    pub fn update_config(&mut self, config: EngineConfig) -> Result<()> {
        config.validate()?;
        self.throttle = FeedThrottle::from_config(&config);
        self.decay.set_policy(DecayPolicy::from_config(&config));
        self.steps.set_policy(StepPolicy::from_config(&config));
        self.scheduler.reschedule(JOB_DECAY, decay_schedule(&config));
        self.scheduler
            .reschedule(JOB_SUMMARY, summary_schedule(&config));
        self.config = config;
        info!("Configuration updated at runtime");
        Ok(())
    }

    pub fn save_config(&self, store: &impl ConfigPort) -> Result<()> {
        store.save(&self.config).map_err(Error::from)
    }

    // ── Steps ─────────────────────────────────────────────────

    /// Feed one step input through the aggregator and grant the milestone
    /// boost (best effort: a failed boost is logged, not returned).
    pub async fn on_step_event(
        &self,
        event: StepEvent,
        sink: &mut impl EventSink,
    ) -> Result<StepUpdate> {
        let update = self.steps.handle(event, sink).await?;
        if update.milestones > 0 {
            let boost = i32::try_from(update.milestones).unwrap_or(i32::MAX);
            match self.repo.apply_stat_delta(0, boost, boost).await {
                Ok(mutation) => mutation.emit(sink),
                Err(e) => warn!("PetService: milestone boost failed: {}", e),
            }
        }
        Ok(update)
    }

    /// Drain a step source until it ends.
    pub async fn run_step_events<St>(&self, mut events: St, sink: &mut impl EventSink) -> Result<()>
    where
        St: Stream<Item = StepEvent> + Unpin,
    {
        while let Some(event) = events.next().await {
            self.on_step_event(event, sink).await?;
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub async fn pet(&self) -> Result<PetRecord> {
        self.repo.current_or_default().await
    }

    pub async fn vitality(&self) -> Result<Vitality> {
        let pet = self.repo.current_or_default().await?;
        Ok(pet.vitality(self.config.hunger_threshold))
    }

    pub async fn steps_today(&self) -> Result<u64> {
        self.steps.steps_today().await
    }

    /// Feeds still available today, from the effective (day-reset) count.
    pub async fn remaining_feeds(&self) -> Result<u8> {
        let pet = self.repo.current_or_default().await?;
        let steps = self.steps.steps_today().await?;
        Ok(self
            .throttle
            .remaining_feeds(&pet, steps, self.clock.today()))
    }

    /// Step count that unlocks the next feed; `None` once all are used.
    pub async fn next_feed_threshold(&self) -> Result<Option<u64>> {
        let pet = self.repo.current_or_default().await?;
        Ok(self.throttle.next_feed_threshold(&pet, self.clock.today()))
    }

    pub async fn feeds_done_today(&self) -> Result<u8> {
        let pet = self.repo.current_or_default().await?;
        Ok(effective_feeds_done(&pet, self.clock.today()))
    }

    pub async fn last_7_days(&self) -> Week {
        self.history.last_7_days(self.clock.today()).await
    }

    pub async fn global_stats(&self) -> Option<StepStats> {
        self.history.global_stats().await
    }

    pub fn subscribe(&self) -> Option<PetReceiver<'_>> {
        self.repo.subscribe()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Direct access for callers that compose their own flows.
    pub fn repository(&self) -> &VitalityRepository<L, R, I, C, S> {
        &self.repo
    }
}
