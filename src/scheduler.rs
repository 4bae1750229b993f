//! Timer/scheduler engine.
//!
//! Stands in for the platform's background job scheduler.  The host calls
//! [`Scheduler::tick`] on a fixed cadence with the local wall clock; the
//! scheduler notifies a [`SchedulerDelegate`] when a schedule fires and
//! the service runs the matching job.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Trigger Sources                          │
//! │                                                              │
//! │  ┌──────────────┐   ┌────────────────┐   ┌───────────────┐   │
//! │  │ Periodic     │   │ Daily at hh:mm │   │ One-Shot      │   │
//! │  │ (decay)      │   │ (summary)      │   │ (startup)     │   │
//! │  └──────┬───────┘   └───────┬────────┘   └───────┬───────┘   │
//! │         │                   │                    │           │
//! │         ▼                   ▼                    ▼           │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              SchedulerDelegate                         │  │
//! │  │         (service collects due job labels)              │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          │                                   │
//! │                          ▼                                   │
//! │                    PetService.run_job()                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::info;

use crate::app::ports::{ScheduleFiredKind, SchedulerDelegate};

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A single schedule entry.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Job label passed to the delegate (e.g. "pet-decay").
    pub label: &'static str,
    pub kind: ScheduleKind,
    pub enabled: bool,
}

/// The type of schedule determines how and when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    /// Fire every `interval_secs` seconds.
    Periodic { interval_secs: u32 },
    /// Fire once per calendar date at or after `hour:minute` local time.
    DailyAt { hour: u8, minute: u8 },
    /// Fire once after `delay_secs`, then auto-disable.
    OneShot { delay_secs: u32 },
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

/// The scheduler engine.
///
/// When a schedule fires it invokes the [`SchedulerDelegate`] callback
/// rather than running anything itself, which keeps it independently
/// testable.
pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
}

/// Internal bookkeeping for a live schedule.
#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// Seconds since last fire (Periodic) or since added (OneShot).
    elapsed_secs: u64,
    /// Date of the last fire (DailyAt).
    last_fired_on: Option<NaiveDate>,
    /// Whether the entry has seen a tick yet (DailyAt).
    seen: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
        }
    }

    /// Add a schedule.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        for (i, slot) in self.schedules.iter_mut().enumerate() {
            if slot.is_none() {
                info!("Scheduler: added '{}' at slot {}", schedule.label, i);
                *slot = Some(ScheduleEntry {
                    schedule,
                    elapsed_secs: 0,
                    last_fired_on: None,
                    seen: false,
                });
                return Some(i);
            }
        }
        None // All slots full.
    }

    /// Change the timing of the schedule labelled `label`.  Periodic
    /// progress restarts; a daily schedule keeps its last fire date.
    /// Returns `false` if no such schedule exists.
    pub fn reschedule(&mut self, label: &str, kind: ScheduleKind) -> bool {
        let Some(entry) = self
            .schedules
            .iter_mut()
            .flatten()
            .find(|e| e.schedule.label == label)
        else {
            return false;
        };
        if entry.schedule.kind != kind {
            info!("Scheduler: '{}' now {:?}", label, kind);
            entry.schedule.kind = kind;
            entry.elapsed_secs = 0;
        }
        true
    }

    /// Advance by one tick of `tick_secs` seconds ending at `now`.
    ///
    /// Every schedule that comes due calls `delegate.on_schedule_fired()`
    /// with its label and kind; the caller decides what to run.
    pub fn tick(
        &mut self,
        now: NaiveDateTime,
        tick_secs: u32,
        delegate: &mut dyn SchedulerDelegate,
    ) {
        for slot in &mut self.schedules {
            let entry = match slot {
                Some(e) if e.schedule.enabled => e,
                _ => continue,
            };

            entry.elapsed_secs += u64::from(tick_secs);
            let first_tick = !entry.seen;
            entry.seen = true;

            match entry.schedule.kind {
                ScheduleKind::Periodic { interval_secs } => {
                    if entry.elapsed_secs >= u64::from(interval_secs) {
                        info!(
                            "Scheduler: '{}' periodic fire (every {}s)",
                            entry.schedule.label, interval_secs
                        );
                        delegate.on_schedule_fired(
                            entry.schedule.label,
                            ScheduleFiredKind::Periodic,
                        );
                        entry.elapsed_secs = 0;
                    }
                }

                ScheduleKind::DailyAt { hour, minute } => {
                    let Some(at) = NaiveTime::from_hms_opt(u32::from(hour), u32::from(minute), 0)
                    else {
                        continue;
                    };
                    let today = now.date();
                    if now.time() < at || entry.last_fired_on == Some(today) {
                        continue;
                    }
                    if first_tick {
                        // Started after today's slot: next fire is tomorrow.
                        entry.last_fired_on = Some(today);
                        continue;
                    }
                    info!(
                        "Scheduler: '{}' daily fire ({:02}:{:02})",
                        entry.schedule.label, hour, minute
                    );
                    delegate.on_schedule_fired(entry.schedule.label, ScheduleFiredKind::Daily);
                    entry.last_fired_on = Some(today);
                }

                ScheduleKind::OneShot { delay_secs } => {
                    if entry.elapsed_secs >= u64::from(delay_secs) {
                        info!(
                            "Scheduler: '{}' one-shot fired (after {}s)",
                            entry.schedule.label, delay_secs
                        );
                        delegate.on_schedule_fired(
                            entry.schedule.label,
                            ScheduleFiredKind::OneShot,
                        );
                        entry.schedule.enabled = false; // Auto-disable.
                    }
                }
            }
        }
    }

    /// Number of active (enabled) schedules.
    pub fn active_count(&self) -> usize {
        self.schedules
            .iter()
            .filter(|s| s.as_ref().is_some_and(|e| e.schedule.enabled))
            .count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
