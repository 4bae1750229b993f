//! Service-level flows: scheduled jobs, the daily summary, runtime
//! configuration, notification fan-out and the history views.

use futures_lite::future::block_on;

use steppet::Error;
use steppet::adapters::log_sink::LogEventSink;
use steppet::adapters::notify::NotificationEventSink;
use steppet::app::commands::PetCommand;
use steppet::app::events::PetEvent;
use steppet::app::ports::{ConfigError, ConfigPort, Notifier};
use steppet::app::service::{JOB_DECAY, JOB_STARTUP_DECAY, JOB_SUMMARY, JobResult};
use steppet::config::EngineConfig;
use steppet::feeding::FeedOutcome;
use steppet::history::DaySteps;
use steppet::mirror::StepRecord;
use steppet::pet::Vitality;
use steppet::summary::SummaryOutcome;

use crate::mocks::{PET_DOC, Rig, at, day, steps_doc};

fn tick(rig: &mut Rig, secs: u32) -> Vec<(String, JobResult)> {
    block_on(rig.service.tick(secs, &mut rig.events))
}

fn ran(results: &[(String, JobResult)]) -> Vec<&str> {
    results.iter().map(|(l, _)| l.as_str()).collect()
}

fn summaries(rig: &Rig) -> Vec<PetEvent> {
    rig.events
        .iter()
        .filter(|e| matches!(e, PetEvent::DailySummary { .. }))
        .cloned()
        .collect()
}

#[derive(Default)]
struct Recorder(Vec<(String, String)>);

impl Notifier for Recorder {
    fn notify(&mut self, title: &str, body: &str) {
        self.0.push((title.to_string(), body.to_string()));
    }
}

// ── QA-40: scheduled jobs ───────────────────────────────────

#[test]
fn first_tick_runs_startup_decay_only() {
    let mut rig = Rig::signed_in();
    rig.start();
    let results = tick(&mut rig, 60);
    assert_eq!(results, vec![(JOB_STARTUP_DECAY.to_string(), JobResult::Success)]);
    assert!(tick(&mut rig, 60).is_empty());
}

#[test]
fn periodic_decay_runs_every_half_hour() {
    let mut rig = Rig::signed_in();
    rig.start();
    tick(&mut rig, 60);

    rig.clock.advance_minutes(28);
    assert!(tick(&mut rig, 28 * 60).is_empty());
    rig.clock.advance_minutes(2);
    assert_eq!(ran(&tick(&mut rig, 2 * 60)), vec![JOB_DECAY]);
    assert_eq!(rig.stats(), (98, 99, 99));
}

#[test]
fn summary_fires_at_quarter_past_ten() {
    let mut rig = Rig::signed_in();
    rig.start();
    rig.walk(6000);
    rig.clock.set(at(1, 22, 0));
    tick(&mut rig, 60);
    assert!(summaries(&rig).is_empty());

    rig.clock.set(at(1, 22, 15));
    assert!(ran(&tick(&mut rig, 60)).contains(&JOB_SUMMARY));
    assert_eq!(
        summaries(&rig),
        vec![PetEvent::DailySummary {
            day: day(1),
            steps: 6000
        }]
    );

    rig.clock.set(at(1, 22, 16));
    tick(&mut rig, 60);
    assert_eq!(summaries(&rig).len(), 1);
}

#[test]
fn summary_waits_for_tomorrow_when_started_late() {
    let mut rig = Rig::signed_in();
    rig.clock.set(at(1, 23, 0));
    rig.start();
    assert!(!ran(&tick(&mut rig, 60)).contains(&JOB_SUMMARY));

    rig.clock.set(at(2, 22, 15));
    assert!(ran(&tick(&mut rig, 60)).contains(&JOB_SUMMARY));
}

#[test]
fn unknown_job_is_not_retried() {
    let mut rig = Rig::signed_in();
    let result = block_on(rig.service.run_job("no-such-job", &mut rig.events));
    assert_eq!(result, JobResult::Success);
}

// ── QA-41: daily summary ────────────────────────────────────

#[test]
fn summary_reports_the_larger_of_remote_and_local() {
    let mut rig = Rig::signed_in();
    rig.remote.seed(
        &steps_doc(1),
        StepRecord {
            count: 7000,
            android_total: 0,
        }
        .to_fields(),
    );
    let outcome = block_on(rig.service.run_daily_summary(&mut rig.events)).unwrap();
    assert_eq!(
        outcome,
        SummaryOutcome::Reported {
            day: day(1),
            steps: 7000
        }
    );
}

#[test]
fn summary_when_stopped_sets_tomorrows_baseline() {
    let mut rig = Rig::signed_in();
    rig.start();
    rig.walk(3000);
    block_on(rig.service.stop());
    rig.clock.set(at(1, 22, 15));
    block_on(rig.service.run_daily_summary(&mut rig.events)).unwrap();

    // Walked after the summary: counts for the next day.
    rig.sensor.walk(500);
    rig.clock.set(at(2, 8, 0));
    rig.start();
    assert_eq!(block_on(rig.service.steps_today()).unwrap(), 500);
}

#[test]
fn summary_without_user_is_a_quiet_success() {
    let mut rig = Rig::anonymous();
    let outcome = block_on(rig.service.run_daily_summary(&mut rig.events)).unwrap();
    assert_eq!(outcome, SummaryOutcome::SkippedNoAuth);
    assert!(summaries(&rig).is_empty());
    let result = block_on(rig.service.run_job(JOB_SUMMARY, &mut rig.events));
    assert_eq!(result, JobResult::Success);
}

#[test]
fn summary_survives_offline_remote() {
    let mut rig = Rig::signed_in();
    rig.start();
    rig.walk(1500);
    rig.remote.set_offline(true);
    let outcome = block_on(rig.service.run_daily_summary(&mut rig.events)).unwrap();
    assert_eq!(
        outcome,
        SummaryOutcome::Reported {
            day: day(1),
            steps: 1500
        }
    );
}

// ── QA-42: runtime configuration ────────────────────────────

#[test]
fn invalid_config_is_rejected_and_ignored() {
    let mut rig = Rig::signed_in();
    let bad = EngineConfig {
        max_feeds_per_day: 0,
        ..EngineConfig::default()
    };
    let err = block_on(
        rig.service
            .handle_command(PetCommand::UpdateConfig(bad), &mut rig.events),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::ValidationFailed(_))
    ));
    assert_eq!(rig.service.config(), &EngineConfig::default());
}

#[test]
fn config_update_changes_feed_cost() {
    let mut rig = Rig::signed_in();
    rig.start();
    let cheap = EngineConfig {
        steps_per_feed: 500,
        ..EngineConfig::default()
    };
    block_on(
        rig.service
            .handle_command(PetCommand::UpdateConfig(cheap.clone()), &mut rig.events),
    )
    .unwrap();
    rig.walk(500);
    assert!(matches!(
        block_on(rig.service.feed(&mut rig.events)).unwrap(),
        FeedOutcome::Fed(_)
    ));

    rig.service.save_config(&*rig.storage).unwrap();
    assert_eq!(rig.storage.load().unwrap(), cheap);
}

#[test]
fn config_update_changes_decay_cadence() {
    let mut rig = Rig::signed_in();
    rig.start();
    tick(&mut rig, 60);
    let fast = EngineConfig {
        decay_interval_minutes: 15,
        ..EngineConfig::default()
    };
    rig.service.update_config(fast).unwrap();
    rig.clock.advance_minutes(15);
    assert_eq!(ran(&tick(&mut rig, 15 * 60)), vec![JOB_DECAY]);
}

// ── QA-43: sinks ────────────────────────────────────────────

#[test]
fn hunger_alert_reaches_the_notifier() {
    let rig = Rig::signed_in();
    block_on(rig.service.repository().set_hunger(21)).unwrap();
    let mut sink = (
        LogEventSink::new(),
        (Vec::new(), NotificationEventSink::new(Recorder::default())),
    );
    block_on(rig.service.run_decay(&mut sink)).unwrap();
    rig.clock.advance_minutes(30);
    block_on(rig.service.run_decay(&mut sink)).unwrap();

    let (_, (events, notify)) = sink;
    assert!(events.contains(&PetEvent::HungerAlert { hunger: 19 }));
    let sent = notify.into_inner().0;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Your pet is hungry!");
}

#[test]
fn vitality_reflects_hunger_threshold() {
    let mut rig = Rig::signed_in();
    assert_eq!(block_on(rig.service.vitality()).unwrap(), Vitality::Healthy);
    block_on(rig.service.handle_command(PetCommand::SetHunger(19), &mut rig.events)).unwrap();
    assert_eq!(block_on(rig.service.vitality()).unwrap(), Vitality::Hungry);
}

// ── QA-44: history ──────────────────────────────────────────

#[test]
fn week_and_stats_from_remote_history() {
    let mut rig = Rig::signed_in();
    for (d, count) in [(2, 3000), (3, 0), (5, 8000), (6, 4000)] {
        rig.remote.seed(
            &steps_doc(d),
            StepRecord {
                count,
                android_total: 0,
            }
            .to_fields(),
        );
    }
    rig.clock.set(at(7, 9, 0));
    rig.start();
    rig.walk(1000);
    block_on(rig.service.stop());

    let week = block_on(rig.service.last_7_days());
    let counts: Vec<u64> = week.iter().map(|d| d.steps).collect();
    assert_eq!(counts, vec![0, 3000, 0, 0, 8000, 4000, 1000]);

    let stats = block_on(rig.service.global_stats()).unwrap();
    assert_eq!(stats.total, 16_000);
    assert_eq!(stats.days, 5);
    assert_eq!(stats.best, DaySteps { day: day(5), steps: 8000 });
    assert_eq!(stats.streak, 3);
}

#[test]
fn login_command_syncs_the_pet() {
    let mut rig = Rig::anonymous();
    rig.identity.sign_in(crate::mocks::UID);
    block_on(rig.service.handle_command(PetCommand::SyncFromRemote, &mut rig.events)).unwrap();
    assert!(rig.remote.peek(PET_DOC).is_some());
}
