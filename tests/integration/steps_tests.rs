//! Step aggregation through the service: baselines, reconciliation with
//! the remote day document, reboots, milestones, the daily goal and the
//! midnight rollover.

use futures_lite::future::block_on;
use futures_lite::stream;

use steppet::app::events::PetEvent;
use steppet::app::ports::StepEvent;
use steppet::mirror::StepRecord;

use crate::mocks::{Rig, at, steps_doc};

fn remote_count(rig: &Rig, d: u32) -> Option<u64> {
    rig.remote.peek(&steps_doc(d))?.get("count")?.as_u64()
}

fn seed_count(rig: &Rig, d: u32, count: u64) {
    rig.remote.seed(
        &steps_doc(d),
        StepRecord {
            count,
            android_total: 0,
        }
        .to_fields(),
    );
}

fn steps(rig: &Rig) -> u64 {
    block_on(rig.service.steps_today()).unwrap()
}

// ── QA-30: baseline and counting ────────────────────────────

#[test]
fn start_captures_baseline_at_zero() {
    let mut rig = Rig::signed_in();
    rig.start();
    assert_eq!(steps(&rig), 0);
    assert_eq!(remote_count(&rig, 1), Some(0));
    rig.walk(350);
    assert_eq!(steps(&rig), 350);
}

#[test]
fn discrete_steps_count_one_each() {
    let mut rig = Rig::signed_in();
    rig.start();
    for _ in 0..5 {
        block_on(rig.service.on_step_event(StepEvent::Step, &mut rig.events)).unwrap();
    }
    assert_eq!(steps(&rig), 5);
}

#[test]
fn input_while_stopped_is_ignored() {
    let mut rig = Rig::signed_in();
    rig.walk(500);
    assert_eq!(steps(&rig), 0);
    block_on(rig.service.on_step_event(StepEvent::Step, &mut rig.events)).unwrap();
    assert_eq!(steps(&rig), 0);
}

#[test]
fn steps_before_reopening_count_from_baseline() {
    let mut rig = Rig::signed_in();
    rig.start();
    rig.walk(200);
    block_on(rig.service.stop());
    assert_eq!(remote_count(&rig, 1), Some(200));

    rig.sensor.walk(300);
    rig.start();
    assert_eq!(steps(&rig), 500);
}

// ── QA-31: reconciliation ───────────────────────────────────

#[test]
fn remote_higher_wins() {
    let mut rig = Rig::signed_in();
    rig.start();
    block_on(rig.service.stop());
    rig.sensor.walk(500);
    seed_count(&rig, 1, 800);

    rig.start();
    assert_eq!(steps(&rig), 800);
}

#[test]
fn local_higher_wins_and_is_pushed() {
    let mut rig = Rig::signed_in();
    rig.start();
    block_on(rig.service.stop());
    rig.sensor.walk(900);
    seed_count(&rig, 1, 300);

    rig.start();
    assert_eq!(steps(&rig), 900);
    assert_eq!(remote_count(&rig, 1), Some(900));
}

#[test]
fn offline_start_counts_locally() {
    let mut rig = Rig::signed_in();
    rig.remote.set_offline(true);
    rig.start();
    rig.walk(1200);
    assert_eq!(steps(&rig), 1200);
    assert_eq!(remote_count(&rig, 1), None);
}

// ── QA-32: reboot ───────────────────────────────────────────

#[test]
fn counter_reset_never_lowers_the_count() {
    let mut rig = Rig::signed_in();
    rig.start();
    rig.walk(700);
    rig.sensor.reboot();
    rig.walk(50);
    assert_eq!(steps(&rig), 750);
    rig.walk(100);
    assert_eq!(steps(&rig), 850);
}

// ── QA-33: milestones and goal ──────────────────────────────

#[test]
fn each_hundred_steps_boosts_health_and_happiness() {
    let mut rig = Rig::signed_in();
    rig.start();
    rig.set_stats(90);
    rig.walk(99);
    assert_eq!(rig.stats(), (90, 90, 90));
    rig.walk(1);
    assert_eq!(rig.stats(), (90, 91, 91));
    rig.walk(250);
    assert_eq!(rig.stats(), (90, 93, 93));
    assert_eq!(
        rig.count(|e| matches!(e, PetEvent::StepMilestone { .. })),
        2
    );
}

#[test]
fn daily_goal_rewards_once() {
    let mut rig = Rig::signed_in();
    rig.start();
    rig.walk(9_999);
    rig.walk(1);
    rig.walk(5_000);
    let goals: Vec<_> = rig
        .events
        .iter()
        .filter(|e| matches!(e, PetEvent::DailyGoalReached { .. }))
        .collect();
    assert_eq!(goals, vec![&PetEvent::DailyGoalReached { steps: 10_000 }]);

    // Restarting the same day does not grant it again.
    block_on(rig.service.stop());
    rig.start();
    rig.walk(1);
    assert_eq!(
        rig.count(|e| matches!(e, PetEvent::DailyGoalReached { .. })),
        1
    );
}

#[test]
fn goal_walked_while_stopped_rewards_at_start() {
    let mut rig = Rig::signed_in();
    rig.start();
    block_on(rig.service.stop());
    rig.sensor.walk(12_000);

    rig.start();
    rig.walk(50);
    assert_eq!(steps(&rig), 12_050);
    let goals: Vec<_> = rig
        .events
        .iter()
        .filter(|e| matches!(e, PetEvent::DailyGoalReached { .. }))
        .collect();
    assert_eq!(goals, vec![&PetEvent::DailyGoalReached { steps: 12_000 }]);
}

#[test]
fn remote_count_past_goal_rewards_at_start() {
    let mut rig = Rig::signed_in();
    seed_count(&rig, 1, 10_500);
    rig.start();
    rig.walk(10);
    assert_eq!(
        rig.count(|e| matches!(e, PetEvent::DailyGoalReached { .. })),
        1
    );

    // A new day grants it again once the goal is reached.
    rig.clock.set(at(2, 8, 0));
    assert_eq!(steps(&rig), 0);
    rig.walk(10_000);
    assert_eq!(
        rig.count(|e| matches!(e, PetEvent::DailyGoalReached { .. })),
        2
    );
}

// ── QA-34: midnight rollover ────────────────────────────────

#[test]
fn rollover_pushes_yesterday_and_restarts() {
    let mut rig = Rig::signed_in();
    rig.start();
    rig.walk(4321);
    rig.clock.set(at(2, 0, 1));
    assert_eq!(steps(&rig), 0);
    rig.walk(10);
    assert_eq!(steps(&rig), 10);
    assert_eq!(remote_count(&rig, 1), Some(4321));

    block_on(rig.service.stop());
    assert_eq!(remote_count(&rig, 2), Some(10));
}

// ── QA-35: stream input ─────────────────────────────────────

#[test]
fn step_stream_is_drained() {
    let mut rig = Rig::signed_in();
    rig.start();
    let input = stream::iter([
        StepEvent::Step,
        StepEvent::Step,
        StepEvent::CounterTotal(50_100),
        StepEvent::Step,
    ]);
    block_on(rig.service.run_step_events(input, &mut rig.events)).unwrap();
    assert_eq!(steps(&rig), 101);
}
