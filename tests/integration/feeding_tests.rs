//! Step-gated feeding through the service: the unlock table, the feed
//! effect, the daily reset and the decay-clock restart.

use futures_lite::future::block_on;

use steppet::app::events::PetEvent;
use steppet::decay::DecayOutcome;
use steppet::feeding::FeedOutcome;
use steppet::pet::PetRecord;
use steppet::repository::SyncOutcome;

use crate::mocks::{PET_DOC, Rig, at, day};

fn feed(rig: &mut Rig) -> FeedOutcome {
    block_on(rig.service.feed(&mut rig.events)).unwrap()
}

fn started() -> Rig {
    let mut rig = Rig::signed_in();
    rig.start();
    rig
}

// ── QA-20: unlock table ─────────────────────────────────────

#[test]
fn feeds_unlock_per_thousand_steps() {
    let mut rig = started();
    rig.walk(999);
    assert_eq!(
        feed(&mut rig),
        FeedOutcome::Denied {
            next_threshold: Some(1000)
        }
    );

    rig.walk(1);
    assert!(matches!(feed(&mut rig), FeedOutcome::Fed(_)));
    assert_eq!(
        feed(&mut rig),
        FeedOutcome::Denied {
            next_threshold: Some(2000)
        }
    );
    assert_eq!(block_on(rig.service.next_feed_threshold()).unwrap(), Some(2000));
}

#[test]
fn daily_cap_is_ten_feeds() {
    let mut rig = started();
    rig.walk(15_000);
    assert_eq!(block_on(rig.service.remaining_feeds()).unwrap(), 10);
    for _ in 0..10 {
        assert!(matches!(feed(&mut rig), FeedOutcome::Fed(_)));
    }
    assert_eq!(block_on(rig.service.remaining_feeds()).unwrap(), 0);
    assert_eq!(block_on(rig.service.feeds_done_today()).unwrap(), 10);
    assert_eq!(block_on(rig.service.next_feed_threshold()).unwrap(), None);
    assert_eq!(
        feed(&mut rig),
        FeedOutcome::Denied {
            next_threshold: None
        }
    );
}

#[test]
fn denied_feed_is_reported_with_progress() {
    let mut rig = started();
    rig.walk(420);
    rig.take_events();
    feed(&mut rig);
    assert_eq!(
        rig.events,
        vec![PetEvent::FeedDenied {
            steps_today: 420,
            next_threshold: Some(1000)
        }]
    );
}

// ── QA-21: feed effect ──────────────────────────────────────

#[test]
fn feed_boosts_every_stat_by_ten() {
    let mut rig = started();
    rig.walk(1000);
    rig.set_stats(50);
    rig.take_events();

    let FeedOutcome::Fed(record) = feed(&mut rig) else {
        panic!("feed should be allowed");
    };
    assert_eq!((record.hunger, record.health, record.happiness), (60, 60, 60));
    assert_eq!(record.feeds_done_today, 1);
    assert_eq!(record.last_feed_date, day(1));
    assert_eq!(
        rig.events,
        vec![
            PetEvent::Fed {
                feeds_done_today: 1,
                remaining: 0
            },
            PetEvent::StatsChanged(record.clone()),
        ]
    );
    let doc = rig.remote.peek(PET_DOC).unwrap();
    assert_eq!(doc["feedsDoneToday"].as_u64(), Some(1));
}

#[test]
fn feed_on_full_pet_still_counts() {
    let mut rig = started();
    rig.walk(1000);
    feed(&mut rig);
    assert_eq!(rig.stats(), (100, 100, 100));
    assert_eq!(block_on(rig.service.feeds_done_today()).unwrap(), 1);
}

// ── QA-22: daily reset ──────────────────────────────────────

#[test]
fn yesterdays_feeds_do_not_count_today() {
    let mut rig = Rig::signed_in();
    let mut yesterday = PetRecord::new_default(day(1));
    yesterday.feeds_done_today = 10;
    rig.remote.seed(PET_DOC, yesterday.to_fields());
    rig.clock.set(at(2, 8, 0));

    let synced = block_on(rig.service.sync_from_remote(&mut rig.events)).unwrap();
    assert!(matches!(synced, SyncOutcome::Pulled(_)));
    assert_eq!(block_on(rig.service.feeds_done_today()).unwrap(), 0);

    rig.start();
    rig.walk(1000);
    let FeedOutcome::Fed(record) = feed(&mut rig) else {
        panic!("first feed of the day should be allowed");
    };
    assert_eq!(record.feeds_done_today, 1);
    assert_eq!(record.last_feed_date, day(2));
    assert!(matches!(feed(&mut rig), FeedOutcome::Denied { .. }));
}

#[test]
fn midnight_resets_steps_and_feeds() {
    let mut rig = started();
    rig.walk(3000);
    feed(&mut rig);
    feed(&mut rig);
    assert_eq!(block_on(rig.service.remaining_feeds()).unwrap(), 1);

    rig.clock.set(at(2, 0, 5));
    assert_eq!(block_on(rig.service.steps_today()).unwrap(), 0);
    assert_eq!(block_on(rig.service.feeds_done_today()).unwrap(), 0);
    assert_eq!(block_on(rig.service.remaining_feeds()).unwrap(), 0);
    assert_eq!(block_on(rig.service.next_feed_threshold()).unwrap(), Some(1000));
}

// ── QA-23: feeding restarts the decay clock ─────────────────

#[test]
fn feed_restarts_decay_clock() {
    let mut rig = started();
    rig.walk(1000);
    block_on(rig.service.run_decay(&mut rig.events)).unwrap();
    rig.clock.advance_minutes(60);
    feed(&mut rig);
    assert_eq!(
        block_on(rig.service.run_decay(&mut rig.events)).unwrap(),
        DecayOutcome::TooSoon
    );
    assert_eq!(rig.stats(), (100, 100, 100));
}
