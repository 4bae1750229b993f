//! Shared test rig for integration tests.
//!
//! Wires a [`PetService`] over the in-memory adapters and keeps a handle to
//! each one so tests can move the clock, walk steps, sign in or out, cut
//! the network and inspect both stores.

use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use futures_lite::future::block_on;

use steppet::PetService;
use steppet::adapters::clock::ManualClock;
use steppet::adapters::identity::StaticIdentity;
use steppet::adapters::kv::MemoryStorage;
use steppet::adapters::local_store::KvPetStore;
use steppet::adapters::remote::MemoryRemoteStore;
use steppet::adapters::sensor::CounterSensor;
use steppet::app::events::PetEvent;
use steppet::app::ports::{StepEvent, StepSensor};
use steppet::config::EngineConfig;
use steppet::day::Day;

pub type Service = PetService<
    KvPetStore<Rc<MemoryStorage>>,
    Rc<MemoryRemoteStore>,
    Rc<StaticIdentity>,
    Rc<ManualClock>,
    Rc<MemoryStorage>,
    Rc<CounterSensor>,
>;

pub const UID: &str = "user-1";
pub const PET_DOC: &str = "users/user-1/petState/latest";

pub fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn day(d: u32) -> Day {
    Day::from_ymd(2024, 1, d).unwrap()
}

pub fn steps_doc(d: u32) -> String {
    format!("users/{}/steps/{}", UID, day(d).iso())
}

pub struct Rig {
    pub service: Service,
    pub storage: Rc<MemoryStorage>,
    pub remote: Rc<MemoryRemoteStore>,
    pub identity: Rc<StaticIdentity>,
    pub clock: Rc<ManualClock>,
    pub sensor: Rc<CounterSensor>,
    pub events: Vec<PetEvent>,
}

#[allow(dead_code)]
impl Rig {
    /// Signed in, hardware counter at 50 000, 2024-01-01 09:00.
    pub fn signed_in() -> Self {
        Self::build(StaticIdentity::signed_in(UID), EngineConfig::default())
    }

    pub fn anonymous() -> Self {
        Self::build(StaticIdentity::anonymous(), EngineConfig::default())
    }

    pub fn build(identity: StaticIdentity, config: EngineConfig) -> Self {
        let storage = Rc::new(MemoryStorage::new());
        let remote = Rc::new(MemoryRemoteStore::new());
        let identity = Rc::new(identity);
        let clock = Rc::new(ManualClock::new(at(1, 9, 0)));
        let sensor = Rc::new(CounterSensor::new(50_000));
        let service = PetService::new(
            config,
            KvPetStore::new(storage.clone()),
            remote.clone(),
            identity.clone(),
            clock.clone(),
            storage.clone(),
            sensor.clone(),
        );
        Self {
            service,
            storage,
            remote,
            identity,
            clock,
            sensor,
            events: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        block_on(self.service.start(&mut self.events)).unwrap();
    }

    /// Walk `n` steps and deliver the new counter reading.
    pub fn walk(&mut self, n: u64) {
        self.sensor.walk(n);
        let total = self.sensor.read_total().unwrap();
        block_on(
            self.service
                .on_step_event(StepEvent::CounterTotal(total), &mut self.events),
        )
        .unwrap();
    }

    /// Set all three stats to `v` (from a full pet).
    pub fn set_stats(&mut self, v: i32) {
        let d = v - 100;
        block_on(self.service.repository().apply_stat_delta(d, d, d)).unwrap();
    }

    pub fn stats(&self) -> (u8, u8, u8) {
        let p = block_on(self.service.pet()).unwrap();
        (p.hunger, p.health, p.happiness)
    }

    pub fn take_events(&mut self) -> Vec<PetEvent> {
        core::mem::take(&mut self.events)
    }

    pub fn count(&self, pred: impl Fn(&PetEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}
