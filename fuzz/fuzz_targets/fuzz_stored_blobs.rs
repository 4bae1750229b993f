//! Fuzz target: corrupted local storage
//!
//! Plants arbitrary bytes under the pet row and every preference key,
//! then starts the engine on top of them.  Verifies:
//! - No panics while decoding stored blobs
//! - The engine always ends up with a readable pet record
//! - The record read back is well formed whatever was stored
//!
//! cargo fuzz run fuzz_stored_blobs

#![no_main]

use std::rc::Rc;

use futures_lite::future::block_on;
use libfuzzer_sys::fuzz_target;
use steppet::PetService;
use steppet::adapters::clock::ManualClock;
use steppet::adapters::identity::StaticIdentity;
use steppet::adapters::kv::MemoryStorage;
use steppet::adapters::local_store::KvPetStore;
use steppet::adapters::remote::MemoryRemoteStore;
use steppet::adapters::sensor::CounterSensor;
use steppet::app::ports::StoragePort;
use steppet::config::EngineConfig;

const PREF_KEYS: [&str; 6] = [
    "decay_at",
    "obs_hunger",
    "alert_day",
    "baseline",
    "reward_day",
    "departed",
];

fuzz_target!(|data: &[u8]| {
    let storage = Rc::new(MemoryStorage::new());
    let _ = storage.write("pet", "0", data);
    for key in PREF_KEYS {
        let _ = storage.write("prefs", key, data);
    }

    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap();
    let clock = Rc::new(ManualClock::new(start));
    let service = PetService::new(
        EngineConfig::default(),
        KvPetStore::new(storage.clone()),
        Rc::new(MemoryRemoteStore::new()),
        Rc::new(StaticIdentity::anonymous()),
        clock.clone(),
        storage,
        Rc::new(CounterSensor::new(1000)),
    );

    let mut events = Vec::new();
    block_on(async {
        service.start(&mut events).await.unwrap();
        clock.advance_minutes(90);
        service.run_decay(&mut events).await.unwrap();
        let pet = service.pet().await.unwrap();
        assert!(pet.is_well_formed());
    });
});
