//! Fuzz target: remote document decoding
//!
//! Parses arbitrary bytes as JSON and, when they form an object, decodes
//! it as a pet document and as a step document.  Verifies:
//! - No panics on arbitrary field types or values
//! - Every decoded record is well formed: singleton id, stats in 0..=100,
//!   feeds within the daily cap
//! - A decoded pet re-encodes to a document that decodes to itself
//!
//! cargo fuzz run fuzz_remote_fields

#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use steppet::day::Day;
use steppet::mirror::StepRecord;
use steppet::pet::PetRecord;

fuzz_target!(|data: &[u8]| {
    let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let today = Day::from_ymd(2024, 1, 1).unwrap();

    let pet = PetRecord::from_fields(&fields, today);
    assert!(pet.is_well_formed());
    assert_eq!(PetRecord::from_fields(&pet.to_fields(), today), pet);

    let steps = StepRecord::from_fields(&fields);
    assert_eq!(StepRecord::from_fields(&steps.to_fields()), steps);
});
