//! The pet record and its pure stat rules.
//!
//! A single logical row per installation.  Every mutation goes through
//! [`PetRecord::with_deltas`] or [`PetRecord::with_hunger`], which clamp each
//! stat to `0..=100`.  The critical-state rule lives in
//! [`PetRecord::is_departed`]; the repository decides what to do about it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::ports::Fields;
use crate::day::Day;

/// Fixed primary key of the singleton pet row.
pub const PET_ID: u32 = 0;

pub const STAT_MIN: u8 = 0;
pub const STAT_MAX: u8 = 100;

/// Upper bound of `feeds_done_today` under any configuration.
pub const FEEDS_MAX: u8 = 10;

/// Maximum stored name length in bytes.
pub const MAX_NAME_LEN: usize = 32;

pub type PetName = heapless::String<MAX_NAME_LEN>;

// Remote document field names (kept compatible with existing documents).
const F_ID: &str = "id";
const F_NAME: &str = "name";
const F_HUNGER: &str = "hungerLevel";
const F_HEALTH: &str = "health";
const F_HAPPINESS: &str = "happiness";
const F_FEEDS: &str = "feedsDoneToday";
const F_LAST_FEED: &str = "lastFeedDate";

/// Clamp an arbitrary intermediate value into the stat domain.
pub fn clamp_stat(value: i32) -> u8 {
    value.clamp(i32::from(STAT_MIN), i32::from(STAT_MAX)) as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetRecord {
    pub id: u32,
    pub name: PetName,
    pub hunger: u8,
    pub health: u8,
    pub happiness: u8,
    pub feeds_done_today: u8,
    pub last_feed_date: Day,
}

/// Coarse vitality state derived from the stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vitality {
    /// Hunger at or above the alert threshold.
    Healthy,
    /// Hunger below the threshold, still alive.
    Hungry,
    /// Health or happiness reached zero.  Terminal until reset.
    Departed,
}

impl PetRecord {
    /// Fresh pet: all stats full, no feeds today.
    pub fn new_default(today: Day) -> Self {
        Self {
            id: PET_ID,
            name: PetName::new(),
            hunger: STAT_MAX,
            health: STAT_MAX,
            happiness: STAT_MAX,
            feeds_done_today: 0,
            last_feed_date: today,
        }
    }

    /// What a departed pet reads as: every stat zero, no name.
    pub fn departed(today: Day) -> Self {
        Self {
            hunger: STAT_MIN,
            health: STAT_MIN,
            happiness: STAT_MIN,
            ..Self::new_default(today)
        }
    }

    /// Add signed deltas to each stat and clamp.
    pub fn with_deltas(&self, hunger: i32, health: i32, happiness: i32) -> Self {
        Self {
            hunger: clamp_stat(i32::from(self.hunger).saturating_add(hunger)),
            health: clamp_stat(i32::from(self.health).saturating_add(health)),
            happiness: clamp_stat(i32::from(self.happiness).saturating_add(happiness)),
            ..self.clone()
        }
    }

    pub fn with_hunger(&self, level: i32) -> Self {
        Self {
            hunger: clamp_stat(level),
            ..self.clone()
        }
    }

    /// Replace the display name, truncating on a char boundary if needed.
    pub fn set_name(&mut self, name: &str) {
        self.name.clear();
        for ch in name.chars() {
            if self.name.push(ch).is_err() {
                break;
            }
        }
    }

    pub fn is_departed(&self) -> bool {
        self.health == 0 || self.happiness == 0
    }

    /// Every field inside its domain: the singleton id, stats in
    /// `0..=100` and at most [`FEEDS_MAX`] feeds.
    pub fn is_well_formed(&self) -> bool {
        self.id == PET_ID
            && [self.hunger, self.health, self.happiness]
                .iter()
                .all(|s| *s <= STAT_MAX)
            && self.feeds_done_today <= FEEDS_MAX
    }

    pub fn vitality(&self, hunger_threshold: u8) -> Vitality {
        if self.is_departed() {
            Vitality::Departed
        } else if self.hunger < hunger_threshold {
            Vitality::Hungry
        } else {
            Vitality::Healthy
        }
    }

    /// Remote document representation.
    pub fn to_fields(&self) -> Fields {
        let mut f = Fields::new();
        f.insert(F_ID.into(), Value::from(self.id));
        f.insert(F_NAME.into(), Value::from(self.name.as_str()));
        f.insert(F_HUNGER.into(), Value::from(self.hunger));
        f.insert(F_HEALTH.into(), Value::from(self.health));
        f.insert(F_HAPPINESS.into(), Value::from(self.happiness));
        f.insert(F_FEEDS.into(), Value::from(self.feeds_done_today));
        f.insert(F_LAST_FEED.into(), Value::from(self.last_feed_date.iso()));
        f
    }

    /// Rebuild a record from a remote document.
    ///
    /// Missing stats default to full, missing or unparseable dates to
    /// `today`, and out-of-range numbers are clamped.  The stored `id` is
    /// ignored: the local row is always the singleton [`PET_ID`].
    pub fn from_fields(fields: &Fields, today: Day) -> Self {
        let number = |key: &str, default: i64, max: u8| -> u8 {
            let raw = fields.get(key).and_then(Value::as_i64).unwrap_or(default);
            raw.clamp(0, i64::from(max)) as u8
        };

        let mut record = Self::new_default(today);
        if let Some(name) = fields.get(F_NAME).and_then(Value::as_str) {
            record.set_name(name);
        }
        record.hunger = number(F_HUNGER, 100, STAT_MAX);
        record.health = number(F_HEALTH, 100, STAT_MAX);
        record.happiness = number(F_HAPPINESS, 100, STAT_MAX);
        record.feeds_done_today = number(F_FEEDS, 0, FEEDS_MAX);
        record.last_feed_date = fields
            .get(F_LAST_FEED)
            .and_then(Value::as_str)
            .and_then(Day::parse_iso)
            .unwrap_or(today);
        record
    }
}

/// The zeroed remote representation written when the pet departs.
pub fn departed_fields() -> Fields {
    let mut f = Fields::new();
    f.insert(F_ID.into(), Value::from(PET_ID));
    f.insert(F_NAME.into(), Value::from(""));
    f.insert(F_HUNGER.into(), Value::from(0));
    f.insert(F_HEALTH.into(), Value::from(0));
    f.insert(F_HAPPINESS.into(), Value::from(0));
    f.insert(F_FEEDS.into(), Value::from(0));
    f.insert(F_LAST_FEED.into(), Value::from(""));
    f
}
