//! Small durable engine values kept next to the pet record.
//!
//! Decay clock, last observed hunger, once-per-day markers, the step
//! baseline and the departure marker.  Each value is a postcard blob under
//! the `prefs` namespace of the [`StoragePort`].  A value that fails to
//! decode, or decodes out of range, is deleted and read as absent
//! (destructive recreation; the engine re-initialises it).

use chrono::{DateTime, NaiveDateTime};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort};
use crate::day::Day;
use crate::pet::STAT_MAX;

const NAMESPACE: &str = "prefs";

const KEY_DECAY_AT: &str = "decay_at";
const KEY_OBSERVED_HUNGER: &str = "obs_hunger";
const KEY_ALERT_DAY: &str = "alert_day";
const KEY_BASELINE: &str = "baseline";
const KEY_REWARD_DAY: &str = "reward_day";
const KEY_DEPARTED: &str = "departed";

const ALL_KEYS: [&str; 6] = [
    KEY_DECAY_AT,
    KEY_OBSERVED_HUNGER,
    KEY_ALERT_DAY,
    KEY_BASELINE,
    KEY_REWARD_DAY,
    KEY_DEPARTED,
];

/// Hardware counter reading captured at the first observation of a day.
///
/// `carried` holds steps counted earlier the same day before the counter
/// restarted (device reboot), so today's total is
/// `carried + max(0, raw_now - raw)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub day: Day,
    pub raw: u64,
    pub carried: u64,
}

impl Baseline {
    pub fn new(day: Day, raw: u64) -> Self {
        Self {
            day,
            raw,
            carried: 0,
        }
    }

    /// Steps since the baseline for a fresh counter reading.
    pub fn delta(&self, raw_now: u64) -> u64 {
        self.carried.saturating_add(raw_now.saturating_sub(self.raw))
    }
}

#[derive(Debug, Clone)]
pub struct Prefs<S> {
    storage: S,
}

impl<S: StoragePort> Prefs<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    // ── Decay clock ───────────────────────────────────────────

    pub fn last_decay_at(&self) -> Option<NaiveDateTime> {
        let millis: i64 = self.get(KEY_DECAY_AT)?;
        DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
    }

    pub fn set_last_decay_at(&self, at: NaiveDateTime) -> Result<(), StorageError> {
        self.put(KEY_DECAY_AT, &at.and_utc().timestamp_millis())
    }

    pub fn last_observed_hunger(&self) -> Option<u8> {
        self.get_checked(KEY_OBSERVED_HUNGER, |h: &u8| *h <= STAT_MAX)
    }

    pub fn set_last_observed_hunger(&self, hunger: u8) -> Result<(), StorageError> {
        self.put(KEY_OBSERVED_HUNGER, &hunger)
    }

    // ── Once-per-day markers ──────────────────────────────────

    pub fn hunger_alert_day(&self) -> Option<Day> {
        self.get(KEY_ALERT_DAY)
    }

    pub fn set_hunger_alert_day(&self, day: Day) -> Result<(), StorageError> {
        self.put(KEY_ALERT_DAY, &day)
    }

    pub fn reward_day(&self) -> Option<Day> {
        self.get(KEY_REWARD_DAY)
    }

    pub fn set_reward_day(&self, day: Day) -> Result<(), StorageError> {
        self.put(KEY_REWARD_DAY, &day)
    }

    // ── Step baseline ─────────────────────────────────────────

    pub fn step_baseline(&self) -> Option<Baseline> {
        self.get(KEY_BASELINE)
    }

    pub fn set_step_baseline(&self, baseline: Baseline) -> Result<(), StorageError> {
        self.put(KEY_BASELINE, &baseline)
    }

    // ── Departure marker ──────────────────────────────────────

    /// Set once the pet departs; only a full reset (or a live remote
    /// copy) clears it.
    pub fn is_departed(&self) -> bool {
        self.get(KEY_DEPARTED).unwrap_or(false)
    }

    pub fn set_departed(&self, departed: bool) -> Result<(), StorageError> {
        if departed {
            self.put(KEY_DEPARTED, &true)
        } else {
            self.storage.delete(NAMESPACE, KEY_DEPARTED)
        }
    }

    /// Forget every engine preference (full data reset).
    pub fn clear_all(&self) -> Result<(), StorageError> {
        for key in ALL_KEYS {
            self.storage.delete(NAMESPACE, key)?;
        }
        Ok(())
    }

    // ── Internal ──────────────────────────────────────────────

    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.storage.read(NAMESPACE, key) {
            Ok(bytes) => match postcard::from_bytes(&bytes) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Prefs: '{}' undecodable, discarding", key);
                    if let Err(e) = self.storage.delete(NAMESPACE, key) {
                        warn!("Prefs: failed to discard '{}': {}", key, e);
                    }
                    None
                }
            },
            Err(StorageError::NotFound) => None,
            Err(e) => {
                warn!("Prefs: read '{}' failed: {}", key, e);
                None
            }
        }
    }

    /// Like `get`, but a decoded value failing `valid` is discarded too.
    fn get_checked<T: DeserializeOwned>(
        &self,
        key: &str,
        valid: impl Fn(&T) -> bool,
    ) -> Option<T> {
        let value = self.get(key)?;
        if valid(&value) {
            return Some(value);
        }
        warn!("Prefs: '{}' out of range, discarding", key);
        if let Err(e) = self.storage.delete(NAMESPACE, key) {
            warn!("Prefs: failed to discard '{}': {}", key, e);
        }
        None
    }

    fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes = postcard::to_allocvec(value).map_err(|_| StorageError::IoError)?;
        self.storage.write(NAMESPACE, key, &bytes)
    }
}
