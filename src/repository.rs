//! Vitality repository: the single accessor and mutator of the pet record.
//!
//! ```text
//!   caller ──▶ lock ──▶ read ──▶ modify ──▶ clamp ──▶ upsert ──▶ critical? ──▶ mirror
//!                                                                   │
//!                                                                   └─▶ delete local,
//!                                                                       zero remote
//! ```
//!
//! Every read-modify-write runs under one async mutex, so a feed and a
//! decay racing on the same record both land; neither delta is lost.  The
//! remote mirror runs while the lock is still held, so the remote copy
//! follows the local commit order.  Mirror failures never fail a mutation.
//!
//! Departure is terminal: once health or happiness hits zero the local row
//! is deleted, the remote document is zeroed and a marker is persisted.
//! Until [`VitalityRepository::reset`] (or a live remote copy arriving via
//! [`VitalityRepository::sync_from_remote`]) every read yields the zeroed
//! record and every mutation is refused.

use chrono::NaiveDateTime;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use log::{debug, info, warn};

use crate::app::events::PetEvent;
use crate::app::ports::{
    Clock, EventSink, IdentityPort, LocalPetStore, PetReceiver, RemoteStore, StoragePort,
};
use crate::day::Day;
use crate::error::Result;
use crate::feeding::{FeedOutcome, FeedThrottle};
use crate::mirror::{Fetch, Mirror, MirrorOutcome};
use crate::pet::{PET_ID, PetRecord};
use crate::prefs::Prefs;

/// Result of a committed (or refused) mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Committed; the pet is alive.
    Alive(PetRecord),
    /// This mutation killed the pet.
    Departed,
    /// The pet had already departed; nothing changed.
    AlreadyDeparted,
}

impl Mutation {
    /// Report the mutation on `sink` (nothing for a refused one).
    pub fn emit(&self, sink: &mut impl EventSink) {
        match self {
            Self::Alive(record) => sink.emit(&PetEvent::StatsChanged(record.clone())),
            Self::Departed => sink.emit(&PetEvent::Departed),
            Self::AlreadyDeparted => {}
        }
    }

    pub fn record(&self) -> Option<&PetRecord> {
        match self {
            Self::Alive(record) => Some(record),
            Self::Departed | Self::AlreadyDeparted => None,
        }
    }
}

/// Result of [`VitalityRepository::sync_from_remote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote record replaced the local one.
    Pulled(PetRecord),
    /// No remote record existed; a default was created on both sides.
    Seeded(PetRecord),
    /// The remote record is the departed shape.
    Departed,
    /// Not signed in; local state untouched.
    SkippedNoAuth,
    /// Remote unreachable; local state untouched.
    Failed,
}

pub struct VitalityRepository<L, R, I, C, S> {
    local: L,
    mirror: Mirror<R, I>,
    prefs: Prefs<S>,
    clock: C,
    write_lock: Mutex<NoopRawMutex, ()>,
}

impl<L, R, I, C, S> VitalityRepository<L, R, I, C, S>
where
    L: LocalPetStore,
    R: RemoteStore,
    I: IdentityPort,
    C: Clock,
    S: StoragePort,
{
    pub fn new(local: L, mirror: Mirror<R, I>, prefs: Prefs<S>, clock: C) -> Self {
        Self {
            local,
            mirror,
            prefs,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn today(&self) -> Day {
        self.clock.today()
    }

    /// Receiver that yields the record after every committed change
    /// (`None` after departure or reset).
    pub fn subscribe(&self) -> Option<PetReceiver<'_>> {
        self.local.subscribe()
    }

    pub fn is_departed(&self) -> bool {
        self.prefs.is_departed()
    }

    // ── Reads ─────────────────────────────────────────────────

    /// The current record, creating (and persisting, and mirroring) a fresh
    /// default on first access.  A departed pet reads as all zeros.
    pub async fn current_or_default(&self) -> Result<PetRecord> {
        let _guard = self.write_lock.lock().await;
        self.load_or_create().await
    }

    // ── Mutations ─────────────────────────────────────────────

    pub async fn apply_stat_delta(
        &self,
        hunger: i32,
        health: i32,
        happiness: i32,
    ) -> Result<Mutation> {
        self.update(|r| r.with_deltas(hunger, health, happiness))
            .await
    }

    pub async fn set_hunger(&self, level: i32) -> Result<Mutation> {
        self.update(|r| r.with_hunger(level)).await
    }

    pub async fn rename(&self, name: &str) -> Result<Mutation> {
        self.update(|r| {
            let mut renamed = r.clone();
            renamed.set_name(name);
            renamed
        })
        .await
    }

    /// Serialized read-modify-write.  `f` sees the committed record and
    /// returns the next one; clamping is the job of the `PetRecord`
    /// builders `f` uses.
    pub async fn update(&self, f: impl FnOnce(&PetRecord) -> PetRecord) -> Result<Mutation> {
        let _guard = self.write_lock.lock().await;
        if self.prefs.is_departed() {
            debug!("VitalityRepo: mutation refused, pet departed");
            return Ok(Mutation::AlreadyDeparted);
        }
        let current = self.load_or_create().await?;
        self.commit(f(&current)).await
    }

    /// Apply one feed if today's steps allow it.  A successful feed also
    /// restarts the decay clock so the next decay run does not count time
    /// from before the feed.
    pub async fn feed_if_allowed(
        &self,
        steps_today: u64,
        throttle: &FeedThrottle,
    ) -> Result<FeedOutcome> {
        let _guard = self.write_lock.lock().await;
        if self.prefs.is_departed() {
            return Ok(FeedOutcome::Departed);
        }
        let current = self.load_or_create().await?;
        let today = self.clock.today();
        if !throttle.can_feed(&current, steps_today, today) {
            let next_threshold = throttle.next_feed_threshold(&current, today);
            debug!(
                "VitalityRepo: feed denied at {} steps (next at {:?})",
                steps_today, next_threshold
            );
            return Ok(FeedOutcome::Denied { next_threshold });
        }

        match self.commit(throttle.apply(&current, today)).await? {
            Mutation::Alive(fed) => {
                self.prefs.set_last_decay_at(self.clock.now())?;
                info!(
                    "VitalityRepo: fed ({} today), hunger={}",
                    fed.feeds_done_today, fed.hunger
                );
                Ok(FeedOutcome::Fed(fed))
            }
            Mutation::Departed | Mutation::AlreadyDeparted => Ok(FeedOutcome::Departed),
        }
    }

    /// Departed handling.  Returns `true` if `record` is departed, after
    /// deleting the local row, zeroing the remote document and persisting
    /// the departure marker.
    pub async fn check_critical(&self, record: &PetRecord) -> Result<bool> {
        if !record.is_departed() {
            return Ok(false);
        }
        warn!(
            "VitalityRepo: pet departed (health={}, happiness={})",
            record.health, record.happiness
        );
        self.prefs.set_departed(true)?;
        self.local.delete(record).await?;
        self.mirror.push_departed().await;
        Ok(true)
    }

    // ── Remote sync ───────────────────────────────────────────

    /// Make the local store a copy of the remote record (after login).
    /// The remote record replaces the local one wholesale; no field merge.
    pub async fn sync_from_remote(&self) -> Result<SyncOutcome> {
        let _guard = self.write_lock.lock().await;
        let today = self.clock.today();
        match self.mirror.fetch_pet().await {
            Fetch::SkippedNoAuth => Ok(SyncOutcome::SkippedNoAuth),
            Fetch::Failed(_) => Ok(SyncOutcome::Failed),
            Fetch::Fetched(Some(fields)) => {
                let remote = PetRecord::from_fields(&fields, today);
                if remote.is_departed() {
                    info!("VitalityRepo: remote pet has departed");
                    if let Some(local) = self.local.get(PET_ID).await? {
                        self.local.delete(&local).await?;
                    }
                    self.prefs.set_departed(true)?;
                    return Ok(SyncOutcome::Departed);
                }
                self.prefs.set_departed(false)?;
                self.local.upsert(&remote).await?;
                info!("VitalityRepo: pulled remote record");
                Ok(SyncOutcome::Pulled(remote))
            }
            Fetch::Fetched(None) => {
                let fresh = PetRecord::new_default(today);
                self.mirror.push_pet(&fresh).await;
                self.prefs.set_departed(false)?;
                self.local.upsert(&fresh).await?;
                info!("VitalityRepo: no remote record, seeded default");
                Ok(SyncOutcome::Seeded(fresh))
            }
        }
    }

    /// Wipe the pet: local row, every engine preference, and (best effort)
    /// the remote pet and step documents.  The next access creates a fresh
    /// default.
    pub async fn reset(&self) -> Result<MirrorOutcome> {
        let _guard = self.write_lock.lock().await;
        if let Some(local) = self.local.get(PET_ID).await? {
            self.local.delete(&local).await?;
        }
        self.prefs.clear_all()?;
        let remote = self.mirror.delete_all().await;
        info!("VitalityRepo: all data reset (remote: {:?})", remote);
        Ok(remote)
    }

    // ── Internal (caller holds the write lock) ────────────────

    async fn load_or_create(&self) -> Result<PetRecord> {
        if self.prefs.is_departed() {
            return Ok(PetRecord::departed(self.clock.today()));
        }
        if let Some(record) = self.local.get(PET_ID).await? {
            return Ok(record);
        }
        let fresh = PetRecord::new_default(self.clock.today());
        self.local.upsert(&fresh).await?;
        info!("VitalityRepo: created default pet");
        self.mirror.push_pet(&fresh).await;
        Ok(fresh)
    }

    async fn commit(&self, record: PetRecord) -> Result<Mutation> {
        self.local.upsert(&record).await?;
        if self.check_critical(&record).await? {
            return Ok(Mutation::Departed);
        }
        self.mirror.push_pet(&record).await;
        Ok(Mutation::Alive(record))
    }
}
