//! Port traits: the hexagonal boundary between engine logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PetService (domain)
//! ```
//!
//! Driven adapters (stores, identity, clock, step sensor, event sinks)
//! implement these traits.  The [`PetService`](super::service::PetService)
//! and its components consume them via generics, so the engine never touches
//! a platform API directly.
//!
//! Store access that may suspend (local pet store, remote documents) is
//! `async`; small preference reads are synchronous, mirroring how a
//! key-value preference file behaves on a phone.

use std::rc::Rc;

use chrono::NaiveDateTime;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::watch::{Receiver, Watch};

use crate::config::EngineConfig;
use crate::day::Day;
use crate::pet::PetRecord;

/// Field map of a remote document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// How many reactive consumers may observe the pet record at once.
pub const MAX_PET_SUBSCRIBERS: usize = 4;

/// Latest committed pet record (`None` = no pet: departed or reset).
pub type PetWatch = Watch<NoopRawMutex, Option<PetRecord>, MAX_PET_SUBSCRIBERS>;
pub type PetReceiver<'a> = Receiver<'a, NoopRawMutex, Option<PetRecord>, MAX_PET_SUBSCRIBERS>;

// ───────────────────────────────────────────────────────────────
// Identity port
// ───────────────────────────────────────────────────────────────

/// Opaque identity provider.  `None` means "operate locally only".
pub trait IdentityPort {
    fn current_user_id(&self) -> Option<String>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Local wall clock.
pub trait Clock {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Current local calendar day.
    fn today(&self) -> Day {
        Day::from(self.now().date())
    }
}

// ───────────────────────────────────────────────────────────────
// Step sensor port (driven adapter: hardware → engine)
// ───────────────────────────────────────────────────────────────

/// Cumulative hardware step counter.
///
/// Returns a monotonically non-decreasing total since an arbitrary epoch
/// (typically the last device boot), or `None` when no counter is present.
pub trait StepSensor {
    fn read_total(&self) -> Option<u64>;
}

/// Discrete input from a step source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// One detected step.
    Step,
    /// A fresh reading of the cumulative hardware counter.
    CounterTotal(u64),
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: engine → logging / notifications)
// ───────────────────────────────────────────────────────────────

/// The engine emits structured [`PetEvent`](super::events::PetEvent)s
/// through this port.  Adapters decide where they go (log, notification
/// tray, UI toast).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::PetEvent);
}

/// Fire-and-forget user notification.  No delivery guarantee.
pub trait Notifier {
    fn notify(&mut self, title: &str, body: &str);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: engine ↔ on-device key-value store)
// ───────────────────────────────────────────────────────────────

/// Durable key-value storage for preferences, config and the pet blob.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - A single `write` MUST be atomic: readers see the old or the new value,
///   never a mix.
pub trait StoragePort {
    /// Read a value.  [`StorageError::NotFound`] if the key is absent.
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a value atomically.
    fn write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Local pet store
// ───────────────────────────────────────────────────────────────

/// Durable single-row pet table.
pub trait LocalPetStore {
    async fn get(&self, id: u32) -> Result<Option<PetRecord>, StorageError>;

    async fn upsert(&self, record: &PetRecord) -> Result<(), StorageError>;

    async fn delete(&self, record: &PetRecord) -> Result<(), StorageError>;

    /// Receiver that yields the record after every committed change.
    /// `None` when all subscriber slots are taken.
    fn subscribe(&self) -> Option<PetReceiver<'_>>;
}

// ───────────────────────────────────────────────────────────────
// Remote document store
// ───────────────────────────────────────────────────────────────

/// Opaque per-user document store addressed by slash-separated paths
/// (`users/{uid}/petState/latest`, `users/{uid}/steps/{date}`).
pub trait RemoteStore {
    async fn get_document(&self, path: &str) -> Result<Option<Fields>, RemoteError>;

    /// Replace the document at `path`.
    async fn set_document(&self, path: &str, fields: Fields) -> Result<(), RemoteError>;

    async fn delete_document(&self, path: &str) -> Result<(), RemoteError>;

    /// All direct child documents of `collection` as `(document id, fields)`.
    async fn list_documents(&self, collection: &str)
    -> Result<Vec<(String, Fields)>, RemoteError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads and persists engine configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Returns [`EngineConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<EngineConfig, ConfigError>;

    fn save(&self, config: &EngineConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from job execution)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a schedule fires.
///
/// The scheduler itself knows nothing about decay or summaries; the
/// service implements a delegate that records which jobs are due.
pub trait SchedulerDelegate {
    fn on_schedule_fired(&mut self, label: &str, kind: ScheduleFiredKind);
}

/// Discriminant passed to [`SchedulerDelegate::on_schedule_fired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleFiredKind {
    /// A recurring periodic schedule fired.
    Periodic,
    /// A once-per-day time-of-day schedule fired.
    Daily,
    /// A one-shot schedule fired (auto-disables after).
    OneShot,
}

// ───────────────────────────────────────────────────────────────
// Shared-handle forwarding
// ───────────────────────────────────────────────────────────────
//
// Components each hold their own handle to the same adapter; an `Rc`
// (or a plain reference) around any adapter is itself a valid adapter.

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn emit(&mut self, event: &super::events::PetEvent) {
        (**self).emit(event);
    }
}

/// Fan out to two sinks (e.g. log and notifications).
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::PetEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

/// Collects events in order (UI batching, tests).
impl EventSink for Vec<super::events::PetEvent> {
    fn emit(&mut self, event: &super::events::PetEvent) {
        self.push(event.clone());
    }
}

impl<T: IdentityPort + ?Sized> IdentityPort for Rc<T> {
    fn current_user_id(&self) -> Option<String> {
        (**self).current_user_id()
    }
}

impl<T: Clock + ?Sized> Clock for Rc<T> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

impl<T: StepSensor + ?Sized> StepSensor for Rc<T> {
    fn read_total(&self) -> Option<u64> {
        (**self).read_total()
    }
}

impl<T: StoragePort + ?Sized> StoragePort for Rc<T> {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        (**self).read(namespace, key)
    }

    fn write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        (**self).write(namespace, key, data)
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        (**self).delete(namespace, key)
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        (**self).exists(namespace, key)
    }
}

impl<T: StoragePort + ?Sized> StoragePort for &T {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        (**self).read(namespace, key)
    }

    fn write(&self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        (**self).write(namespace, key, data)
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        (**self).delete(namespace, key)
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        (**self).exists(namespace, key)
    }
}

impl<T: RemoteStore> RemoteStore for Rc<T> {
    async fn get_document(&self, path: &str) -> Result<Option<Fields>, RemoteError> {
        (**self).get_document(path).await
    }

    async fn set_document(&self, path: &str, fields: Fields) -> Result<(), RemoteError> {
        (**self).set_document(path, fields).await
    }

    async fn delete_document(&self, path: &str) -> Result<(), RemoteError> {
        (**self).delete_document(path).await
    }

    async fn list_documents(
        &self,
        collection: &str,
    ) -> Result<Vec<(String, Fields)>, RemoteError> {
        (**self).list_documents(collection).await
    }
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first run).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] and [`LocalPetStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// The stored bytes could not be decoded.
    Corrupted,
}

/// Errors from [`RemoteStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteError {
    /// Network down or backend unreachable.
    Unavailable,
    /// The backend rejected the caller.
    PermissionDenied,
    /// A document could not be encoded or decoded.
    Malformed,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "stored value corrupted"),
        }
    }
}

impl core::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "remote unavailable"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Malformed => write!(f, "malformed document"),
        }
    }
}
