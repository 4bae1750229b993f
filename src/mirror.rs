//! Best-effort replication to the remote per-user document store.
//!
//! Every remote operation in the engine goes through [`Mirror`], which
//! resolves the signed-in user, builds the document path and turns the
//! result into an explicit outcome.  Nothing here ever returns an error to
//! the caller: with no user the call is skipped, a failure is logged and
//! reported as [`MirrorOutcome::Failed`].  There is no retry queue; the
//! next mutation simply mirrors again.
//!
//! Layout:
//!
//! ```text
//! users/{uid}/petState/latest      pet record
//! users/{uid}/steps/{YYYY-MM-DD}   { count, android_total }
//! ```

use log::{debug, warn};
use serde_json::Value;

use crate::app::ports::{Fields, IdentityPort, RemoteError, RemoteStore};
use crate::day::Day;
use crate::pet::{PetRecord, departed_fields};

/// Result of a mirror write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    Succeeded,
    /// No signed-in user; nothing was sent.
    SkippedNoAuth,
    /// The remote store rejected or could not be reached.  Already logged.
    Failed,
}

impl MirrorOutcome {
    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }
}

/// Result of a mirror read.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Fetched(T),
    SkippedNoAuth,
    Failed(RemoteError),
}

impl<T> Fetch<T> {
    /// The fetched value, if any.
    pub fn fetched(self) -> Option<T> {
        match self {
            Self::Fetched(v) => Some(v),
            Self::SkippedNoAuth | Self::Failed(_) => None,
        }
    }
}

/// Remote per-day step document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepRecord {
    pub count: u64,
    /// Raw hardware counter at the last sync.
    pub android_total: u64,
}

impl StepRecord {
    pub fn to_fields(self) -> Fields {
        let mut f = Fields::new();
        f.insert("count".into(), Value::from(self.count));
        f.insert("android_total".into(), Value::from(self.android_total));
        f
    }

    /// Missing or negative numbers read as 0.
    pub fn from_fields(fields: &Fields) -> Self {
        let num = |key: &str| fields.get(key).and_then(Value::as_u64).unwrap_or(0);
        Self {
            count: num("count"),
            android_total: num("android_total"),
        }
    }
}

pub fn pet_path(uid: &str) -> String {
    format!("users/{}/petState/latest", uid)
}

pub fn steps_collection(uid: &str) -> String {
    format!("users/{}/steps", uid)
}

pub fn steps_path(uid: &str, day: Day) -> String {
    format!("users/{}/steps/{}", uid, day.iso())
}

#[derive(Debug, Clone)]
pub struct Mirror<R, I> {
    remote: R,
    identity: I,
}

impl<R: RemoteStore, I: IdentityPort> Mirror<R, I> {
    pub fn new(remote: R, identity: I) -> Self {
        Self { remote, identity }
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.current_user_id().is_some()
    }

    // ── Pet document ──────────────────────────────────────────

    pub async fn push_pet(&self, record: &PetRecord) -> MirrorOutcome {
        self.write("pet", pet_path, record.to_fields()).await
    }

    /// Overwrite the pet document with the zeroed "pet has left" shape.
    pub async fn push_departed(&self) -> MirrorOutcome {
        self.write("departed pet", pet_path, departed_fields()).await
    }

    pub async fn fetch_pet(&self) -> Fetch<Option<Fields>> {
        let Some(uid) = self.identity.current_user_id() else {
            return Fetch::SkippedNoAuth;
        };
        match self.remote.get_document(&pet_path(&uid)).await {
            Ok(doc) => Fetch::Fetched(doc),
            Err(e) => {
                warn!("Mirror: fetch pet failed: {}", e);
                Fetch::Failed(e)
            }
        }
    }

    // ── Step documents ────────────────────────────────────────

    pub async fn push_steps(&self, day: Day, record: StepRecord) -> MirrorOutcome {
        self.write("steps", |uid| steps_path(uid, day), record.to_fields())
            .await
    }

    pub async fn fetch_steps(&self, day: Day) -> Fetch<Option<StepRecord>> {
        let Some(uid) = self.identity.current_user_id() else {
            return Fetch::SkippedNoAuth;
        };
        match self.remote.get_document(&steps_path(&uid, day)).await {
            Ok(doc) => Fetch::Fetched(doc.as_ref().map(StepRecord::from_fields)),
            Err(e) => {
                warn!("Mirror: fetch steps for {} failed: {}", day, e);
                Fetch::Failed(e)
            }
        }
    }

    /// Every stored step day, oldest first.  Documents whose id is not an
    /// ISO date are ignored.
    pub async fn list_steps(&self) -> Fetch<Vec<(Day, StepRecord)>> {
        let Some(uid) = self.identity.current_user_id() else {
            return Fetch::SkippedNoAuth;
        };
        match self.remote.list_documents(&steps_collection(&uid)).await {
            Ok(docs) => {
                let mut days: Vec<_> = docs
                    .iter()
                    .filter_map(|(id, f)| {
                        Day::parse_iso(id).map(|d| (d, StepRecord::from_fields(f)))
                    })
                    .collect();
                days.sort_by_key(|(d, _)| *d);
                Fetch::Fetched(days)
            }
            Err(e) => {
                warn!("Mirror: list steps failed: {}", e);
                Fetch::Failed(e)
            }
        }
    }

    // ── Reset ─────────────────────────────────────────────────

    /// Delete the pet document and every step document of the user.
    pub async fn delete_all(&self) -> MirrorOutcome {
        let Some(uid) = self.identity.current_user_id() else {
            return MirrorOutcome::SkippedNoAuth;
        };
        let result: Result<(), RemoteError> = async {
            self.remote.delete_document(&pet_path(&uid)).await?;
            let collection = steps_collection(&uid);
            for (id, _) in self.remote.list_documents(&collection).await? {
                self.remote
                    .delete_document(&format!("{}/{}", collection, id))
                    .await?;
            }
            Ok(())
        }
        .await;
        match result {
            Ok(()) => {
                debug!("Mirror: remote data deleted");
                MirrorOutcome::Succeeded
            }
            Err(e) => {
                warn!("Mirror: remote delete failed: {}", e);
                MirrorOutcome::Failed
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    async fn write(
        &self,
        what: &str,
        path: impl FnOnce(&str) -> String,
        fields: Fields,
    ) -> MirrorOutcome {
        let Some(uid) = self.identity.current_user_id() else {
            debug!("Mirror: {} skipped, not signed in", what);
            return MirrorOutcome::SkippedNoAuth;
        };
        match self.remote.set_document(&path(&uid), fields).await {
            Ok(()) => MirrorOutcome::Succeeded,
            Err(e) => {
                warn!("Mirror: {} write failed: {}", what, e);
                MirrorOutcome::Failed
            }
        }
    }
}
