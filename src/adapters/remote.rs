//! In-memory remote document store.
//!
//! Behaves like the hosted per-user document database: documents are field
//! maps addressed by slash-separated paths, `set` replaces, `delete` is
//! idempotent.  Connectivity can be toggled to exercise the best-effort
//! mirror paths, and every access yields once to the executor so
//! concurrent engine operations genuinely interleave at the await points a
//! network call would introduce.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use futures_lite::future::yield_now;
use log::debug;

use crate::app::ports::{Fields, RemoteError, RemoteStore};

#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    docs: RefCell<BTreeMap<String, Fields>>,
    offline: Cell<bool>,
    writes: Cell<u32>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) connectivity.
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Successful `set`/`delete` calls so far.
    pub fn write_count(&self) -> u32 {
        self.writes.get()
    }

    /// Direct read for assertions, bypassing connectivity.
    pub fn peek(&self, path: &str) -> Option<Fields> {
        self.docs.borrow().get(path).cloned()
    }

    /// Direct write for test setup, bypassing connectivity.
    pub fn seed(&self, path: &str, fields: Fields) {
        self.docs.borrow_mut().insert(path.to_string(), fields);
    }

    async fn reachable(&self) -> Result<(), RemoteError> {
        yield_now().await;
        if self.offline.get() {
            Err(RemoteError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn get_document(&self, path: &str) -> Result<Option<Fields>, RemoteError> {
        self.reachable().await?;
        Ok(self.docs.borrow().get(path).cloned())
    }

    async fn set_document(&self, path: &str, fields: Fields) -> Result<(), RemoteError> {
        self.reachable().await?;
        debug!("Remote: set {}", path);
        self.docs.borrow_mut().insert(path.to_string(), fields);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    async fn delete_document(&self, path: &str) -> Result<(), RemoteError> {
        self.reachable().await?;
        debug!("Remote: delete {}", path);
        self.docs.borrow_mut().remove(path);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    async fn list_documents(
        &self,
        collection: &str,
    ) -> Result<Vec<(String, Fields)>, RemoteError> {
        self.reachable().await?;
        let prefix = format!("{}/", collection.trim_end_matches('/'));
        Ok(self
            .docs
            .borrow()
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter_map(|(path, fields)| {
                let id = &path[prefix.len()..];
                (!id.is_empty() && !id.contains('/')).then(|| (id.to_string(), fields.clone()))
            })
            .collect())
    }
}
