//! Local pet store backed by a [`StoragePort`].
//!
//! The pet row is a postcard blob under the `pet` namespace, keyed by the
//! fixed pet id.  Every committed upsert or delete is published on a
//! [`PetWatch`] so reactive consumers (the UI) always see the latest
//! committed record without polling.
//!
//! A blob that no longer decodes (schema change, torn write), or decodes to
//! a record outside its domain, is deleted and reported as absent:
//! destructive recreation, the remote copy is the durable one.

use log::{debug, warn};

use crate::app::ports::{LocalPetStore, PetReceiver, PetWatch, StorageError, StoragePort};
use crate::pet::PetRecord;

const NAMESPACE: &str = "pet";

pub struct KvPetStore<S> {
    storage: S,
    watch: PetWatch,
}

impl<S: StoragePort> KvPetStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            watch: PetWatch::new(),
        }
    }

    fn key(id: u32) -> String {
        id.to_string()
    }
}

impl<S: StoragePort> LocalPetStore for KvPetStore<S> {
    async fn get(&self, id: u32) -> Result<Option<PetRecord>, StorageError> {
        let key = Self::key(id);
        let bytes = match self.storage.read(NAMESPACE, &key) {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        match postcard::from_bytes::<PetRecord>(&bytes) {
            Ok(record) if record.is_well_formed() => Ok(Some(record)),
            Ok(_) => {
                warn!("PetStore: row {} out of range, recreating store", id);
                self.storage.delete(NAMESPACE, &key)?;
                self.watch.sender().send(None);
                Ok(None)
            }
            Err(_) => {
                warn!("PetStore: row {} undecodable, recreating store", id);
                self.storage.delete(NAMESPACE, &key)?;
                self.watch.sender().send(None);
                Ok(None)
            }
        }
    }

    async fn upsert(&self, record: &PetRecord) -> Result<(), StorageError> {
        let bytes = postcard::to_allocvec(record).map_err(|_| StorageError::IoError)?;
        self.storage.write(NAMESPACE, &Self::key(record.id), &bytes)?;
        debug!(
            "PetStore: upsert hunger={} health={} happiness={} feeds={}",
            record.hunger, record.health, record.happiness, record.feeds_done_today
        );
        self.watch.sender().send(Some(record.clone()));
        Ok(())
    }

    async fn delete(&self, record: &PetRecord) -> Result<(), StorageError> {
        self.storage.delete(NAMESPACE, &Self::key(record.id))?;
        debug!("PetStore: row {} deleted", record.id);
        self.watch.sender().send(None);
        Ok(())
    }

    fn subscribe(&self) -> Option<PetReceiver<'_>> {
        self.watch.receiver()
    }
}
