//! Unified error type for the StepPet engine.
//!
//! Each port has its own typed error enum (see [`crate::app::ports`]).
//! Everything the engine itself can fail with funnels into [`Error`] so the
//! job runners and the service have one type to match on.  All variants are
//! `Copy` so they can be logged and returned without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, RemoteError, StorageError};

// ---------------------------------------------------------------------------
// Top-level engine error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The local store could not be read or written.
    Storage(StorageError),
    /// A remote document operation failed.
    Remote(RemoteError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Remote(e) => write!(f, "remote: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<RemoteError> for Error {
    fn from(e: RemoteError) -> Self {
        Self::Remote(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Engine-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
