//! StepPet vitality engine.
//!
//! A virtual pet whose hunger, health and happiness follow the user's
//! daily steps: time-proportional decay, a step-gated feeding throttle, a
//! step aggregator over the hardware counter, and best-effort mirroring to
//! a per-user remote document store.  Platform services are reached only
//! through the port traits in [`app::ports`]; [`adapters`] ships in-memory
//! implementations of all of them.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod day;
pub mod decay;
pub mod error;
pub mod feeding;
pub mod history;
pub mod mirror;
pub mod pet;
pub mod prefs;
pub mod repository;
pub mod scheduler;
pub mod steps;
pub mod summary;

pub use app::service::PetService;
pub use error::{Error, Result};
