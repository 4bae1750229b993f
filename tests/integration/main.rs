//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one part of the engine
//! through the public [`steppet::PetService`] API, wired over the
//! in-memory adapters.  Everything runs on the host; async calls are
//! driven by `futures_lite::future::block_on`.

mod feeding_tests;
mod mocks;
mod service_tests;
mod steps_tests;
