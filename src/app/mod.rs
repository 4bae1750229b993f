//! Application core: engine orchestration behind port traits.
//!
//! This module contains the composition root of the StepPet engine
//! ([`service::PetService`]), its inbound commands and outbound events.
//! All interaction with the platform (stores, identity, clock, step
//! sensor, notifications) happens through the **port traits** defined in
//! [`ports`], keeping this layer fully testable with in-memory adapters.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
