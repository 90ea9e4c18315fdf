//! Library crate for secret-santa-core, exposing modules for the binary and
//! integration tests.
//!
//! The core coordinates gift-exchange games: participants register under a
//! shared code, the organizer locks registration, a randomized cyclic
//! assignment is computed and persisted, and expired games are reclaimed by
//! a background purge scheduler.

pub mod command;
pub mod config;
pub mod dao;
pub mod error;
pub mod services;
pub mod state;
