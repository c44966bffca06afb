//! Board-agnostic stimulation engine for the Tactus two-device system
//!
//! This crate contains all application logic that does not depend on a
//! specific board or radio:
//!
//! - Collaborator traits (clock, actuator bank, record transport)
//! - Randomized stimulation-sequence generation
//! - Phase-based pulse playback
//! - Clock-offset estimation and round-trip sampling
//! - Controller/node session orchestration
//! - Configuration type definitions and settings persistence
//!
//! Time never comes from a global source: callers read their monotonic
//! clock and pass the current microsecond count into each tick.

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod playback;
pub mod rng;
pub mod sequence;
pub mod session;
pub mod sync;
pub mod traits;
