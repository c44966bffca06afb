//! Controller/Node Synchronization Protocol
//!
//! This crate defines the record-based protocol between the Tactus
//! controller and node devices. The transport delivers whole records (or
//! nothing), so there is no streaming framing layer; each record is a
//! fixed-size, little-endian byte image identified by its first byte.
//!
//! # Record Overview
//!
//! ```text
//! Plan record (374 bytes), controller → node:
//! ┌──────┬─────────┬───────────┬────────────────┬──────────────────────┐
//! │ KIND │ VERSION │ T_SEND_US │ START_DELAY_US │ 20 × period (18B)    │
//! │ 1B   │ 1B      │ 8B        │ 4B             │ 360B                 │
//! └──────┴─────────┴───────────┴────────────────┴──────────────────────┘
//!
//! Echo record (18 bytes), either direction:
//! ┌──────┬─────────┬─────────────────┬─────────────────┐
//! │ KIND │ VERSION │ RECV_SESSION_US │ SEND_SESSION_US │
//! │ 1B   │ 1B      │ 8B              │ 8B              │
//! └──────┴─────────┴─────────────────┴─────────────────┘
//! ```
//!
//! Echo timestamps count microseconds since the sender's session epoch, so
//! a pair of echoes closes a four-timestamp round trip for clock-offset
//! estimation. Records that fail validation are discarded by the caller
//! without touching session state.

#![no_std]
#![deny(unsafe_code)]

pub mod records;
pub mod wire;

pub use records::{EchoRecord, PlanPeriod, PlanRecord, SyncMessage};
pub use wire::{
    RecordError, ECHO_RECORD_SIZE, MAX_RECORD_SIZE, NUM_FINGERS, NUM_PERIODS, PLAN_RECORD_SIZE,
    PROTOCOL_VERSION, RECORD_ECHO, RECORD_PLAN,
};
