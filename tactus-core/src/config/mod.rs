//! Configuration types
//!
//! Session parameters with validation, plus the postcard settings blob
//! devices persist across power cycles.

#[cfg(feature = "serde")]
pub mod persist;
pub mod types;

#[cfg(feature = "serde")]
pub use persist::*;
pub use types::*;
