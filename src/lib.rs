//! # crdt-counter
//!
//! Replicated counters that converge without coordination.
//!
//! Every replica keeps its own copy of the counter and updates it locally.
//! Copies are reconciled by exchanging state and merging it: the merge is a
//! per-replica maximum, so it is commutative, associative and idempotent,
//! and converges whatever the delay, duplication or reordering of the
//! exchanged states.
//!
//! ## `no_std` Support
//!
//! This crate supports `no_std` environments with the `alloc` crate.
//! Disable the default features in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! crdt-counter = { version = "0.1", default-features = false }
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use crdt_counter::prelude::*;
//!
//! // Grow-only counter
//! let mut c1 = GCounter::new("device-1");
//! c1.increment();
//!
//! let mut c2 = GCounter::new("device-2");
//! c2.increment();
//!
//! c1.merge(&c2);
//! assert_eq!(c1.value(), 2);
//! ```
//!
//! ## Available Counters
//!
//! - [`GCounter`] - Grow-only counter (increment only)
//! - [`PNCounter`] - Positive-negative counter (increment and decrement)
//!
//! ## Exchanging State
//!
//! A transport or storage layer moves state between replicas in one of
//! three ways:
//!
//! - [`GCounter::export`] / [`GCounter::import`] (and the [`PNCounter`]
//!   equivalents) hand out and accept plain count maps. Imports validate and
//!   reject bad state with [`CounterError::InvalidState`].
//! - With the `serde` feature, counters implement `Serialize` and a
//!   validating `Deserialize`.
//! - With the `codec` feature (on by default), `to_bytes` / `from_bytes` /
//!   `merge_bytes` use a small versioned envelope around a postcard payload.
//!
//! ## Concurrency
//!
//! Each replica ID must have a single writer. A counter instance is plain
//! data with no interior locking: share it across threads behind a lock, or
//! keep one instance per task.
//!
//! ## Features
//!
//! - `std` (default): use `std` for error and logging support.
//! - `serde`: serialization support.
//! - `codec` (default): versioned binary encoding, implies `serde`.
//! - `wasm`: `wasm-bindgen` classes for JavaScript hosts.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "codec")]
pub mod codec;
mod crdt;
mod error;
mod gcounter;
mod pncounter;
#[cfg(feature = "wasm")]
mod wasm;
#[cfg(feature = "serde")]
mod wire;

pub mod prelude;

pub use crdt::{Crdt, DeltaCrdt, ReplicaId};
pub use error::{CounterError, CounterKind, EnvelopeError, InvalidState};
pub use gcounter::{GCounter, GCounterDelta};
pub use pncounter::{PNCounter, PNCounterDelta, PNCounterSnapshot};
