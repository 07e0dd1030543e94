//! Convenient re-exports for common usage.
//!
//! ```
//! use crdt_counter::prelude::*;
//! ```

pub use crate::CounterError;
pub use crate::Crdt;
pub use crate::DeltaCrdt;
pub use crate::GCounter;
pub use crate::PNCounter;
pub use crate::ReplicaId;
