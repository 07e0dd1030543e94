use alloc::collections::BTreeMap;
use alloc::format;
use core::fmt;

use crate::gcounter::validate_counts;
use crate::{CounterError, Crdt, DeltaCrdt, GCounter, GCounterDelta, InvalidState, ReplicaId};

/// A positive-negative counter (PN-Counter).
///
/// Supports both increment and decrement operations by maintaining two
/// internal G-Counters: one for increments and one for decrements.
/// The value is `increments - decrements`. A decrement is an increment of
/// the decrement half, so both halves only ever grow.
///
/// # Example
///
/// ```
/// use crdt_counter::prelude::*;
///
/// let mut c1 = PNCounter::new("node-1");
/// c1.increment();
/// c1.increment();
/// c1.decrement();
/// assert_eq!(c1.value(), 1);
///
/// let mut c2 = PNCounter::new("node-2");
/// c2.decrement();
///
/// c1.merge(&c2);
/// assert_eq!(c1.value(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PNCounter<A: ReplicaId> {
    pub(crate) increments: GCounter<A>,
    pub(crate) decrements: GCounter<A>,
}

/// Exported state of a [`PNCounter`]: the per-replica counts of both halves.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PNCounterSnapshot<A: ReplicaId> {
    /// Increments observed per replica.
    pub increments: BTreeMap<A, u64>,
    /// Decrements observed per replica.
    pub decrements: BTreeMap<A, u64>,
}

impl<A: ReplicaId> PNCounter<A> {
    /// Create a new PN-Counter for the given replica ID.
    pub fn new(replica: A) -> Self {
        Self {
            increments: GCounter::new(replica.clone()),
            decrements: GCounter::new(replica),
        }
    }

    /// Create a PN-Counter that already knows a set of peers.
    pub fn with_peers(replica: A, peers: impl IntoIterator<Item = A>) -> Self {
        let increments = GCounter::with_peers(replica, peers);
        Self {
            decrements: increments.clone(),
            increments,
        }
    }

    /// Rebuild a counter from the two exported halves.
    ///
    /// # Errors
    ///
    /// [`CounterError::InvalidState`] if either half fails validation.
    pub fn import<I, D, C>(replica: A, increments: I, decrements: D) -> Result<Self, CounterError>
    where
        I: IntoIterator<Item = (A, C)>,
        D: IntoIterator<Item = (A, C)>,
        C: Into<i128>,
    {
        let mut counter = Self::new(replica);
        counter.merge_counts(increments, decrements)?;
        Ok(counter)
    }

    /// Increment the counter by 1.
    pub fn increment(&mut self) {
        self.increments.increment();
    }

    /// Increment the counter by `n`.
    pub fn increment_by(&mut self, n: u64) {
        self.increments.increment_by(n);
    }

    /// Decrement the counter by 1.
    pub fn decrement(&mut self) {
        self.decrements.increment();
    }

    /// Decrement the counter by `n`.
    pub fn decrement_by(&mut self, n: u64) {
        self.decrements.increment_by(n);
    }

    /// Get the current counter value (increments - decrements).
    ///
    /// Computed exactly and clamped to the `i64` range.
    #[must_use]
    pub fn value(&self) -> i64 {
        let diff = self.increments.exact_total() - self.decrements.exact_total();
        i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
    }

    /// Total of all increments observed.
    #[must_use]
    pub fn positive(&self) -> u64 {
        self.increments.value()
    }

    /// Total of all decrements observed.
    #[must_use]
    pub fn negative(&self) -> u64 {
        self.decrements.value()
    }

    /// Get this replica's ID.
    #[must_use]
    pub fn replica(&self) -> &A {
        self.increments.replica()
    }

    /// Whether both halves of `self` dominate the matching halves of `other`.
    #[must_use]
    pub fn dominates(&self, other: &Self) -> bool {
        self.increments.dominates(&other.increments) && self.decrements.dominates(&other.decrements)
    }

    /// Snapshot both halves for shipping to another replica.
    #[must_use]
    pub fn export(&self) -> PNCounterSnapshot<A> {
        PNCounterSnapshot {
            increments: self.increments.export(),
            decrements: self.decrements.export(),
        }
    }

    /// Merge raw counts for both halves received from a peer.
    ///
    /// Both halves are validated before either is touched.
    ///
    /// # Errors
    ///
    /// [`CounterError::InvalidState`] if either half fails validation; the
    /// counter is then unchanged.
    pub fn merge_counts<I, D, C>(&mut self, increments: I, decrements: D) -> Result<(), CounterError>
    where
        I: IntoIterator<Item = (A, C)>,
        D: IntoIterator<Item = (A, C)>,
        C: Into<i128>,
    {
        let (inc, dec) = validate_counts(increments)
            .and_then(|inc| validate_counts(decrements).map(|dec| (inc, dec)))
            .map_err(|err| {
                tracing::warn!(replica = ?self.replica(), error = %err, "rejected peer counter state");
                err
            })?;
        self.increments.absorb(&inc);
        self.decrements.absorb(&dec);
        Ok(())
    }

    /// Assemble a counter from two halves, checking they share an owner.
    #[cfg_attr(not(feature = "serde"), allow(dead_code))]
    pub(crate) fn from_halves(
        increments: GCounter<A>,
        decrements: GCounter<A>,
    ) -> Result<Self, CounterError> {
        if increments.replica != decrements.replica {
            return Err(InvalidState::ReplicaMismatch {
                increments: format!("{:?}", increments.replica),
                decrements: format!("{:?}", decrements.replica),
            }
            .into());
        }
        Ok(Self {
            increments,
            decrements,
        })
    }
}

impl<A: ReplicaId> Crdt for PNCounter<A> {
    fn merge(&mut self, other: &Self) {
        self.increments.merge(&other.increments);
        self.decrements.merge(&other.decrements);
    }
}

impl<A: ReplicaId> fmt::Display for PNCounter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PNCounter{:?}: +{:?} -{:?}",
            self.increments.replica, self.increments.counts, self.decrements.counts
        )
    }
}

/// Delta for [`PNCounter`]: one [`GCounterDelta`] per half.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PNCounterDelta<A: ReplicaId> {
    increments: GCounterDelta<A>,
    decrements: GCounterDelta<A>,
}

impl<A: ReplicaId> PNCounterDelta<A> {
    /// Whether the delta carries no updates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.increments.is_empty() && self.decrements.is_empty()
    }
}

impl<A: ReplicaId> DeltaCrdt for PNCounter<A> {
    type Delta = PNCounterDelta<A>;

    fn delta(&self, other: &Self) -> PNCounterDelta<A> {
        PNCounterDelta {
            increments: self.increments.delta(&other.increments),
            decrements: self.decrements.delta(&other.decrements),
        }
    }

    fn apply_delta(&mut self, delta: &PNCounterDelta<A>) {
        self.increments.apply_delta(&delta.increments);
        self.decrements.apply_delta(&delta.decrements);
    }
}
