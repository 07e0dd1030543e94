use alloc::collections::btree_map::{BTreeMap, Entry};
use alloc::format;
use core::fmt;

use crate::{CounterError, Crdt, DeltaCrdt, InvalidState, ReplicaId};

/// A grow-only counter (G-Counter).
///
/// Each replica maintains its own count. The total value is the sum of all
/// replica counts. This counter can only be incremented, never decremented.
///
/// Slots are keyed by replica identifier, so a merge with a replica that has
/// never been seen simply adds a slot, whatever the identifier looks like.
///
/// Only the replica owning `replica` may call [`increment`](Self::increment)
/// on its instance. The type does no locking; callers serialize access to
/// one instance themselves.
///
/// # Example
///
/// ```
/// use crdt_counter::prelude::*;
///
/// let mut c1 = GCounter::new(1u32);
/// c1.increment();
/// c1.increment();
///
/// let mut c2 = GCounter::new(2u32);
/// c2.increment();
///
/// c1.merge(&c2);
/// assert_eq!(c1.value(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GCounter<A: ReplicaId> {
    pub(crate) replica: A,
    pub(crate) counts: BTreeMap<A, u64>,
}

impl<A: ReplicaId> GCounter<A> {
    /// Create a new G-Counter for the given replica, with its own slot at 0.
    pub fn new(replica: A) -> Self {
        let mut counts = BTreeMap::new();
        counts.insert(replica.clone(), 0);
        Self { replica, counts }
    }

    /// Create a G-Counter that already knows a set of peers.
    ///
    /// Every peer starts at 0. Listing the local replica among the peers is
    /// harmless.
    pub fn with_peers(replica: A, peers: impl IntoIterator<Item = A>) -> Self {
        let mut counter = Self::new(replica);
        for peer in peers {
            counter.counts.entry(peer).or_insert(0);
        }
        counter
    }

    /// Rebuild a counter from an exported snapshot.
    ///
    /// `counts` may come from an untrusted source, so counts are taken as
    /// anything that widens to `i128` and validated before use.
    ///
    /// # Errors
    ///
    /// [`CounterError::InvalidState`] if a count is negative, exceeds `u64`,
    /// or a replica is listed twice with different counts.
    pub fn import<I, C>(replica: A, counts: I) -> Result<Self, CounterError>
    where
        I: IntoIterator<Item = (A, C)>,
        C: Into<i128>,
    {
        let mut counter = Self::new(replica);
        counter.merge_counts(counts)?;
        Ok(counter)
    }

    /// Increment this replica's count by 1.
    pub fn increment(&mut self) {
        self.increment_by(1);
    }

    /// Increment this replica's count by `n`.
    pub fn increment_by(&mut self, n: u64) {
        let slot = self.counts.entry(self.replica.clone()).or_insert(0);
        *slot = slot.saturating_add(n);
    }

    /// Get the total counter value across all replicas.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.counts
            .values()
            .fold(0u64, |acc, &count| acc.saturating_add(count))
    }

    /// Get this replica's ID.
    #[must_use]
    pub fn replica(&self) -> &A {
        &self.replica
    }

    /// Get the count for a specific replica. Unknown replicas count 0.
    #[must_use]
    pub fn count_for(&self, replica: &A) -> u64 {
        self.counts.get(replica).copied().unwrap_or(0)
    }

    /// Iterate over every known replica, in identifier order.
    pub fn replicas(&self) -> impl Iterator<Item = &A> {
        self.counts.keys()
    }

    /// Number of replicas this counter knows about, itself included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no replica slots are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all slots without saturation.
    pub(crate) fn exact_total(&self) -> i128 {
        self.counts.values().map(|&count| i128::from(count)).sum()
    }

    /// Iterate over `(replica, count)` pairs, in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&A, u64)> {
        self.counts.iter().map(|(replica, &count)| (replica, count))
    }

    /// Whether every slot of `other` is matched or exceeded by `self`.
    #[must_use]
    pub fn dominates(&self, other: &Self) -> bool {
        other
            .counts
            .iter()
            .all(|(replica, &count)| self.count_for(replica) >= count)
    }

    /// Snapshot the per-replica counts for shipping to another replica.
    #[must_use]
    pub fn export(&self) -> BTreeMap<A, u64> {
        self.counts.clone()
    }

    /// Merge raw per-replica counts received from a peer.
    ///
    /// The whole input is validated before any slot is touched; on error the
    /// counter is left exactly as it was.
    ///
    /// # Errors
    ///
    /// [`CounterError::InvalidState`] under the same conditions as
    /// [`import`](Self::import).
    pub fn merge_counts<I, C>(&mut self, counts: I) -> Result<(), CounterError>
    where
        I: IntoIterator<Item = (A, C)>,
        C: Into<i128>,
    {
        let staged = validate_counts(counts).map_err(|err| {
            tracing::warn!(replica = ?self.replica, error = %err, "rejected peer counter state");
            err
        })?;
        self.absorb(&staged);
        Ok(())
    }

    /// Per-key max of `counts` into `self`.
    pub(crate) fn absorb(&mut self, counts: &BTreeMap<A, u64>) {
        let mut changed = 0usize;
        for (replica, &count) in counts {
            match self.counts.get_mut(replica) {
                Some(slot) => {
                    if count > *slot {
                        *slot = count;
                        changed += 1;
                    }
                }
                None => {
                    tracing::trace!(local = ?self.replica, replica = ?replica, count, "absorbed unseen replica");
                    self.counts.insert(replica.clone(), count);
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            tracing::debug!(replica = ?self.replica, changed, value = self.value(), "merged peer state");
        }
    }
}

/// Check untrusted counts against the grow-only invariants.
pub(crate) fn validate_counts<A, I, C>(counts: I) -> Result<BTreeMap<A, u64>, InvalidState>
where
    A: ReplicaId,
    I: IntoIterator<Item = (A, C)>,
    C: Into<i128>,
{
    let mut staged = BTreeMap::new();
    for (replica, count) in counts {
        let count: i128 = count.into();
        if count < 0 {
            return Err(InvalidState::NegativeCount {
                replica: format!("{replica:?}"),
                count,
            });
        }
        let count = u64::try_from(count).map_err(|_| InvalidState::CountOverflow {
            replica: format!("{replica:?}"),
            count,
        })?;
        match staged.entry(replica) {
            Entry::Vacant(slot) => {
                slot.insert(count);
            }
            Entry::Occupied(slot) => {
                if *slot.get() != count {
                    return Err(InvalidState::ConflictingCount {
                        replica: format!("{:?}", slot.key()),
                        first: *slot.get(),
                        second: count,
                    });
                }
            }
        }
    }
    Ok(staged)
}

impl<A: ReplicaId> Crdt for GCounter<A> {
    fn merge(&mut self, other: &Self) {
        self.absorb(&other.counts);
    }
}

impl<A: ReplicaId> fmt::Display for GCounter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Counter{:?}: {:?}", self.replica, self.counts)
    }
}

/// Delta for [`GCounter`]: only the entries where `self` is ahead of `other`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GCounterDelta<A: ReplicaId> {
    counts: BTreeMap<A, u64>,
}

impl<A: ReplicaId> GCounterDelta<A> {
    /// Whether the delta carries no updates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of replica slots the delta updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

impl<A: ReplicaId> DeltaCrdt for GCounter<A> {
    type Delta = GCounterDelta<A>;

    fn delta(&self, other: &Self) -> GCounterDelta<A> {
        let counts = self
            .counts
            .iter()
            .filter_map(|(replica, &count)| {
                let behind = match other.counts.get(replica) {
                    Some(&seen) => seen < count,
                    None => true,
                };
                behind.then(|| (replica.clone(), count))
            })
            .collect();
        GCounterDelta { counts }
    }

    fn apply_delta(&mut self, delta: &GCounterDelta<A>) {
        self.absorb(&delta.counts);
    }
}
