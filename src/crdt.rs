use core::fmt;

/// Identifier of a replica.
///
/// Any totally ordered, cloneable type qualifies: integers, `String`,
/// `&'static str` or a UUID newtype. The ordering only fixes the iteration
/// order of exported state; it carries no meaning for the counter itself.
pub trait ReplicaId: Ord + Clone + fmt::Debug {}

impl<T: Ord + Clone + fmt::Debug> ReplicaId for T {}

/// Core trait that all counters implement.
///
/// A CRDT (Conflict-free Replicated Data Type) guarantees that concurrent
/// updates on different replicas will converge to the same state after merging,
/// without requiring coordination.
///
/// # Properties
///
/// All implementations must satisfy:
/// - **Commutativity:** `a.merge(b) == b.merge(a)`
/// - **Associativity:** `a.merge(b.merge(c)) == a.merge(b).merge(c)`
/// - **Idempotency:** `a.merge(a) == a`
/// - **Monotonicity:** the result dominates both inputs
pub trait Crdt {
    /// Merge another replica's state into this one.
    ///
    /// After merging, `self` contains the least upper bound of both states.
    /// A well-typed counter always upholds its invariants, so this cannot
    /// fail; untrusted state goes through the fallible `import` and
    /// `merge_counts` paths instead.
    fn merge(&mut self, other: &Self);
}

/// Extension trait for delta-state CRDTs.
///
/// Delta-state CRDTs can produce compact deltas representing only the
/// changes between two states. Replicas that know roughly what a peer has
/// can ship the delta instead of the full state.
///
/// # Example
///
/// ```
/// use crdt_counter::prelude::*;
///
/// let mut c1 = GCounter::new("a");
/// c1.increment();
/// c1.increment();
///
/// let mut c2 = GCounter::new("b");
/// c2.increment();
///
/// // Generate a delta from c1 that c2 doesn't have
/// let delta = c1.delta(&c2);
///
/// // Apply just the delta instead of full state merge
/// c2.apply_delta(&delta);
/// assert_eq!(c2.value(), 3);
/// ```
pub trait DeltaCrdt: Crdt {
    /// The type of delta produced by this CRDT.
    type Delta;

    /// Generate a delta containing changes in `self` that `other` does not have.
    fn delta(&self, other: &Self) -> Self::Delta;

    /// Apply a delta to this replica's state.
    ///
    /// Equivalent to merging the state that produced the delta.
    fn apply_delta(&mut self, delta: &Self::Delta);
}
