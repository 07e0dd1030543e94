//! Property tests for the join laws of both counters.

use crdt_counter::prelude::*;
use proptest::prelude::*;

/// A counter owned by `owner` that has observed the given per-replica counts.
fn gcounter(owner: u8, seen: Vec<(u8, u32)>) -> GCounter<u8> {
    GCounter::import(owner, seen.into_iter().map(|(r, c)| (r, u64::from(c))))
        .expect("generated counts are non-negative")
}

fn arb_gcounter() -> impl Strategy<Value = GCounter<u8>> {
    (0u8..8, prop::collection::vec((0u8..8, 0u32..1_000), 0..8)).prop_map(|(owner, seen)| {
        // Duplicate keys with different counts are a conflict; keep the first.
        let mut dedup = std::collections::BTreeMap::new();
        for (r, c) in seen {
            dedup.entry(r).or_insert(c);
        }
        gcounter(owner, dedup.into_iter().collect())
    })
}

fn arb_pncounter() -> impl Strategy<Value = PNCounter<u8>> {
    (arb_gcounter(), arb_gcounter(), 0u8..8).prop_map(|(inc, dec, owner)| {
        PNCounter::import(owner, inc.export(), dec.export()).expect("valid halves")
    })
}

fn merged<T: Crdt + Clone>(a: &T, b: &T) -> T {
    let mut out = a.clone();
    out.merge(b);
    out
}

proptest! {
    #[test]
    fn gcounter_merge_commutes(a in arb_gcounter(), b in arb_gcounter()) {
        prop_assert_eq!(merged(&a, &b).export(), merged(&b, &a).export());
    }

    #[test]
    fn gcounter_merge_associates(a in arb_gcounter(), b in arb_gcounter(), c in arb_gcounter()) {
        let left = merged(&merged(&a, &b), &c);
        let right = merged(&a, &merged(&b, &c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn gcounter_merge_is_idempotent(a in arb_gcounter()) {
        prop_assert_eq!(merged(&a, &a), a);
    }

    #[test]
    fn gcounter_merge_is_monotonic(a in arb_gcounter(), b in arb_gcounter()) {
        let m = merged(&a, &b);
        prop_assert!(m.dominates(&a));
        prop_assert!(m.dominates(&b));
        for replica in a.replicas().chain(b.replicas()) {
            prop_assert!(m.count_for(replica) >= a.count_for(replica).max(b.count_for(replica)));
        }
        prop_assert!(m.value() >= a.value().max(b.value()));
    }

    #[test]
    fn gcounter_delta_matches_merge(a in arb_gcounter(), b in arb_gcounter()) {
        let mut via_delta = b.clone();
        via_delta.apply_delta(&a.delta(&b));
        prop_assert_eq!(via_delta, merged(&b, &a));
    }

    #[test]
    fn gcounter_local_increments_counted(n in 0usize..200) {
        let mut c = GCounter::new(0u8);
        for _ in 0..n {
            c.increment();
        }
        prop_assert_eq!(c.value(), n as u64);
    }

    #[test]
    fn pncounter_merge_laws(a in arb_pncounter(), b in arb_pncounter(), c in arb_pncounter()) {
        prop_assert_eq!(merged(&a, &b).export(), merged(&b, &a).export());
        prop_assert_eq!(merged(&merged(&a, &b), &c), merged(&a, &merged(&b, &c)));
        prop_assert_eq!(merged(&a, &a), a.clone());
        let m = merged(&a, &b);
        prop_assert!(m.dominates(&a) && m.dominates(&b));
    }

    #[test]
    fn pncounter_value_ignores_interleaving(ops in prop::collection::vec(any::<bool>(), 0..100)) {
        let mut in_order = PNCounter::new(1u8);
        for &up in &ops {
            if up { in_order.increment() } else { in_order.decrement() }
        }

        let ups = ops.iter().filter(|&&up| up).count();
        let downs = ops.len() - ups;
        let mut batched = PNCounter::new(1u8);
        for _ in 0..downs {
            batched.decrement();
        }
        for _ in 0..ups {
            batched.increment();
        }

        prop_assert_eq!(in_order.value(), ups as i64 - downs as i64);
        prop_assert_eq!(in_order, batched);
    }

    #[test]
    fn negative_counts_never_accepted(good in 0i64..100, bad in i64::MIN..0) {
        let mut c = GCounter::new(0u8);
        c.increment_by(good as u64);
        let before = c.clone();
        prop_assert!(c.merge_counts([(1u8, good), (2u8, bad)]).is_err());
        prop_assert_eq!(c, before);
    }
}
