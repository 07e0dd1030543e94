//! Validating `serde` support.
//!
//! Counts travel as signed `i128` in both directions. A self-describing
//! format can then carry a negative or oversized count far enough for it to
//! surface as [`InvalidState`](crate::InvalidState) instead of a bare type
//! error, and non-self-describing formats such as postcard see the same
//! schema on both ends. A malformed counter is never built.

use alloc::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{CounterError, GCounter, PNCounter, ReplicaId};

#[derive(Deserialize)]
#[serde(rename = "GCounter")]
pub(crate) struct GCounterWire<A: ReplicaId> {
    replica: A,
    counts: BTreeMap<A, i128>,
}

impl<A: ReplicaId> GCounterWire<A> {
    pub(crate) fn into_counter(self) -> Result<GCounter<A>, CounterError> {
        GCounter::import(self.replica, self.counts)
    }
}

#[derive(Deserialize)]
#[serde(rename = "PNCounter")]
pub(crate) struct PNCounterWire<A: ReplicaId> {
    increments: GCounterWire<A>,
    decrements: GCounterWire<A>,
}

impl<A: ReplicaId> PNCounterWire<A> {
    pub(crate) fn into_counter(self) -> Result<PNCounter<A>, CounterError> {
        let increments = self.increments.into_counter()?;
        let decrements = self.decrements.into_counter()?;
        PNCounter::from_halves(increments, decrements)
    }
}

/// Borrowed view of a count map that widens every count on the way out.
struct WideCounts<'a, A>(&'a BTreeMap<A, u64>);

impl<A: Serialize> Serialize for WideCounts<'_, A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.0
                .iter()
                .map(|(replica, &count)| (replica, i128::from(count))),
        )
    }
}

impl<A> Serialize for GCounter<A>
where
    A: ReplicaId + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GCounter", 2)?;
        state.serialize_field("replica", &self.replica)?;
        state.serialize_field("counts", &WideCounts(&self.counts))?;
        state.end()
    }
}

impl<'de, A> Deserialize<'de> for GCounter<A>
where
    A: ReplicaId + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        GCounterWire::<A>::deserialize(deserializer)?
            .into_counter()
            .map_err(serde::de::Error::custom)
    }
}

impl<'de, A> Deserialize<'de> for PNCounter<A>
where
    A: ReplicaId + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PNCounterWire::<A>::deserialize(deserializer)?
            .into_counter()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use alloc::string::{String, ToString};

    #[test]
    fn gcounter_json_roundtrip() {
        let mut c = GCounter::new(1u32);
        c.increment_by(3);
        c.merge(&GCounter::import(7u32, [(7u32, 4u64)]).unwrap());

        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, r#"{"replica":1,"counts":{"1":3,"7":4}}"#);
        let back: GCounter<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn negative_count_rejected_as_invalid_state() {
        let json = r#"{"replica":1,"counts":{"1":0,"7":-4}}"#;
        let err = serde_json::from_str::<GCounter<u32>>(json).unwrap_err();
        assert!(err.to_string().contains("negative count -4"), "{err}");
    }

    #[test]
    fn pncounter_halves_must_share_owner() {
        let json = r#"{
            "increments": {"replica": "a", "counts": {"a": 1}},
            "decrements": {"replica": "b", "counts": {"b": 1}}
        }"#;
        let err = serde_json::from_str::<PNCounter<String>>(json).unwrap_err();
        assert!(err.to_string().contains("increments belong to replica"), "{err}");
    }

    #[test]
    fn pncounter_json_roundtrip() {
        let mut c = PNCounter::new("x".to_string());
        c.increment();
        c.decrement_by(4);

        let json = serde_json::to_string(&c).unwrap();
        let back: PNCounter<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.value(), -3);
    }
}
