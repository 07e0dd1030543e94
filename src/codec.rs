//! Versioned binary encoding for counters.
//!
//! Every encoded counter is wrapped in a 3-byte envelope so a receiver can
//! tell what it is looking at before decoding the payload:
//!
//! ```text
//! [MAGIC: 0xCF][VERSION: u8][KIND: u8][PAYLOAD: postcard]
//! ```
//!
//! ```
//! use crdt_counter::prelude::*;
//!
//! let mut c = PNCounter::new(4u32);
//! c.decrement();
//!
//! let bytes = c.to_bytes().unwrap();
//! let received = PNCounter::<u32>::from_bytes(&bytes).unwrap();
//! assert_eq!(received.value(), -1);
//! ```

use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;

use serde::Serialize;

use crate::wire::{GCounterWire, PNCounterWire};
use crate::{CounterError, CounterKind, EnvelopeError, GCounter, InvalidState, PNCounter, ReplicaId};

/// Magic byte identifying encoded counter state.
pub const MAGIC_BYTE: u8 = 0xCF;

/// Size of the envelope header in bytes.
pub const ENVELOPE_HEADER_SIZE: usize = 3;

/// Counter types that carry a versioned binary encoding.
pub trait Versioned {
    /// Current schema version of the payload format.
    const CURRENT_VERSION: u8;

    /// Kind byte written into the envelope.
    const KIND: CounterKind;
}

impl<A: ReplicaId> Versioned for GCounter<A> {
    const CURRENT_VERSION: u8 = 1;
    const KIND: CounterKind = CounterKind::GCounter;
}

impl<A: ReplicaId> Versioned for PNCounter<A> {
    const CURRENT_VERSION: u8 = 1;
    const KIND: CounterKind = CounterKind::PNCounter;
}

/// Read the kind byte without decoding the payload.
///
/// # Errors
///
/// [`CounterError::Envelope`] if the header is missing or malformed.
pub fn peek_kind(data: &[u8]) -> Result<CounterKind, CounterError> {
    let (_, kind) = header(data)?;
    Ok(kind)
}

fn header(data: &[u8]) -> Result<(u8, CounterKind), EnvelopeError> {
    if data.len() < ENVELOPE_HEADER_SIZE {
        return Err(EnvelopeError::TooShort);
    }
    if data[0] != MAGIC_BYTE {
        return Err(EnvelopeError::InvalidMagic(data[0]));
    }
    let kind = CounterKind::from_byte(data[2]).ok_or(EnvelopeError::UnknownKind(data[2]))?;
    Ok((data[1], kind))
}

fn seal<T: Versioned + Serialize>(value: &T) -> Result<Vec<u8>, CounterError> {
    let mut bytes = Vec::with_capacity(ENVELOPE_HEADER_SIZE + 16);
    bytes.push(MAGIC_BYTE);
    bytes.push(T::CURRENT_VERSION);
    bytes.push(T::KIND as u8);
    let bytes = postcard::to_extend(value, bytes)
        .map_err(|err| CounterError::Encode(err.to_string()))?;
    Ok(bytes)
}

/// Check the envelope against `T` and hand back the payload.
fn open<T: Versioned>(data: &[u8]) -> Result<&[u8], CounterError> {
    let (version, kind) = header(data)?;
    if kind != T::KIND {
        return Err(InvalidState::KindMismatch {
            expected: T::KIND,
            found: kind,
        }
        .into());
    }
    if version == 0 || version > T::CURRENT_VERSION {
        return Err(EnvelopeError::UnsupportedVersion {
            found: version,
            supported: T::CURRENT_VERSION,
        }
        .into());
    }
    Ok(&data[ENVELOPE_HEADER_SIZE..])
}

fn decode_payload<'a, W: serde::Deserialize<'a>>(payload: &'a [u8]) -> Result<W, CounterError> {
    let (wire, rest) =
        postcard::take_from_bytes(payload).map_err(|err| CounterError::Decode(err.to_string()))?;
    if !rest.is_empty() {
        return Err(CounterError::Decode(format!(
            "{} trailing bytes after payload",
            rest.len()
        )));
    }
    Ok(wire)
}

impl<A> GCounter<A>
where
    A: ReplicaId + Serialize + serde::de::DeserializeOwned,
{
    /// Encode this counter into an enveloped byte buffer.
    ///
    /// # Errors
    ///
    /// [`CounterError::Encode`] if the replica ID cannot be serialized.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CounterError> {
        seal(self)
    }

    /// Decode a counter previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// [`CounterError::Envelope`] for a bad header,
    /// [`CounterError::InvalidState`] for a PN-Counter payload or counts that
    /// break the grow-only invariants, [`CounterError::Decode`] otherwise.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CounterError> {
        let wire: GCounterWire<A> = decode_payload(open::<Self>(data)?)?;
        wire.into_counter()
    }

    /// Decode peer state and merge it, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Same as [`from_bytes`](Self::from_bytes); on error `self` is unchanged.
    pub fn merge_bytes(&mut self, data: &[u8]) -> Result<(), CounterError> {
        let peer = Self::from_bytes(data).map_err(|err| {
            tracing::warn!(replica = ?self.replica, error = %err, "discarding undecodable peer state");
            err
        })?;
        self.absorb(&peer.counts);
        Ok(())
    }
}

impl<A> PNCounter<A>
where
    A: ReplicaId + Serialize + serde::de::DeserializeOwned,
{
    /// Encode this counter into an enveloped byte buffer.
    ///
    /// # Errors
    ///
    /// [`CounterError::Encode`] if the replica ID cannot be serialized.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CounterError> {
        seal(self)
    }

    /// Decode a counter previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// As for [`GCounter::from_bytes`]; additionally
    /// [`CounterError::InvalidState`] if the two halves disagree on their
    /// owner.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CounterError> {
        let wire: PNCounterWire<A> = decode_payload(open::<Self>(data)?)?;
        wire.into_counter()
    }

    /// Decode peer state and merge it, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Same as [`from_bytes`](Self::from_bytes); on error `self` is unchanged.
    pub fn merge_bytes(&mut self, data: &[u8]) -> Result<(), CounterError> {
        let peer = Self::from_bytes(data).map_err(|err| {
            tracing::warn!(replica = ?self.replica(), error = %err, "discarding undecodable peer state");
            err
        })?;
        self.increments.absorb(&peer.increments.counts);
        self.decrements.absorb(&peer.decrements.counts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Crdt;

    #[test]
    fn header_layout() {
        let c = GCounter::new(1u8);
        let bytes = c.to_bytes().unwrap();
        assert_eq!(&bytes[..ENVELOPE_HEADER_SIZE], &[MAGIC_BYTE, 1, 1]);
        assert_eq!(peek_kind(&bytes).unwrap(), CounterKind::GCounter);
    }

    #[test]
    fn gcounter_roundtrip() {
        let mut c = GCounter::new(1u32);
        c.increment_by(3);
        c.merge(&GCounter::import(7u32, [(7u32, 4u64)]).unwrap());

        let back = GCounter::<u32>::from_bytes(&c.to_bytes().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn kind_mismatch_is_invalid_state() {
        let bytes = PNCounter::new(1u32).to_bytes().unwrap();
        let err = GCounter::<u32>::from_bytes(&bytes).unwrap_err();
        assert_eq!(
            err,
            CounterError::InvalidState(InvalidState::KindMismatch {
                expected: CounterKind::GCounter,
                found: CounterKind::PNCounter,
            })
        );
    }

    #[test]
    fn truncated_and_foreign_input() {
        assert_eq!(
            GCounter::<u32>::from_bytes(&[MAGIC_BYTE]),
            Err(CounterError::Envelope(EnvelopeError::TooShort))
        );
        assert_eq!(
            GCounter::<u32>::from_bytes(&[0xAB, 1, 1]),
            Err(CounterError::Envelope(EnvelopeError::InvalidMagic(0xAB)))
        );
        assert_eq!(
            GCounter::<u32>::from_bytes(&[MAGIC_BYTE, 1, 200]),
            Err(CounterError::Envelope(EnvelopeError::UnknownKind(200)))
        );
    }

    #[test]
    fn newer_version_refused() {
        let mut bytes = GCounter::new(1u32).to_bytes().unwrap();
        bytes[1] = 9;
        assert_eq!(
            GCounter::<u32>::from_bytes(&bytes),
            Err(CounterError::Envelope(EnvelopeError::UnsupportedVersion {
                found: 9,
                supported: 1,
            }))
        );
    }

    #[test]
    fn truncated_payload_is_decode_error() {
        let mut c = GCounter::new(1u32);
        c.increment_by(300);
        let bytes = c.to_bytes().unwrap();
        let err = GCounter::<u32>::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, CounterError::Decode(_)));
    }

    #[test]
    fn trailing_garbage_is_decode_error() {
        let mut c = GCounter::new(1u32);
        c.increment_by(3);
        let mut bytes = c.to_bytes().unwrap();
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

        assert_eq!(
            GCounter::<u32>::from_bytes(&bytes),
            Err(CounterError::Decode("4 trailing bytes after payload".into()))
        );
        assert!(c.clone().merge_bytes(&bytes).is_err());
    }

    #[test]
    fn version_zero_refused() {
        let mut bytes = PNCounter::new(1u32).to_bytes().unwrap();
        bytes[1] = 0;
        assert_eq!(
            PNCounter::<u32>::from_bytes(&bytes),
            Err(CounterError::Envelope(EnvelopeError::UnsupportedVersion {
                found: 0,
                supported: 1,
            }))
        );
    }

    #[test]
    fn merge_bytes_rejects_without_touching_state() {
        let mut c = GCounter::new(1u32);
        c.increment();
        let before = c.clone();

        let foreign = PNCounter::new(2u32).to_bytes().unwrap();
        assert!(c.merge_bytes(&foreign).is_err());
        assert_eq!(c, before);
    }

    #[test]
    fn pncounter_merge_bytes() {
        let mut a = PNCounter::new(1u32);
        a.increment_by(2);
        let mut b = PNCounter::new(2u32);
        b.decrement_by(5);

        a.merge_bytes(&b.to_bytes().unwrap()).unwrap();
        assert_eq!(a.value(), -3);
        assert_eq!(a.replica(), &1);
    }
}
