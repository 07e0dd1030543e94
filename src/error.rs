use alloc::string::String;
use core::fmt;

use thiserror::Error;

/// Which counter a piece of state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CounterKind {
    /// Grow-only counter.
    GCounter = 1,
    /// Positive-negative counter.
    PNCounter = 2,
}

impl CounterKind {
    /// Convert from a raw byte.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::GCounter),
            2 => Some(Self::PNCounter),
            _ => None,
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GCounter => f.write_str("G-Counter"),
            Self::PNCounter => f.write_str("PN-Counter"),
        }
    }
}

/// Ways a peer state can violate the grow-only invariants.
///
/// Replica identifiers are rendered with their `Debug` output so the error
/// stays independent of the identifier type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidState {
    /// A replica slot carries a count below zero.
    #[error("replica {replica} reports negative count {count}")]
    NegativeCount {
        /// The offending replica.
        replica: String,
        /// The count as received.
        count: i128,
    },
    /// A replica slot carries a count that does not fit in a `u64`.
    #[error("replica {replica} reports count {count}, above the u64 range")]
    CountOverflow {
        /// The offending replica.
        replica: String,
        /// The count as received.
        count: i128,
    },
    /// The same replica appears twice with different counts.
    #[error("replica {replica} listed twice with counts {first} and {second}")]
    ConflictingCount {
        /// The offending replica.
        replica: String,
        /// Count seen first.
        first: u64,
        /// Count seen second.
        second: u64,
    },
    /// The two halves of a PN-Counter belong to different replicas.
    #[error("increments belong to replica {increments} but decrements to {decrements}")]
    ReplicaMismatch {
        /// Owner of the increment half.
        increments: String,
        /// Owner of the decrement half.
        decrements: String,
    },
    /// State of one counter kind was handed to the other.
    #[error("expected {expected} state, found {found}")]
    KindMismatch {
        /// The kind the caller asked for.
        expected: CounterKind,
        /// The kind the state declares.
        found: CounterKind,
    },
}

/// Problems with the binary envelope around encoded counter state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Data is too short to contain a valid envelope.
    #[error("data too short for version envelope")]
    TooShort,
    /// Missing or incorrect magic byte.
    #[error("invalid magic byte: 0x{0:02X}, expected 0xCF")]
    InvalidMagic(u8),
    /// Unknown counter kind byte.
    #[error("unknown counter kind: {0}")]
    UnknownKind(u8),
    /// Envelope written by a newer, unsupported format version.
    #[error("unsupported format version {found}, newest known is {supported}")]
    UnsupportedVersion {
        /// Version found in the header.
        found: u8,
        /// Newest version this build understands.
        supported: u8,
    },
}

/// Errors surfaced by counter reconciliation and encoding.
///
/// `increment`, `decrement` and `value` never fail. Only state arriving from
/// outside the process (imports, decoded bytes) can be rejected, and a
/// rejection never alters the receiving counter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterError {
    /// Peer state violates the counter's invariants.
    #[error("invalid counter state: {0}")]
    InvalidState(#[from] InvalidState),
    /// The binary envelope is malformed.
    #[error("malformed envelope: {0}")]
    Envelope(#[from] EnvelopeError),
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Encode(String),
    /// Deserialization of the payload failed.
    #[error("deserialization error: {0}")]
    Decode(String),
}
