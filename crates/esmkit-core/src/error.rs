use crate::types::{Dialect, Tag};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// How a subrecord's declared length is constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    Exactly(usize),
    AtMost(usize),
    /// A non-empty whole number of `n`-byte elements.
    MultipleOf(usize),
}

impl LengthRule {
    pub const fn accepts(self, len: usize) -> bool {
        match self {
            Self::Exactly(n) => len == n,
            Self::AtMost(n) => len <= n,
            Self::MultipleOf(n) => n != 0 && len != 0 && len % n == 0,
        }
    }
}

impl fmt::Display for LengthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n} bytes"),
            Self::AtMost(n) => write!(f, "at most {n} bytes"),
            Self::MultipleOf(n) => write!(f, "a non-zero multiple of {n} bytes"),
        }
    }
}

struct TagList<'a>(&'a [Tag]);

impl fmt::Display for TagList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("end of record");
        }
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

/// Structural failures while decoding. Offsets are absolute positions in the
/// input. Inside a compressed record they count from the first byte of the
/// inflated payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("stream exhausted at byte {at}: need {needed} bytes, {available} available")]
    StreamExhausted {
        at: u64,
        needed: usize,
        available: usize,
    },

    #[error("unknown record type {tag} at byte {at}")]
    UnknownRecordType { tag: Tag, at: u64 },

    #[error("{record}: unexpected subrecord {found} at byte {at}, expected {}", TagList(.expected))]
    UnexpectedSubrecordTag {
        record: Tag,
        found: Tag,
        expected: &'static [Tag],
        at: u64,
    },

    #[error("{record}.{subrecord}: length {actual} at byte {at}, expected {expected}")]
    InvalidLength {
        record: Tag,
        subrecord: Tag,
        expected: LengthRule,
        actual: usize,
        at: u64,
    },

    #[error("{record}: subrecords overrun declared size {declared} (consumed {consumed}) at byte {at}")]
    RecordOverrun {
        record: Tag,
        declared: usize,
        consumed: usize,
        at: u64,
    },

    #[error("{record}: duplicate subrecord {subrecord} at byte {at}")]
    DuplicateSubrecord { record: Tag, subrecord: Tag, at: u64 },

    #[error("{record}: missing required subrecord {subrecord} (record ends at byte {at})")]
    MissingRequiredSubrecord { record: Tag, subrecord: Tag, at: u64 },

    #[error("{record}: subrecord {subrecord} at byte {at} must follow {requires}")]
    OutOfOrderSubrecord {
        record: Tag,
        subrecord: Tag,
        requires: Tag,
        at: u64,
    },

    #[error("{record}.{subrecord}: invalid value at byte {at}: {reason}")]
    InvalidNumericValue {
        record: Tag,
        subrecord: Tag,
        reason: &'static str,
        at: u64,
    },

    #[error("{record}: compressed payload at byte {at}: {detail}")]
    CompressionError {
        record: Tag,
        detail: String,
        at: u64,
    },

    #[error("{record}.{subrecord}: declared {declared} entries, read {actual}")]
    CountMismatch {
        record: Tag,
        subrecord: Tag,
        declared: u64,
        actual: u64,
    },

    #[error("invalid group at byte {at}: {reason}")]
    InvalidGroup { reason: &'static str, at: u64 },

    #[error("expected {} file header, found {found} at byte {at}", .dialect.file_header_tag())]
    MissingFileHeader { dialect: Dialect, found: Tag, at: u64 },
}

impl DecodeError {
    /// Stable name of the error kind, for machine-readable reports.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::StreamExhausted { .. } => "stream_exhausted",
            Self::UnknownRecordType { .. } => "unknown_record_type",
            Self::UnexpectedSubrecordTag { .. } => "unexpected_subrecord_tag",
            Self::InvalidLength { .. } => "invalid_length",
            Self::RecordOverrun { .. } => "record_overrun",
            Self::DuplicateSubrecord { .. } => "duplicate_subrecord",
            Self::MissingRequiredSubrecord { .. } => "missing_required_subrecord",
            Self::OutOfOrderSubrecord { .. } => "out_of_order_subrecord",
            Self::InvalidNumericValue { .. } => "invalid_numeric_value",
            Self::CompressionError { .. } => "compression_error",
            Self::CountMismatch { .. } => "count_mismatch",
            Self::InvalidGroup { .. } => "invalid_group",
            Self::MissingFileHeader { .. } => "missing_file_header",
        }
    }
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{record}.{subrecord}: {len} bytes do not fit a {limit}-byte maximum")]
    SizeOverflow {
        record: Tag,
        subrecord: Tag,
        len: u64,
        limit: u64,
    },

    #[error("{record}.{subrecord}: character {ch:?} is not representable in Latin-1")]
    UnrepresentableChar { record: Tag, subrecord: Tag, ch: char },

    #[error("{record}: compression failed: {detail}")]
    Compression { record: Tag, detail: String },

    #[error("{record}: shape belongs to the {shape} dialect, writer is {writer}")]
    DialectMismatch {
        record: Tag,
        shape: Dialect,
        writer: Dialect,
    },

    #[error("{record}: measured {measured} payload bytes, wrote {written}")]
    SizeMismatch {
        record: Tag,
        measured: u64,
        written: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_rule_accepts() {
        assert!(LengthRule::Exactly(4).accepts(4));
        assert!(!LengthRule::Exactly(4).accepts(5));
        assert!(LengthRule::AtMost(256).accepts(256));
        assert!(!LengthRule::AtMost(256).accepts(257));
        assert!(LengthRule::MultipleOf(4).accepts(12));
        assert!(!LengthRule::MultipleOf(4).accepts(0));
        assert!(!LengthRule::MultipleOf(4).accepts(6));
    }

    #[test]
    fn unexpected_tag_message_lists_candidates() {
        const EXPECTED: &[Tag] = &[Tag(*b"NAME"), Tag(*b"FNAM")];
        let err = DecodeError::UnexpectedSubrecordTag {
            record: Tag(*b"GLOB"),
            found: Tag(*b"ZZZZ"),
            expected: EXPECTED,
            at: 28,
        };
        assert_eq!(
            err.to_string(),
            "GLOB: unexpected subrecord ZZZZ at byte 28, expected NAME, FNAM"
        );
        assert_eq!(err.kind_name(), "unexpected_subrecord_tag");
    }

    #[test]
    fn missing_header_names_dialect_tag() {
        let err = DecodeError::MissingFileHeader {
            dialect: Dialect::Modern,
            found: Tag(*b"GLOB"),
            at: 0,
        };
        assert_eq!(err.to_string(), "expected TES4 file header, found GLOB at byte 0");
    }

    #[test]
    fn umbrella_converts_from_parts() {
        let err: Error = DecodeError::InvalidGroup {
            reason: "size below header length",
            at: 40,
        }
        .into();
        assert!(matches!(err, Error::Decode(DecodeError::InvalidGroup { at: 40, .. })));
    }
}
