#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A four byte type code such as `CELL` or `EDID`.
///
/// Comparison is exact byte equality; tags are never case-normalized.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const GRUP: Tag = Tag(*b"GRUP");
    pub const XXXX: Tag = Tag(*b"XXXX");
    pub const TES3: Tag = Tag(*b"TES3");
    pub const TES4: Tag = Tag(*b"TES4");

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub const fn from_le_u32(v: u32) -> Self {
        Self(v.to_le_bytes())
    }

    pub const fn to_le_u32(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl FromStr for Tag {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| "tag must be exactly four bytes")?;
        Ok(Self(bytes))
    }
}

#[cfg(feature = "serde")]
impl Serialize for Tag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// File format generation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dialect {
    /// Three-word record headers and `u32` subrecord lengths.
    Legacy,
    /// Five-field record headers, `u16` subrecord lengths, groups and compression.
    Modern,
}

impl Dialect {
    /// Bytes before a record's payload, tag included.
    pub const fn record_header_len(self) -> usize {
        match self {
            Self::Legacy => 16,
            Self::Modern => 24,
        }
    }

    /// Width of the length field that follows every subrecord tag.
    pub const fn length_field_len(self) -> usize {
        match self {
            Self::Legacy => 4,
            Self::Modern => 2,
        }
    }

    /// Size of the string buffer the dialect's tools read into. A NUL-terminated
    /// string subrecord must declare fewer bytes than this.
    pub const fn max_string_len(self) -> usize {
        match self {
            Self::Legacy => 256,
            Self::Modern => 512,
        }
    }

    /// Tag of the record every file of this dialect starts with.
    pub const fn file_header_tag(self) -> Tag {
        match self {
            Self::Legacy => Tag::TES3,
            Self::Modern => Tag::TES4,
        }
    }

    pub fn from_file_header_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::TES3 => Some(Self::Legacy),
            Tag::TES4 => Some(Self::Modern),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Modern => "modern",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bits of a record header's flags word.
pub mod flags {
    /// File header only: the file is a master.
    pub const MASTER: u32 = 0x0000_0001;
    /// Modern records: logically deleted, payload is not walked.
    pub const DELETED: u32 = 0x0000_0020;
    /// Modern file header only: string subrecords hold string-table indices.
    pub const LOCALIZED: u32 = 0x0000_0080;
    /// Legacy records: persistent reference.
    pub const LEGACY_PERSISTENT: u32 = 0x0000_0400;
    pub const IGNORED: u32 = 0x0000_1000;
    /// Legacy records: blocked from editing.
    pub const LEGACY_BLOCKED: u32 = 0x0000_2000;
    /// Modern records: payload is `decompressed_size:u32 | zlib`.
    pub const COMPRESSED: u32 = 0x0004_0000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matches_little_endian_constant() {
        // "GRUP" read as a little-endian u32.
        assert_eq!(Tag::GRUP.to_le_u32(), 0x5055_5247);
        assert_eq!(Tag::from_le_u32(0x3453_4554), Tag::TES4);
    }

    #[test]
    fn tag_display_escapes_non_printable_bytes() {
        assert_eq!(Tag(*b"NPC_").to_string(), "NPC_");
        assert_eq!(Tag([b'A', 0, b'B', 0xff]).to_string(), "A\\x00B\\xff");
    }

    #[test]
    fn tag_parses_only_four_bytes() {
        assert_eq!("EDID".parse::<Tag>().unwrap(), Tag(*b"EDID"));
        assert!("EDI".parse::<Tag>().is_err());
        assert!("EDIDX".parse::<Tag>().is_err());
    }

    #[test]
    fn dialect_is_detected_from_file_header() {
        assert_eq!(Dialect::from_file_header_tag(Tag::TES3), Some(Dialect::Legacy));
        assert_eq!(Dialect::from_file_header_tag(Tag::TES4), Some(Dialect::Modern));
        assert_eq!(Dialect::from_file_header_tag(Tag::GRUP), None);
        assert_eq!(Dialect::Modern.record_header_len(), 24);
        assert_eq!(Dialect::Legacy.length_field_len(), 4);
    }
}
