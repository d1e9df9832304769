use crate::cursor::ByteReader;
use crate::subrecord::PayloadSink;
use esmkit_core::{flags, DecodeError, Dialect, EncodeError, Tag};

/// Dialect-specific header words that follow `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMeta {
    /// Opaque, kept verbatim.
    Legacy { header_one: u32 },
    Modern {
        form_id: u32,
        revision: u32,
        version: u16,
        unknown: u16,
    },
}

/// The fixed header in front of every record payload.
///
/// `size` is the payload length as stored, which for a compressed record is
/// the length of the `decompressed_size | zlib` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub size: u32,
    pub flags: u32,
    pub meta: HeaderMeta,
}

impl RecordHeader {
    pub const fn legacy(flags: u32) -> Self {
        Self {
            size: 0,
            flags,
            meta: HeaderMeta::Legacy { header_one: 0 },
        }
    }

    pub const fn modern(flags: u32, form_id: u32) -> Self {
        Self {
            size: 0,
            flags,
            meta: HeaderMeta::Modern {
                form_id,
                revision: 0,
                version: 0,
                unknown: 0,
            },
        }
    }

    pub const fn dialect(&self) -> Dialect {
        match self.meta {
            HeaderMeta::Legacy { .. } => Dialect::Legacy,
            HeaderMeta::Modern { .. } => Dialect::Modern,
        }
    }

    pub const fn form_id(&self) -> Option<u32> {
        match self.meta {
            HeaderMeta::Legacy { .. } => None,
            HeaderMeta::Modern { form_id, .. } => Some(form_id),
        }
    }

    /// Header tombstone. Legacy files mark deletion inside the payload instead.
    pub const fn is_deleted(&self) -> bool {
        matches!(self.meta, HeaderMeta::Modern { .. }) && self.flags & flags::DELETED != 0
    }

    pub const fn is_compressed(&self) -> bool {
        matches!(self.meta, HeaderMeta::Modern { .. }) && self.flags & flags::COMPRESSED != 0
    }

    pub const fn is_localized(&self) -> bool {
        matches!(self.meta, HeaderMeta::Modern { .. }) && self.flags & flags::LOCALIZED != 0
    }

    /// Reads the header words after the tag.
    pub fn read(reader: &mut ByteReader<'_>, dialect: Dialect) -> Result<Self, DecodeError> {
        let size = reader.read::<u32>()?;
        match dialect {
            Dialect::Legacy => {
                let header_one = reader.read::<u32>()?;
                let flags = reader.read::<u32>()?;
                Ok(Self {
                    size,
                    flags,
                    meta: HeaderMeta::Legacy { header_one },
                })
            }
            Dialect::Modern => {
                let flags = reader.read::<u32>()?;
                let form_id = reader.read::<u32>()?;
                let revision = reader.read::<u32>()?;
                let version = reader.read::<u16>()?;
                let unknown = reader.read::<u16>()?;
                Ok(Self {
                    size,
                    flags,
                    meta: HeaderMeta::Modern {
                        form_id,
                        revision,
                        version,
                        unknown,
                    },
                })
            }
        }
    }

    /// Writes tag and header words. `size` must already be final.
    pub fn write(&self, tag: Tag, sink: &mut dyn PayloadSink) -> Result<(), EncodeError> {
        sink.put(tag.as_bytes())?;
        sink.put(&self.size.to_le_bytes())?;
        match self.meta {
            HeaderMeta::Legacy { header_one } => {
                sink.put(&header_one.to_le_bytes())?;
                sink.put(&self.flags.to_le_bytes())
            }
            HeaderMeta::Modern {
                form_id,
                revision,
                version,
                unknown,
            } => {
                sink.put(&self.flags.to_le_bytes())?;
                sink.put(&form_id.to_le_bytes())?;
                sink.put(&revision.to_le_bytes())?;
                sink.put(&version.to_le_bytes())?;
                sink.put(&unknown.to_le_bytes())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_u32(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    #[test]
    fn reads_modern_header_fields() {
        let mut bytes = Vec::new();
        put_u32(&mut bytes, 0x52);
        put_u32(&mut bytes, flags::COMPRESSED | flags::IGNORED);
        put_u32(&mut bytes, 0x0001_2345);
        put_u32(&mut bytes, 7);
        bytes.extend_from_slice(&40u16.to_le_bytes());
        bytes.extend_from_slice(&3u16.to_le_bytes());

        let mut r = ByteReader::new(&bytes);
        let h = RecordHeader::read(&mut r, Dialect::Modern).unwrap();
        assert_eq!(h.size, 0x52);
        assert_eq!(h.form_id(), Some(0x0001_2345));
        assert!(h.is_compressed());
        assert!(!h.is_deleted());
        assert_eq!(
            h.meta,
            HeaderMeta::Modern {
                form_id: 0x0001_2345,
                revision: 7,
                version: 40,
                unknown: 3
            }
        );
        assert_eq!(r.position(), 20);
    }

    #[test]
    fn legacy_header_keeps_opaque_word_and_ignores_modern_bits() {
        let mut bytes = Vec::new();
        put_u32(&mut bytes, 12);
        put_u32(&mut bytes, 0xdead_beef);
        put_u32(&mut bytes, flags::DELETED | flags::COMPRESSED);

        let h = RecordHeader::read(&mut ByteReader::new(&bytes), Dialect::Legacy).unwrap();
        assert_eq!(h.meta, HeaderMeta::Legacy { header_one: 0xdead_beef });
        assert!(!h.is_deleted());
        assert!(!h.is_compressed());

        let mut out = Vec::new();
        h.write(Tag(*b"GLOB"), &mut out).unwrap();
        assert_eq!(&out[..4], b"GLOB");
        assert_eq!(&out[4..], &bytes[..]);
    }

    #[test]
    fn truncated_header_is_stream_exhausted() {
        let bytes = [0u8; 10];
        let err = RecordHeader::read(&mut ByteReader::new(&bytes), Dialect::Modern).unwrap_err();
        assert!(matches!(err, DecodeError::StreamExhausted { at: 8, .. }));
    }
}
