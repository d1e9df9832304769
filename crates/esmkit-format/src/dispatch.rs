//! Top-level walk: tag lookup, record decode and modern-dialect groups.

use crate::config::{CompressionPolicy, ReadOptions};
use crate::cursor::ByteReader;
use crate::header::RecordHeader;
use crate::localization::StringLookup;
use crate::record::{decode_payload, DecodeContext, Record};
use crate::registry::ShapeRegistry;
use crate::subrecord::PayloadSink;
use esmkit_core::{DecodeError, Dialect, EncodeError, Tag};
use tracing::debug;

/// Bytes in a `GRUP` header, tag included.
pub const GROUP_HEADER_LEN: usize = 24;

const MAX_GROUP_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupHeader {
    pub label: [u8; 4],
    pub group_type: i32,
    pub stamp: u16,
    pub unknown_1: u16,
    pub version: u16,
    pub unknown_2: u16,
}

impl GroupHeader {
    /// Label read as a tag; meaningful for top-level groups (`group_type == 0`).
    pub const fn label_tag(&self) -> Tag {
        Tag(self.label)
    }

    /// Label read as a form ID, for groups that belong to a parent record.
    pub const fn label_form_id(&self) -> u32 {
        u32::from_le_bytes(self.label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupContents {
    Entries(Vec<Entry>),
    /// Undecoded contents, kept when group descent is off.
    Raw(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub header: GroupHeader,
    pub contents: GroupContents,
}

impl Group {
    pub fn entries(&self) -> &[Entry] {
        match &self.contents {
            GroupContents::Entries(entries) => entries,
            GroupContents::Raw(_) => &[],
        }
    }

    /// Encodes contents first so the header can carry the final size.
    pub fn encode(&self, sink: &mut dyn PayloadSink, policy: CompressionPolicy) -> Result<u64, EncodeError> {
        let mut body = Vec::new();
        match &self.contents {
            GroupContents::Entries(entries) => {
                for entry in entries {
                    entry.encode(&mut body, policy)?;
                }
            }
            GroupContents::Raw(raw) => body.extend_from_slice(raw),
        }
        let total = (GROUP_HEADER_LEN + body.len()) as u64;
        let size = u32::try_from(total).map_err(|_| EncodeError::SizeOverflow {
            record: Tag::GRUP,
            subrecord: Tag(self.header.label),
            len: total,
            limit: u64::from(u32::MAX),
        })?;
        let h = &self.header;
        sink.put(Tag::GRUP.as_bytes())?;
        sink.put(&size.to_le_bytes())?;
        sink.put(&h.label)?;
        sink.put(&h.group_type.to_le_bytes())?;
        sink.put(&h.stamp.to_le_bytes())?;
        sink.put(&h.unknown_1.to_le_bytes())?;
        sink.put(&h.version.to_le_bytes())?;
        sink.put(&h.unknown_2.to_le_bytes())?;
        sink.put(&body)?;
        Ok(total)
    }
}

/// One top-level item of a file: a record or a group of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Record(Record),
    Group(Group),
}

impl Entry {
    pub fn encode(&self, sink: &mut dyn PayloadSink, policy: CompressionPolicy) -> Result<u64, EncodeError> {
        match self {
            Self::Record(record) => record.encode(sink, policy),
            Self::Group(group) => group.encode(sink, policy),
        }
    }

    pub const fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            Self::Group(_) => None,
        }
    }
}

/// Drives tag lookup and record decoding over a byte stream.
#[derive(Debug, Clone)]
pub struct RecordDispatcher {
    registry: ShapeRegistry,
    options: ReadOptions,
}

impl Default for RecordDispatcher {
    fn default() -> Self {
        Self::new(ShapeRegistry::with_builtin_shapes())
    }
}

impl RecordDispatcher {
    pub fn new(registry: ShapeRegistry) -> Self {
        Self {
            registry,
            options: ReadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    pub const fn options(&self) -> &ReadOptions {
        &self.options
    }

    pub const fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    /// Reads one record, or one whole group in the modern dialect.
    ///
    /// An unregistered tag is fatal: its size is only trustworthy once the
    /// shape is known, so there is no resynchronisation.
    pub fn read_record(&self, reader: &mut ByteReader<'_>, ctx: &DecodeContext<'_>) -> Result<Entry, DecodeError> {
        self.read_entry(reader, ctx, 0)
    }

    fn read_entry(
        &self,
        reader: &mut ByteReader<'_>,
        ctx: &DecodeContext<'_>,
        depth: usize,
    ) -> Result<Entry, DecodeError> {
        let at = reader.position();
        let tag = reader.peek_tag()?;
        if ctx.dialect == Dialect::Modern && tag == Tag::GRUP {
            return self.read_group(reader, ctx, depth).map(Entry::Group);
        }
        let decode = self
            .registry
            .lookup(ctx.dialect, tag)
            .ok_or(DecodeError::UnknownRecordType { tag, at })?;

        let mut ahead = reader.clone();
        ahead.read_tag()?;
        let header = RecordHeader::read(&mut ahead, ctx.dialect)?;
        let payload_at = ahead.position();
        let stored = ahead.read_bytes(header.size as usize)?;
        let record = decode_payload(tag, header, stored, payload_at, ctx, decode)?;
        *reader = ahead;
        Ok(Entry::Record(record))
    }

    fn read_group(
        &self,
        reader: &mut ByteReader<'_>,
        ctx: &DecodeContext<'_>,
        depth: usize,
    ) -> Result<Group, DecodeError> {
        let at = reader.position();
        if depth >= MAX_GROUP_DEPTH {
            return Err(DecodeError::InvalidGroup {
                reason: "groups nested too deeply",
                at,
            });
        }
        let mut ahead = reader.clone();
        ahead.read_tag()?;
        let size = ahead.read::<u32>()? as usize;
        let header = GroupHeader {
            label: ahead.read_array::<4>()?,
            group_type: ahead.read::<i32>()?,
            stamp: ahead.read::<u16>()?,
            unknown_1: ahead.read::<u16>()?,
            version: ahead.read::<u16>()?,
            unknown_2: ahead.read::<u16>()?,
        };
        let content_len = size.checked_sub(GROUP_HEADER_LEN).ok_or(DecodeError::InvalidGroup {
            reason: "group size is smaller than its header",
            at,
        })?;
        let content_at = ahead.position();
        let content = ahead.read_bytes(content_len)?;

        let contents = if self.options.descend_groups {
            let mut inner = ByteReader::with_base(content, content_at);
            let mut entries = Vec::new();
            while !inner.is_empty() {
                let child_at = inner.position();
                if entry_len(&inner, ctx.dialect).map_or(true, |len| len > inner.remaining()) {
                    return Err(DecodeError::InvalidGroup {
                        reason: "group contents overrun the group boundary",
                        at: child_at,
                    });
                }
                entries.push(self.read_entry(&mut inner, ctx, depth + 1)?);
            }
            GroupContents::Entries(entries)
        } else {
            GroupContents::Raw(content.to_vec())
        };

        debug!(
            at,
            size,
            label = %Tag(header.label),
            group_type = header.group_type,
            "read group"
        );
        *reader = ahead;
        Ok(Group { header, contents })
    }

    /// Reads a whole file: the dialect's file header, then every entry.
    ///
    /// Any failure discards everything decoded so far.
    pub fn read_all(&self, bytes: &[u8]) -> Result<(Dialect, Vec<Entry>), DecodeError> {
        self.read_all_with(bytes, None)
    }

    pub fn read_all_with(
        &self,
        bytes: &[u8],
        strings: Option<&dyn StringLookup>,
    ) -> Result<(Dialect, Vec<Entry>), DecodeError> {
        let mut reader = ByteReader::new(bytes);
        let first = reader.peek_tag()?;
        let dialect = match self.options.dialect {
            Some(dialect) => dialect,
            None => Dialect::from_file_header_tag(first)
                .ok_or(DecodeError::UnknownRecordType { tag: first, at: 0 })?,
        };
        if self.options.require_file_header && first != dialect.file_header_tag() {
            return Err(DecodeError::MissingFileHeader {
                dialect,
                found: first,
                at: 0,
            });
        }

        let mut ctx = DecodeContext {
            dialect,
            localized: false,
            strings,
        };
        let mut entries = Vec::new();
        if first == dialect.file_header_tag() {
            let header = self.read_record(&mut reader, &ctx)?;
            if let Entry::Record(record) = &header {
                ctx.localized = record.header.is_localized();
            }
            entries.push(header);
        }
        if let Some(localized) = self.options.localized {
            ctx.localized = localized;
        }

        while !reader.is_empty() {
            entries.push(self.read_record(&mut reader, &ctx)?);
        }
        debug!(dialect = %dialect, entries = entries.len(), "read file");
        Ok((dialect, entries))
    }
}

/// Full length of the record or group at the reader, from its header.
fn entry_len(reader: &ByteReader<'_>, dialect: Dialect) -> Option<usize> {
    let head = reader.peek_array::<8>().ok()?;
    let size = u32::from_le_bytes([head[4], head[5], head[6], head[7]]) as usize;
    if dialect == Dialect::Modern && head[..4] == *Tag::GRUP.as_bytes() {
        Some(size)
    } else {
        size.checked_add(dialect.record_header_len())
    }
}
