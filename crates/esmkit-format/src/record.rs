//! Decoded records and the interface every record shape implements.

use crate::compression;
use crate::config::CompressionPolicy;
use crate::header::RecordHeader;
use crate::localization::StringLookup;
use crate::subrecord::{PayloadSink, SizeAccumulator, SubrecordCursor, SubrecordWriter};
use esmkit_core::{flags, DecodeError, Dialect, EncodeError, Tag};
use std::any::Any;
use std::fmt;
use tracing::{debug, warn};

/// Per-file state handed to shape decoders.
#[derive(Clone, Copy)]
pub struct DecodeContext<'t> {
    pub dialect: Dialect,
    /// String subrecords hold string-table indices (modern file header flag).
    pub localized: bool,
    pub strings: Option<&'t dyn StringLookup>,
}

impl<'t> DecodeContext<'t> {
    pub const fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            localized: false,
            strings: None,
        }
    }

    pub const fn localized(mut self, localized: bool) -> Self {
        self.localized = localized;
        self
    }

    pub fn with_strings(mut self, strings: &'t dyn StringLookup) -> Self {
        self.strings = Some(strings);
        self
    }
}

impl fmt::Debug for DecodeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeContext")
            .field("dialect", &self.dialect)
            .field("localized", &self.localized)
            .field("strings", &self.strings.is_some())
            .finish()
    }
}

/// A concrete record layout: which subrecords, in which order, with which
/// field codecs.
///
/// `decode` reads subrecords until the grammar is satisfied; anything left in
/// the payload afterwards is rejected by the caller. `encode` is walked twice,
/// once to measure and once to write, so it must emit the same bytes both times.
pub trait RecordShape: fmt::Debug + Clone + PartialEq + Send + Sync + 'static {
    const TAG: Tag;
    const DIALECT: Dialect;

    fn decode(cursor: &mut SubrecordCursor<'_>, ctx: &DecodeContext<'_>) -> Result<Self, DecodeError>;

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<(), EncodeError>;

    fn editor_id(&self) -> Option<&str> {
        None
    }
}

/// Object-safe view of a [`RecordShape`], implemented for every shape.
pub trait DynShape: fmt::Debug + Send + Sync {
    fn tag(&self) -> Tag;
    fn dialect(&self) -> Dialect;
    fn encode_dyn(&self, out: &mut SubrecordWriter<'_>) -> Result<(), EncodeError>;
    fn editor_id(&self) -> Option<&str>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_box(&self) -> Box<dyn DynShape>;
    fn eq_dyn(&self, other: &dyn DynShape) -> bool;
}

impl<S: RecordShape> DynShape for S {
    fn tag(&self) -> Tag {
        S::TAG
    }

    fn dialect(&self) -> Dialect {
        S::DIALECT
    }

    fn encode_dyn(&self, out: &mut SubrecordWriter<'_>) -> Result<(), EncodeError> {
        self.encode(out)
    }

    fn editor_id(&self) -> Option<&str> {
        RecordShape::editor_id(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn DynShape> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn DynShape) -> bool {
        other.as_any().downcast_ref::<S>() == Some(self)
    }
}

impl Clone for Box<dyn DynShape> {
    fn clone(&self) -> Self {
        (**self).clone_box()
    }
}

impl PartialEq for Box<dyn DynShape> {
    fn eq(&self, other: &Self) -> bool {
        (**self).eq_dyn(&**other)
    }
}

pub type DecodeFn =
    fn(&mut SubrecordCursor<'_>, &DecodeContext<'_>) -> Result<Box<dyn DynShape>, DecodeError>;

pub fn decode_boxed<S: RecordShape>(
    cursor: &mut SubrecordCursor<'_>,
    ctx: &DecodeContext<'_>,
) -> Result<Box<dyn DynShape>, DecodeError> {
    Ok(Box::new(S::decode(cursor, ctx)?))
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordBody {
    Fields(Box<dyn DynShape>),
    /// A modern record flagged deleted. Its stored payload is kept verbatim
    /// and never walked.
    Tombstone { residual: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub tag: Tag,
    pub header: RecordHeader,
    pub body: RecordBody,
}

/// Forwards to another sink, counting bytes.
struct CountingSink<'s> {
    inner: &'s mut dyn PayloadSink,
    count: u64,
}

impl PayloadSink for CountingSink<'_> {
    fn put(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.inner.put(bytes)?;
        self.count += bytes.len() as u64;
        Ok(())
    }
}

impl Record {
    pub fn new<S: RecordShape>(header: RecordHeader, shape: S) -> Self {
        Self {
            tag: S::TAG,
            header,
            body: RecordBody::Fields(Box::new(shape)),
        }
    }

    /// An empty deleted record. The header gets the deleted flag.
    pub fn tombstone(tag: Tag, mut header: RecordHeader) -> Self {
        header.flags |= flags::DELETED;
        header.size = 0;
        Self {
            tag,
            header,
            body: RecordBody::Tombstone {
                residual: Vec::new(),
            },
        }
    }

    pub const fn dialect(&self) -> Dialect {
        self.header.dialect()
    }

    pub const fn is_tombstone(&self) -> bool {
        matches!(self.body, RecordBody::Tombstone { .. })
    }

    pub fn fields(&self) -> Option<&dyn DynShape> {
        match &self.body {
            RecordBody::Fields(shape) => Some(shape.as_ref()),
            RecordBody::Tombstone { .. } => None,
        }
    }

    pub fn shape<S: RecordShape>(&self) -> Option<&S> {
        self.fields()?.as_any().downcast_ref::<S>()
    }

    pub fn shape_mut<S: RecordShape>(&mut self) -> Option<&mut S> {
        match &mut self.body {
            RecordBody::Fields(shape) => shape.as_any_mut().downcast_mut::<S>(),
            RecordBody::Tombstone { .. } => None,
        }
    }

    pub fn editor_id(&self) -> Option<&str> {
        self.fields()?.editor_id()
    }

    fn checked_shape(&self) -> Result<Option<&dyn DynShape>, EncodeError> {
        match self.fields() {
            Some(shape) if shape.dialect() != self.dialect() => Err(EncodeError::DialectMismatch {
                record: self.tag,
                shape: shape.dialect(),
                writer: self.dialect(),
            }),
            other => Ok(other),
        }
    }

    /// Uncompressed payload size, measured by replaying `encode`.
    pub fn write_size(&self) -> Result<u64, EncodeError> {
        match self.checked_shape()? {
            Some(shape) => {
                let mut size = SizeAccumulator::new();
                shape.encode_dyn(&mut SubrecordWriter::new(&mut size, self.tag, self.dialect()))?;
                Ok(size.total())
            }
            None => Ok(self.residual_len()),
        }
    }

    fn residual_len(&self) -> u64 {
        match &self.body {
            RecordBody::Tombstone { residual } => residual.len() as u64,
            RecordBody::Fields(_) => 0,
        }
    }

    fn size_field(&self, len: u64) -> Result<u32, EncodeError> {
        u32::try_from(len).map_err(|_| EncodeError::SizeOverflow {
            record: self.tag,
            subrecord: self.tag,
            len,
            limit: u64::from(u32::MAX),
        })
    }

    /// Writes header and payload. Returns the number of bytes written.
    ///
    /// The header's size and compressed flag are derived here; the stored
    /// `header.size` is ignored.
    pub fn encode(&self, sink: &mut dyn PayloadSink, policy: CompressionPolicy) -> Result<u64, EncodeError> {
        let dialect = self.dialect();
        let header_len = dialect.record_header_len() as u64;
        let mut header = self.header;

        let shape = match &self.body {
            RecordBody::Tombstone { residual } => {
                header.size = self.size_field(residual.len() as u64)?;
                header.write(self.tag, sink)?;
                sink.put(residual)?;
                return Ok(header_len + residual.len() as u64);
            }
            RecordBody::Fields(shape) => shape.as_ref(),
        };

        let measured = self.write_size()?;
        let mismatch = |written: u64| EncodeError::SizeMismatch {
            record: self.tag,
            measured,
            written,
        };

        if policy.should_compress(dialect, self.header.is_compressed()) {
            let mut raw = Vec::with_capacity(usize::try_from(measured).unwrap_or(0));
            shape.encode_dyn(&mut SubrecordWriter::new(&mut raw, self.tag, dialect))?;
            if raw.len() as u64 != measured {
                return Err(mismatch(raw.len() as u64));
            }
            let stored = compression::deflate(self.tag, &raw)?;
            header.flags |= flags::COMPRESSED;
            header.size = self.size_field(stored.len() as u64)?;
            header.write(self.tag, sink)?;
            sink.put(&stored)?;
            return Ok(header_len + stored.len() as u64);
        }

        if dialect == Dialect::Modern {
            header.flags &= !flags::COMPRESSED;
        }
        header.size = self.size_field(measured)?;
        header.write(self.tag, sink)?;
        let mut counting = CountingSink {
            inner: sink,
            count: 0,
        };
        shape.encode_dyn(&mut SubrecordWriter::new(&mut counting, self.tag, dialect))?;
        if counting.count != measured {
            return Err(mismatch(counting.count));
        }
        Ok(header_len + measured)
    }

    /// Encodes into a fresh buffer.
    pub fn to_bytes(&self, policy: CompressionPolicy) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        self.encode(&mut out, policy)?;
        Ok(out)
    }
}

/// Turns a record's stored payload into a [`Record`].
///
/// `stored` is exactly `header.size` bytes starting at offset `at`. A deleted
/// modern record short-circuits to a tombstone without walking its payload.
pub fn decode_payload(
    tag: Tag,
    header: RecordHeader,
    stored: &[u8],
    at: u64,
    ctx: &DecodeContext<'_>,
    decode: DecodeFn,
) -> Result<Record, DecodeError> {
    if header.is_deleted() {
        if !stored.is_empty() {
            warn!(record = %tag, at, size = stored.len(), "deleted record carries a payload; kept unparsed");
        }
        return Ok(Record {
            tag,
            header,
            body: RecordBody::Tombstone {
                residual: stored.to_vec(),
            },
        });
    }

    let shape = if header.is_compressed() {
        let inflated = compression::inflate(tag, stored, at)?;
        // Offsets in an inflated payload count from its first byte.
        let mut cursor = SubrecordCursor::new(tag, ctx.dialect, &inflated, 0);
        let shape = decode(&mut cursor, ctx)?;
        cursor.finish()?;
        shape
    } else {
        let mut cursor = SubrecordCursor::new(tag, ctx.dialect, stored, at);
        let shape = decode(&mut cursor, ctx)?;
        cursor.finish()?;
        shape
    };

    debug!(record = %tag, at, size = header.size, form_id = ?header.form_id(), "decoded record");
    Ok(Record {
        tag,
        header,
        body: RecordBody::Fields(shape),
    })
}
