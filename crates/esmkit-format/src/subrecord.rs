//! Subrecord framing: the bounded walk over a record payload and its mirror
//! image on the encode side.
//!
//! Decode and measure share one grammar. Every shape writes its payload through
//! a [`SubrecordWriter`]; pointing that writer at a [`SizeAccumulator`] yields the
//! payload size the header must declare, pointing it at a real sink yields the
//! bytes. The two can only disagree if the shape's `encode` is
//! non-deterministic.

use crate::cursor::{ByteReader, ByteWriter};
use crate::field::{self, FloatDomain, Scalar};
use crate::localization::LocalizedString;
use esmkit_core::{DecodeError, Dialect, EncodeError, LengthRule, Tag};
use std::io::Write;

/// Longest body accepted for a NUL-terminated string in `dialect`.
pub const fn string_limit(dialect: Dialect) -> usize {
    dialect.max_string_len() - 1
}

/// One subrecord, borrowed from the record payload.
#[derive(Debug, Clone, Copy)]
pub struct Subrecord<'a> {
    pub tag: Tag,
    /// Offset of the subrecord's tag, or of its `XXXX` prefix.
    pub at: u64,
    record: Tag,
    dialect: Dialect,
    body: &'a [u8],
    body_at: u64,
}

impl<'a> Subrecord<'a> {
    pub const fn body(&self) -> &'a [u8] {
        self.body
    }

    pub const fn len(&self) -> usize {
        self.body.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Reader over the body, for fixed structures with several fields.
    pub const fn reader(&self) -> ByteReader<'a> {
        ByteReader::with_base(self.body, self.body_at)
    }

    pub fn check_len(&self, rule: LengthRule) -> Result<(), DecodeError> {
        if rule.accepts(self.body.len()) {
            Ok(())
        } else {
            Err(DecodeError::InvalidLength {
                record: self.record,
                subrecord: self.tag,
                expected: rule,
                actual: self.body.len(),
                at: self.at,
            })
        }
    }

    pub fn invalid_value(&self, reason: &'static str) -> DecodeError {
        DecodeError::InvalidNumericValue {
            record: self.record,
            subrecord: self.tag,
            reason,
            at: self.body_at,
        }
    }

    pub fn fixed<T: Scalar>(&self) -> Result<T, DecodeError> {
        self.check_len(LengthRule::Exactly(T::SIZE))?;
        Ok(T::from_le_slice(self.body))
    }

    pub fn float(&self, domain: FloatDomain) -> Result<f32, DecodeError> {
        let value = self.fixed::<f32>()?;
        domain.check(value).map_err(|reason| self.invalid_value(reason))
    }

    pub fn blob<const N: usize>(&self) -> Result<[u8; N], DecodeError> {
        self.check_len(LengthRule::Exactly(N))?;
        let mut out = [0u8; N];
        out.copy_from_slice(self.body);
        Ok(out)
    }

    /// NUL-terminated string under the dialect's ceiling.
    pub fn string(&self) -> Result<String, DecodeError> {
        self.string_bounded(string_limit(self.dialect))
    }

    pub fn string_bounded(&self, max_len: usize) -> Result<String, DecodeError> {
        self.check_len(LengthRule::AtMost(max_len))?;
        Ok(field::decode_latin1(self.body))
    }

    /// A non-empty run of `T`s filling the whole body.
    pub fn array<T: Scalar>(&self) -> Result<Vec<T>, DecodeError> {
        self.check_len(LengthRule::MultipleOf(T::SIZE))?;
        Ok(self.body.chunks_exact(T::SIZE).map(T::from_le_slice).collect())
    }

    /// A string-table index when `localized`, inline text otherwise.
    pub fn localized(&self, localized: bool) -> Result<LocalizedString, DecodeError> {
        if localized {
            Ok(LocalizedString::Index(self.fixed::<u32>()?))
        } else {
            Ok(LocalizedString::Inline(self.string()?))
        }
    }
}

/// Walks a record payload subrecord by subrecord.
///
/// `consumed` never exceeds `declared`: every frame is bounds-checked against
/// the declared size before any of its bytes are taken.
#[derive(Debug, Clone)]
pub struct SubrecordCursor<'a> {
    reader: ByteReader<'a>,
    record: Tag,
    dialect: Dialect,
    declared: usize,
    consumed: usize,
}

impl<'a> SubrecordCursor<'a> {
    /// `payload` is exactly the record's declared payload; `base` is its offset.
    pub const fn new(record: Tag, dialect: Dialect, payload: &'a [u8], base: u64) -> Self {
        Self {
            reader: ByteReader::with_base(payload, base),
            record,
            dialect,
            declared: payload.len(),
            consumed: 0,
        }
    }

    pub const fn record(&self) -> Tag {
        self.record
    }

    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub const fn declared(&self) -> usize {
        self.declared
    }

    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    pub const fn remaining(&self) -> usize {
        self.declared - self.consumed
    }

    pub const fn position(&self) -> u64 {
        self.reader.position()
    }

    fn overrun(&self, consumed: usize) -> DecodeError {
        DecodeError::RecordOverrun {
            record: self.record,
            declared: self.declared,
            consumed,
            at: self.reader.position(),
        }
    }

    fn claim(&mut self, n: usize) -> Result<(), DecodeError> {
        match self.consumed.checked_add(n) {
            Some(total) if total <= self.declared => {
                self.consumed = total;
                Ok(())
            }
            Some(total) => Err(self.overrun(total)),
            None => Err(self.overrun(usize::MAX)),
        }
    }

    fn frame_header(&mut self) -> Result<(Tag, usize), DecodeError> {
        let header_len = 4 + self.dialect.length_field_len();
        let mut ahead = self.clone();
        ahead.claim(header_len)?;
        let tag = ahead.reader.read_tag()?;
        let len = match self.dialect {
            Dialect::Legacy => usize::try_from(ahead.reader.read::<u32>()?).unwrap_or(usize::MAX),
            Dialect::Modern => usize::from(ahead.reader.read::<u16>()?),
        };
        *self = ahead;
        Ok((tag, len))
    }

    fn take_body(&mut self, len: usize) -> Result<(&'a [u8], u64), DecodeError> {
        let mut ahead = self.clone();
        ahead.claim(len)?;
        let at = ahead.reader.position();
        let body = ahead.reader.read_bytes(len)?;
        *self = ahead;
        Ok((body, at))
    }

    /// Next subrecord, or `None` once the payload is consumed exactly.
    ///
    /// A modern `XXXX` prefix is folded into the subrecord it sizes; its bytes
    /// still count toward `consumed`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<Subrecord<'a>>, DecodeError> {
        if self.consumed == self.declared {
            return Ok(None);
        }
        let at = self.reader.position();
        let (mut tag, mut len) = self.frame_header()?;
        if self.dialect == Dialect::Modern && tag == Tag::XXXX {
            if len != 4 {
                return Err(DecodeError::InvalidLength {
                    record: self.record,
                    subrecord: Tag::XXXX,
                    expected: LengthRule::Exactly(4),
                    actual: len,
                    at,
                });
            }
            let (size, _) = self.take_body(4)?;
            let real_len = u32::from_le_slice(size);
            (tag, _) = self.frame_header()?;
            len = usize::try_from(real_len).unwrap_or(usize::MAX);
        }
        let (body, body_at) = self.take_body(len)?;
        Ok(Some(Subrecord {
            tag,
            at,
            record: self.record,
            dialect: self.dialect,
            body,
            body_at,
        }))
    }

    pub fn peek_tag(&self) -> Result<Option<Tag>, DecodeError> {
        Ok(self.clone().next()?.map(|sub| sub.tag))
    }

    /// The next subrecord, which must carry `tag`.
    pub fn expect(&mut self, tag: Tag, expected: &'static [Tag]) -> Result<Subrecord<'a>, DecodeError> {
        match self.next()? {
            Some(sub) if sub.tag == tag => Ok(sub),
            Some(sub) => Err(self.unexpected(&sub, expected)),
            None => Err(self.missing(tag)),
        }
    }

    /// Fails if anything is left in the payload.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        match self.next()? {
            Some(sub) => Err(self.unexpected(&sub, &[])),
            None => Ok(()),
        }
    }

    /// Stores `read(sub)` into an at-most-once slot.
    pub fn once<T>(
        &self,
        slot: &mut Option<T>,
        sub: &Subrecord<'a>,
        read: impl FnOnce(&Subrecord<'a>) -> Result<T, DecodeError>,
    ) -> Result<(), DecodeError> {
        if slot.is_some() {
            return Err(self.duplicate(sub));
        }
        *slot = Some(read(sub)?);
        Ok(())
    }

    pub fn required<T>(&self, slot: Option<T>, tag: Tag) -> Result<T, DecodeError> {
        slot.ok_or_else(|| self.missing(tag))
    }

    pub fn unexpected(&self, sub: &Subrecord<'_>, expected: &'static [Tag]) -> DecodeError {
        DecodeError::UnexpectedSubrecordTag {
            record: self.record,
            found: sub.tag,
            expected,
            at: sub.at,
        }
    }

    pub fn duplicate(&self, sub: &Subrecord<'_>) -> DecodeError {
        DecodeError::DuplicateSubrecord {
            record: self.record,
            subrecord: sub.tag,
            at: sub.at,
        }
    }

    pub fn missing(&self, tag: Tag) -> DecodeError {
        DecodeError::MissingRequiredSubrecord {
            record: self.record,
            subrecord: tag,
            at: self.reader.position(),
        }
    }

    pub fn out_of_order(&self, sub: &Subrecord<'_>, requires: Tag) -> DecodeError {
        DecodeError::OutOfOrderSubrecord {
            record: self.record,
            subrecord: sub.tag,
            requires,
            at: sub.at,
        }
    }
}

/// Destination of encoded payload bytes.
pub trait PayloadSink {
    fn put(&mut self, bytes: &[u8]) -> Result<(), EncodeError>;
}

impl PayloadSink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl<W: Write> PayloadSink for ByteWriter<W> {
    fn put(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        Ok(self.write_bytes(bytes)?)
    }
}

/// Sink that only counts. Used to compute the size a header must declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeAccumulator {
    total: u64,
}

impl SizeAccumulator {
    pub const fn new() -> Self {
        Self { total: 0 }
    }

    pub const fn total(&self) -> u64 {
        self.total
    }
}

impl PayloadSink for SizeAccumulator {
    fn put(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.total += bytes.len() as u64;
        Ok(())
    }
}

/// Emits framed subrecords for one record.
pub struct SubrecordWriter<'s> {
    sink: &'s mut dyn PayloadSink,
    record: Tag,
    dialect: Dialect,
}

impl<'s> SubrecordWriter<'s> {
    pub fn new(sink: &'s mut dyn PayloadSink, record: Tag, dialect: Dialect) -> Self {
        Self {
            sink,
            record,
            dialect,
        }
    }

    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn overflow(&self, subrecord: Tag, len: u64, limit: u64) -> EncodeError {
        EncodeError::SizeOverflow {
            record: self.record,
            subrecord,
            len,
            limit,
        }
    }

    fn latin1(&self, subrecord: Tag, value: &str) -> Result<Vec<u8>, EncodeError> {
        field::encode_latin1(value).map_err(|ch| EncodeError::UnrepresentableChar {
            record: self.record,
            subrecord,
            ch,
        })
    }

    fn frame(&mut self, tag: Tag, len: usize) -> Result<(), EncodeError> {
        let len32 = u32::try_from(len)
            .map_err(|_| self.overflow(tag, len as u64, u64::from(u32::MAX)))?;
        match self.dialect {
            Dialect::Legacy => {
                self.sink.put(tag.as_bytes())?;
                self.sink.put(&len32.to_le_bytes())
            }
            Dialect::Modern => match u16::try_from(len32) {
                Ok(len16) => {
                    self.sink.put(tag.as_bytes())?;
                    self.sink.put(&len16.to_le_bytes())
                }
                Err(_) => {
                    self.sink.put(Tag::XXXX.as_bytes())?;
                    self.sink.put(&4u16.to_le_bytes())?;
                    self.sink.put(&len32.to_le_bytes())?;
                    self.sink.put(tag.as_bytes())?;
                    self.sink.put(&0u16.to_le_bytes())
                }
            },
        }
    }

    /// A subrecord with an opaque body. Modern bodies above `u16::MAX` get an
    /// `XXXX` prefix.
    pub fn raw(&mut self, tag: Tag, body: &[u8]) -> Result<(), EncodeError> {
        self.frame(tag, body.len())?;
        self.sink.put(body)
    }

    pub fn fixed<T: Scalar>(&mut self, tag: Tag, value: T) -> Result<(), EncodeError> {
        self.raw(tag, value.to_le().as_ref())
    }

    pub fn string(&mut self, tag: Tag, value: &str) -> Result<(), EncodeError> {
        self.string_bounded(tag, value, string_limit(self.dialect))
    }

    /// Writes `value` plus one NUL; the body must stay within `max_len`.
    pub fn string_bounded(&mut self, tag: Tag, value: &str, max_len: usize) -> Result<(), EncodeError> {
        let bytes = self.latin1(tag, value)?;
        let len = bytes.len() + 1;
        if len > max_len {
            return Err(self.overflow(tag, len as u64, max_len as u64));
        }
        self.frame(tag, len)?;
        self.sink.put(&bytes)?;
        self.sink.put(&[0])
    }

    pub fn array<T: Scalar>(&mut self, tag: Tag, values: &[T]) -> Result<(), EncodeError> {
        self.frame(tag, values.len() * T::SIZE)?;
        for value in values {
            self.sink.put(value.to_le().as_ref())?;
        }
        Ok(())
    }

    pub fn localized(&mut self, tag: Tag, value: &LocalizedString) -> Result<(), EncodeError> {
        match value {
            LocalizedString::Index(id) => self.fixed(tag, *id),
            LocalizedString::Inline(text) => self.string(tag, text),
        }
    }

    /// Packs `value` into an `N`-byte string cell for a composite body.
    pub fn cell<const N: usize>(&self, subrecord: Tag, value: &str) -> Result<[u8; N], EncodeError> {
        field::fixed_string::<N>(value).map_err(|ch| EncodeError::UnrepresentableChar {
            record: self.record,
            subrecord,
            ch,
        })
    }
}
