use crate::field::Scalar;
use esmkit_core::{DecodeError, Tag};
use std::io::{self, Write};

/// Sequential reader over an in-memory byte slice.
///
/// `position()` reports absolute offsets: the slice's first byte sits at `base`.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: u64,
}

impl<'a> ByteReader<'a> {
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self::with_base(bytes, 0)
    }

    pub const fn with_base(bytes: &'a [u8], base: u64) -> Self {
        Self {
            bytes,
            pos: 0,
            base,
        }
    }

    pub const fn position(&self) -> u64 {
        self.base + self.pos as u64
    }

    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn exhausted(&self, needed: usize) -> DecodeError {
        DecodeError::StreamExhausted {
            at: self.position(),
            needed,
            available: self.remaining(),
        }
    }

    /// Borrows the next `n` bytes; nothing is consumed on failure.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| self.exhausted(n))?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read<T: Scalar>(&mut self) -> Result<T, DecodeError> {
        Ok(T::from_le_slice(self.read_bytes(T::SIZE)?))
    }

    pub fn read_tag(&mut self) -> Result<Tag, DecodeError> {
        Ok(Tag(self.read_array::<4>()?))
    }

    pub fn peek_array<const N: usize>(&self) -> Result<[u8; N], DecodeError> {
        self.clone().read_array::<N>()
    }

    pub fn peek_tag(&self) -> Result<Tag, DecodeError> {
        Ok(Tag(self.peek_array::<4>()?))
    }
}

/// Sequential writer that counts the bytes it forwards.
#[derive(Debug)]
pub struct ByteWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> ByteWriter<W> {
    pub const fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub const fn written(&self) -> u64 {
        self.written
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    pub fn write<T: Scalar>(&mut self, value: T) -> io::Result<()> {
        self.write_bytes(value.to_le().as_ref())
    }

    pub fn write_tag(&mut self, tag: Tag) -> io::Result<()> {
        self.write_bytes(tag.as_bytes())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
