//! Byte fixtures for shape tests.

use crate::cursor::ByteReader;
use crate::dispatch::{Entry, RecordDispatcher};
use crate::record::{DecodeContext, Record};
use esmkit_core::{DecodeError, Dialect};

/// Builds a record payload one subrecord at a time.
pub(crate) struct Payload {
    dialect: Dialect,
    pub bytes: Vec<u8>,
}

impl Payload {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            bytes: Vec::new(),
        }
    }

    pub fn sub(mut self, tag: &[u8; 4], body: &[u8]) -> Self {
        self.bytes.extend_from_slice(tag);
        match self.dialect {
            Dialect::Legacy => self
                .bytes
                .extend_from_slice(&(body.len() as u32).to_le_bytes()),
            Dialect::Modern => self
                .bytes
                .extend_from_slice(&(body.len() as u16).to_le_bytes()),
        }
        self.bytes.extend_from_slice(body);
        self
    }

    pub fn string(self, tag: &[u8; 4], value: &str) -> Self {
        let mut body = value.as_bytes().to_vec();
        body.push(0);
        self.sub(tag, &body)
    }

    /// Wraps the payload in a record header with zero flags.
    pub fn record(&self, tag: &[u8; 4]) -> Vec<u8> {
        self.record_with_flags(tag, 0)
    }

    pub fn record_with_flags(&self, tag: &[u8; 4], flags: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(tag);
        out.extend_from_slice(&(self.bytes.len() as u32).to_le_bytes());
        match self.dialect {
            Dialect::Legacy => {
                out.extend_from_slice(&0u32.to_le_bytes());
                out.extend_from_slice(&flags.to_le_bytes());
            }
            Dialect::Modern => {
                out.extend_from_slice(&flags.to_le_bytes());
                out.extend_from_slice(&0x0001_0000u32.to_le_bytes());
                out.extend_from_slice(&[0u8; 8]);
            }
        }
        out.extend_from_slice(&self.bytes);
        out
    }
}

pub(crate) fn decode(dialect: Dialect, bytes: &[u8]) -> Result<Record, DecodeError> {
    decode_with(DecodeContext::new(dialect), bytes)
}

pub(crate) fn decode_with(ctx: DecodeContext<'_>, bytes: &[u8]) -> Result<Record, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    match RecordDispatcher::default().read_record(&mut reader, &ctx)? {
        Entry::Record(record) => Ok(record),
        Entry::Group(_) => panic!("fixture decoded to a group"),
    }
}
