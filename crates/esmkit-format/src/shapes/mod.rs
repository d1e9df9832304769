//! Built-in record shapes.
//!
//! Each shape is a thin grammar over the subrecord cursor and writer. They
//! cover every field codec the engine offers; callers add their own shapes
//! through [`ShapeRegistry::register`](crate::registry::ShapeRegistry::register).

pub mod legacy;
pub mod modern;
#[cfg(test)]
pub(crate) mod testutil;

use crate::compound::read_immediate;
use crate::registry::ShapeRegistry;
use crate::subrecord::{Subrecord, SubrecordCursor, SubrecordWriter};
use esmkit_core::{DecodeError, EncodeError, Tag};

pub(crate) const MAST: Tag = Tag(*b"MAST");
pub(crate) const DATA: Tag = Tag(*b"DATA");
pub(crate) const HEDR: Tag = Tag(*b"HEDR");
pub(crate) const FNAM: Tag = Tag(*b"FNAM");
pub(crate) const FLTV: Tag = Tag(*b"FLTV");
pub(crate) const EDID: Tag = Tag(*b"EDID");

pub(crate) fn register_builtin(registry: &mut ShapeRegistry) {
    registry
        .register::<legacy::Tes3Header>()
        .register::<legacy::Global>()
        .register::<legacy::LeveledItem>()
        .register::<modern::Tes4Header>()
        .register::<modern::Global>()
        .register::<modern::Keyword>()
        .register::<modern::FormList>()
        .register::<modern::LoadScreen>();
}

/// A master the file depends on: `MAST` name, then the `DATA` size word that
/// must come right after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MasterFile {
    pub name: String,
    pub size: u64,
}

impl MasterFile {
    pub(crate) fn read(
        cursor: &mut SubrecordCursor<'_>,
        mast: &Subrecord<'_>,
        max_len: usize,
    ) -> Result<Self, DecodeError> {
        let name = mast.string_bounded(max_len)?;
        let size = read_immediate(cursor, &DATA)?.fixed::<u64>()?;
        Ok(Self { name, size })
    }

    pub(crate) fn write(&self, out: &mut SubrecordWriter<'_>, max_len: usize) -> Result<(), EncodeError> {
        out.string_bounded(MAST, &self.name, max_len)?;
        out.fixed(DATA, self.size)
    }
}

/// Declared type of a global variable (`FNAM`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GlobalKind {
    Short,
    Long,
    #[default]
    Float,
}

impl GlobalKind {
    pub(crate) fn read(sub: &Subrecord<'_>) -> Result<Self, DecodeError> {
        match sub.fixed::<u8>()? {
            b's' => Ok(Self::Short),
            b'l' => Ok(Self::Long),
            b'f' => Ok(Self::Float),
            _ => Err(sub.invalid_value("global type must be 's', 'l' or 'f'")),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Short => b's',
            Self::Long => b'l',
            Self::Float => b'f',
        }
    }
}
