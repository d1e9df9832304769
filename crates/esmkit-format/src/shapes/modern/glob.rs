use crate::field::FloatDomain;
use crate::record::{DecodeContext, RecordShape};
use crate::shapes::{GlobalKind, EDID, FLTV, FNAM};
use crate::subrecord::{SubrecordCursor, SubrecordWriter};
use esmkit_core::{DecodeError, Dialect, EncodeError, Tag};

/// A modern `GLOB`. The value is stored as a float whatever its kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Global {
    pub editor_id: String,
    pub kind: GlobalKind,
    pub value: f32,
}

impl RecordShape for Global {
    const TAG: Tag = Tag(*b"GLOB");
    const DIALECT: Dialect = Dialect::Modern;

    fn decode(cursor: &mut SubrecordCursor<'_>, _ctx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let editor_id = cursor.expect(EDID, &[EDID])?.string()?;
        let kind = GlobalKind::read(&cursor.expect(FNAM, &[FNAM])?)?;
        let value = cursor.expect(FLTV, &[FLTV])?.float(FloatDomain::NotNan)?;
        Ok(Self {
            editor_id,
            kind,
            value,
        })
    }

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<(), EncodeError> {
        out.string(EDID, &self.editor_id)?;
        out.fixed(FNAM, self.kind.code())?;
        out.fixed(FLTV, self.value)
    }

    fn editor_id(&self) -> Option<&str> {
        Some(&self.editor_id)
    }
}
