use crate::record::{DecodeContext, RecordShape};
use crate::shapes::EDID;
use crate::subrecord::{SubrecordCursor, SubrecordWriter};
use esmkit_core::{DecodeError, Dialect, EncodeError, Tag};

const CNAM: Tag = Tag(*b"CNAM");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyword {
    pub editor_id: String,
    /// Packed RGBA colour.
    pub color: Option<u32>,
}

impl RecordShape for Keyword {
    const TAG: Tag = Tag(*b"KYWD");
    const DIALECT: Dialect = Dialect::Modern;

    fn decode(cursor: &mut SubrecordCursor<'_>, _ctx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let editor_id = cursor.expect(EDID, &[EDID])?.string()?;
        let mut color = None;
        while let Some(sub) = cursor.next()? {
            match sub.tag {
                CNAM => cursor.once(&mut color, &sub, |s| s.fixed::<u32>())?,
                _ => return Err(cursor.unexpected(&sub, &[CNAM])),
            }
        }
        Ok(Self { editor_id, color })
    }

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<(), EncodeError> {
        out.string(EDID, &self.editor_id)?;
        if let Some(color) = self.color {
            out.fixed(CNAM, color)?;
        }
        Ok(())
    }

    fn editor_id(&self) -> Option<&str> {
        Some(&self.editor_id)
    }
}
