use crate::record::{DecodeContext, RecordShape};
use crate::shapes::EDID;
use crate::subrecord::{SubrecordCursor, SubrecordWriter};
use esmkit_core::{DecodeError, Dialect, EncodeError, Tag};

const LNAM: Tag = Tag(*b"LNAM");

/// An ordered list of form IDs, one `LNAM` each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormList {
    pub editor_id: String,
    pub forms: Vec<u32>,
}

impl RecordShape for FormList {
    const TAG: Tag = Tag(*b"FLST");
    const DIALECT: Dialect = Dialect::Modern;

    fn decode(cursor: &mut SubrecordCursor<'_>, _ctx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let editor_id = cursor.expect(EDID, &[EDID])?.string()?;
        let mut forms = Vec::new();
        while let Some(sub) = cursor.next()? {
            match sub.tag {
                LNAM => forms.push(sub.fixed::<u32>()?),
                _ => return Err(cursor.unexpected(&sub, &[LNAM])),
            }
        }
        Ok(Self { editor_id, forms })
    }

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<(), EncodeError> {
        out.string(EDID, &self.editor_id)?;
        for form in &self.forms {
            out.fixed(LNAM, *form)?;
        }
        Ok(())
    }

    fn editor_id(&self) -> Option<&str> {
        Some(&self.editor_id)
    }
}
