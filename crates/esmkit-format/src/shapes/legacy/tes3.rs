use crate::field::{decode_latin1, FloatDomain};
use crate::record::{DecodeContext, RecordShape};
use crate::shapes::{MasterFile, DATA, HEDR, MAST};
use crate::subrecord::{SubrecordCursor, SubrecordWriter};
use esmkit_core::{DecodeError, Dialect, EncodeError, LengthRule, Tag};

const HEDR_LEN: usize = 300;
const MAST_LIMIT: usize = 256;

/// The `TES3` file header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tes3Header {
    pub version: f32,
    pub file_flag: u32,
    /// At most 31 bytes survive encoding.
    pub company: String,
    /// At most 255 bytes survive encoding.
    pub description: String,
    pub num_records: u32,
    pub masters: Vec<MasterFile>,
}

impl RecordShape for Tes3Header {
    const TAG: Tag = Tag::TES3;
    const DIALECT: Dialect = Dialect::Legacy;

    fn decode(cursor: &mut SubrecordCursor<'_>, _ctx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let hedr = cursor.expect(HEDR, &[HEDR])?;
        hedr.check_len(LengthRule::Exactly(HEDR_LEN))?;
        let mut r = hedr.reader();
        let version = FloatDomain::NonNegative
            .check(r.read::<f32>()?)
            .map_err(|reason| hedr.invalid_value(reason))?;
        let file_flag = r.read::<u32>()?;
        let company = decode_latin1(&r.read_array::<32>()?);
        let description = decode_latin1(&r.read_array::<256>()?);
        let num_records = r.read::<u32>()?;

        let mut masters = Vec::new();
        while let Some(sub) = cursor.next()? {
            match sub.tag {
                MAST => masters.push(MasterFile::read(cursor, &sub, MAST_LIMIT)?),
                DATA => return Err(cursor.out_of_order(&sub, MAST)),
                _ => return Err(cursor.unexpected(&sub, &[MAST])),
            }
        }

        Ok(Self {
            version,
            file_flag,
            company,
            description,
            num_records,
            masters,
        })
    }

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<(), EncodeError> {
        let mut body = Vec::with_capacity(HEDR_LEN);
        body.extend_from_slice(&self.version.to_le_bytes());
        body.extend_from_slice(&self.file_flag.to_le_bytes());
        body.extend_from_slice(&out.cell::<32>(HEDR, &self.company)?);
        body.extend_from_slice(&out.cell::<256>(HEDR, &self.description)?);
        body.extend_from_slice(&self.num_records.to_le_bytes());
        out.raw(HEDR, &body)?;
        for master in &self.masters {
            master.write(out, MAST_LIMIT)?;
        }
        Ok(())
    }
}
