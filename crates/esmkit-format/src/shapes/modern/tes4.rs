use crate::field::FloatDomain;
use crate::record::{DecodeContext, RecordShape};
use crate::shapes::{MasterFile, DATA, HEDR, MAST};
use crate::subrecord::{string_limit, SubrecordCursor, SubrecordWriter};
use esmkit_core::{DecodeError, Dialect, EncodeError, LengthRule, Tag};

const CNAM: Tag = Tag(*b"CNAM");
const SNAM: Tag = Tag(*b"SNAM");
const ONAM: Tag = Tag(*b"ONAM");
const INTV: Tag = Tag(*b"INTV");
const INCC: Tag = Tag(*b"INCC");

const HEDR_LEN: usize = 12;
const BODY_TAGS: &[Tag] = &[SNAM, MAST, ONAM, INTV, INCC];

/// The `TES4` file header.
///
/// `HEDR` and `CNAM` lead; the rest may come in any order and is written back
/// in the order of the fields below.
#[derive(Debug, Clone, PartialEq)]
pub struct Tes4Header {
    pub version: f32,
    pub num_records: u32,
    pub next_object_id: u32,
    pub author: String,
    pub summary: Option<String>,
    pub masters: Vec<MasterFile>,
    /// Overridden form IDs (`ONAM`). Empty means the subrecord is absent.
    pub overrides: Vec<u32>,
    pub internal_version: u32,
    pub incremental: Option<u32>,
}

impl Default for Tes4Header {
    fn default() -> Self {
        Self {
            version: 1.7,
            num_records: 0,
            next_object_id: 0x800,
            author: String::new(),
            summary: None,
            masters: Vec::new(),
            overrides: Vec::new(),
            internal_version: 0,
            incremental: None,
        }
    }
}

impl RecordShape for Tes4Header {
    const TAG: Tag = Tag::TES4;
    const DIALECT: Dialect = Dialect::Modern;

    fn decode(cursor: &mut SubrecordCursor<'_>, _ctx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let hedr = cursor.expect(HEDR, &[HEDR])?;
        hedr.check_len(LengthRule::Exactly(HEDR_LEN))?;
        let mut r = hedr.reader();
        let version = FloatDomain::NonNegative
            .check(r.read::<f32>()?)
            .map_err(|reason| hedr.invalid_value(reason))?;
        let num_records = r.read::<u32>()?;
        let next_object_id = r.read::<u32>()?;
        let author = cursor.expect(CNAM, &[CNAM])?.string()?;

        let mut summary = None;
        let mut masters = Vec::new();
        let mut overrides = None;
        let mut internal_version = None;
        let mut incremental = None;
        while let Some(sub) = cursor.next()? {
            match sub.tag {
                SNAM => cursor.once(&mut summary, &sub, |s| {
                    if s.is_empty() {
                        return Err(s.invalid_value("summary must not be empty"));
                    }
                    s.string()
                })?,
                MAST => masters.push(MasterFile::read(cursor, &sub, string_limit(Dialect::Modern))?),
                DATA => return Err(cursor.out_of_order(&sub, MAST)),
                ONAM => cursor.once(&mut overrides, &sub, |s| s.array::<u32>())?,
                INTV => cursor.once(&mut internal_version, &sub, |s| s.fixed::<u32>())?,
                INCC => cursor.once(&mut incremental, &sub, |s| s.fixed::<u32>())?,
                _ => return Err(cursor.unexpected(&sub, BODY_TAGS)),
            }
        }

        Ok(Self {
            version,
            num_records,
            next_object_id,
            author,
            summary,
            masters,
            overrides: overrides.unwrap_or_default(),
            internal_version: cursor.required(internal_version, INTV)?,
            incremental,
        })
    }

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<(), EncodeError> {
        let mut hedr = Vec::with_capacity(HEDR_LEN);
        hedr.extend_from_slice(&self.version.to_le_bytes());
        hedr.extend_from_slice(&self.num_records.to_le_bytes());
        hedr.extend_from_slice(&self.next_object_id.to_le_bytes());
        out.raw(HEDR, &hedr)?;
        out.string(CNAM, &self.author)?;
        if let Some(summary) = &self.summary {
            out.string(SNAM, summary)?;
        }
        for master in &self.masters {
            master.write(out, string_limit(Dialect::Modern))?;
        }
        if !self.overrides.is_empty() {
            out.array(ONAM, &self.overrides)?;
        }
        out.fixed(INTV, self.internal_version)?;
        if let Some(incremental) = self.incremental {
            out.fixed(INCC, incremental)?;
        }
        Ok(())
    }
}
