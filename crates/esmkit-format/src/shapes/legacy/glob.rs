use crate::record::{DecodeContext, RecordShape};
use crate::shapes::{GlobalKind, FLTV, FNAM};
use crate::subrecord::{SubrecordCursor, SubrecordWriter};
use esmkit_core::{DecodeError, Dialect, EncodeError, LengthRule, Tag};

const NAME: Tag = Tag(*b"NAME");

/// Value of a legacy global. The `FLTV` word is always four bytes; integer
/// kinds reinterpret its bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GlobalValue {
    Short(i32),
    Long(i32),
    Float(f32),
}

impl GlobalValue {
    pub const fn kind(self) -> GlobalKind {
        match self {
            Self::Short(_) => GlobalKind::Short,
            Self::Long(_) => GlobalKind::Long,
            Self::Float(_) => GlobalKind::Float,
        }
    }

    fn to_bits(self) -> [u8; 4] {
        match self {
            Self::Short(v) | Self::Long(v) => v.to_le_bytes(),
            Self::Float(v) => v.to_le_bytes(),
        }
    }
}

impl Default for GlobalValue {
    fn default() -> Self {
        Self::Float(0.0)
    }
}

/// A legacy `GLOB`: `NAME`, `FNAM`, `FLTV` in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Global {
    pub id: String,
    pub value: GlobalValue,
}

impl RecordShape for Global {
    const TAG: Tag = Tag(*b"GLOB");
    const DIALECT: Dialect = Dialect::Legacy;

    fn decode(cursor: &mut SubrecordCursor<'_>, _ctx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let id = cursor.expect(NAME, &[NAME])?.string()?;
        let kind = GlobalKind::read(&cursor.expect(FNAM, &[FNAM])?)?;
        let fltv = cursor.expect(FLTV, &[FLTV])?;
        fltv.check_len(LengthRule::Exactly(4))?;
        let value = match kind {
            GlobalKind::Short => GlobalValue::Short(fltv.fixed::<i32>()?),
            GlobalKind::Long => GlobalValue::Long(fltv.fixed::<i32>()?),
            GlobalKind::Float => GlobalValue::Float(fltv.fixed::<f32>()?),
        };
        Ok(Self { id, value })
    }

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<(), EncodeError> {
        out.string(NAME, &self.id)?;
        out.fixed(FNAM, self.value.kind().code())?;
        out.raw(FLTV, &self.value.to_bits())
    }

    fn editor_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressionPolicy;
    use crate::header::RecordHeader;
    use crate::record::Record;
    use crate::shapes::testutil::{decode, Payload};

    #[test]
    fn long_global_reads_integer_bits() {
        let bytes = Payload::new(Dialect::Legacy)
            .string(b"NAME", "GameHour")
            .sub(b"FNAM", b"l")
            .sub(b"FLTV", &(-5i32).to_le_bytes())
            .record(b"GLOB");
        let record = decode(Dialect::Legacy, &bytes).unwrap();
        assert_eq!(record.editor_id(), Some("GameHour"));
        assert_eq!(
            record.shape::<Global>().unwrap().value,
            GlobalValue::Long(-5)
        );
        assert_eq!(record.to_bytes(CompressionPolicy::Preserve).unwrap(), bytes);
    }

    #[test]
    fn float_global_round_trips() {
        let record = Record::new(
            RecordHeader::legacy(0),
            Global {
                id: "Timescale".into(),
                value: GlobalValue::Float(30.0),
            },
        );
        let bytes = record.to_bytes(CompressionPolicy::Preserve).unwrap();
        let decoded = decode(Dialect::Legacy, &bytes).unwrap();
        assert_eq!(decoded.shape::<Global>(), record.shape::<Global>());
    }

    #[test]
    fn unknown_kind_is_invalid_value() {
        let bytes = Payload::new(Dialect::Legacy)
            .string(b"NAME", "Broken")
            .sub(b"FNAM", b"x")
            .sub(b"FLTV", &[0; 4])
            .record(b"GLOB");
        assert!(matches!(
            decode(Dialect::Legacy, &bytes),
            Err(DecodeError::InvalidNumericValue { subrecord: FNAM, .. })
        ));
    }

    #[test]
    fn fields_out_of_sequence_are_unexpected() {
        let bytes = Payload::new(Dialect::Legacy)
            .string(b"NAME", "Swapped")
            .sub(b"FLTV", &[0; 4])
            .sub(b"FNAM", b"f")
            .record(b"GLOB");
        assert!(matches!(
            decode(Dialect::Legacy, &bytes),
            Err(DecodeError::UnexpectedSubrecordTag {
                found: FLTV,
                expected: &[FNAM],
                ..
            })
        ));
    }

    #[test]
    fn name_longer_than_ceiling_is_rejected() {
        let bytes = Payload::new(Dialect::Legacy)
            .string(b"NAME", &"n".repeat(300))
            .sub(b"FNAM", b"s")
            .sub(b"FLTV", &[0; 4])
            .record(b"GLOB");
        assert!(matches!(
            decode(Dialect::Legacy, &bytes),
            Err(DecodeError::InvalidLength {
                expected: LengthRule::AtMost(255),
                actual: 301,
                ..
            })
        ));
    }
}
