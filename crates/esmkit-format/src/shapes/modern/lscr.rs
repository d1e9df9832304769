use crate::compound::{attach_to_latest, Compound};
use crate::localization::LocalizedString;
use crate::record::{DecodeContext, RecordShape};
use crate::shapes::EDID;
use crate::subrecord::{Subrecord, SubrecordCursor, SubrecordWriter};
use esmkit_core::{DecodeError, Dialect, EncodeError, Tag};

const DESC: Tag = Tag(*b"DESC");
const CTDA: Tag = Tag(*b"CTDA");
const CIS2: Tag = Tag(*b"CIS2");
const NNAM: Tag = Tag(*b"NNAM");
const SNAM: Tag = Tag(*b"SNAM");
const RNAM: Tag = Tag(*b"RNAM");
const ONAM: Tag = Tag(*b"ONAM");
const XNAM: Tag = Tag(*b"XNAM");
const MOD2: Tag = Tag(*b"MOD2");

const BODY_TAGS: &[Tag] = &[DESC, CTDA, CIS2, NNAM, SNAM, RNAM, ONAM, XNAM, MOD2];

/// A raw 32-byte condition (`CTDA`) with the optional script parameter
/// (`CIS2`) that follows it.
pub type Condition = Compound<[u8; 32], String>;

/// A loading screen (`LSCR`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadScreen {
    pub editor_id: String,
    pub text: LocalizedString,
    pub conditions: Vec<Condition>,
    pub static_form: u32,
    pub initial_scale: u32,
    pub initial_rotation: [u8; 6],
    pub rotation_limits: u32,
    pub initial_translation: [u8; 12],
    pub camera_path: Option<String>,
}

impl RecordShape for LoadScreen {
    const TAG: Tag = Tag(*b"LSCR");
    const DIALECT: Dialect = Dialect::Modern;

    fn decode(cursor: &mut SubrecordCursor<'_>, ctx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let editor_id = cursor.expect(EDID, &[EDID])?.string()?;

        let mut text = None;
        let mut conditions: Vec<Condition> = Vec::new();
        let mut static_form = None;
        let mut initial_scale = None;
        let mut initial_rotation = None;
        let mut rotation_limits = None;
        let mut initial_translation = None;
        let mut camera_path = None;
        while let Some(sub) = cursor.next()? {
            match sub.tag {
                DESC => cursor.once(&mut text, &sub, |s| s.localized(ctx.localized))?,
                CTDA => conditions.push(Compound::new(sub.blob::<32>()?)),
                CIS2 => attach_to_latest(cursor, &mut conditions, &sub, CTDA, Subrecord::string)?,
                NNAM => cursor.once(&mut static_form, &sub, |s| s.fixed::<u32>())?,
                SNAM => cursor.once(&mut initial_scale, &sub, |s| s.fixed::<u32>())?,
                RNAM => cursor.once(&mut initial_rotation, &sub, |s| s.blob::<6>())?,
                ONAM => cursor.once(&mut rotation_limits, &sub, |s| s.fixed::<u32>())?,
                XNAM => cursor.once(&mut initial_translation, &sub, |s| s.blob::<12>())?,
                MOD2 => cursor.once(&mut camera_path, &sub, Subrecord::string)?,
                _ => return Err(cursor.unexpected(&sub, BODY_TAGS)),
            }
        }

        Ok(Self {
            editor_id,
            text: cursor.required(text, DESC)?,
            conditions,
            static_form: cursor.required(static_form, NNAM)?,
            initial_scale: cursor.required(initial_scale, SNAM)?,
            initial_rotation: cursor.required(initial_rotation, RNAM)?,
            rotation_limits: cursor.required(rotation_limits, ONAM)?,
            initial_translation: cursor.required(initial_translation, XNAM)?,
            camera_path,
        })
    }

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<(), EncodeError> {
        out.string(EDID, &self.editor_id)?;
        out.localized(DESC, &self.text)?;
        for condition in &self.conditions {
            out.raw(CTDA, &condition.primary)?;
            if let Some(param) = &condition.secondary {
                out.string(CIS2, param)?;
            }
        }
        out.fixed(NNAM, self.static_form)?;
        out.fixed(SNAM, self.initial_scale)?;
        out.raw(RNAM, &self.initial_rotation)?;
        out.fixed(ONAM, self.rotation_limits)?;
        out.raw(XNAM, &self.initial_translation)?;
        if let Some(path) = &self.camera_path {
            out.string(MOD2, path)?;
        }
        Ok(())
    }

    fn editor_id(&self) -> Option<&str> {
        Some(&self.editor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressionPolicy;
    use crate::localization::{StringLookup, StringTable};
    use crate::shapes::testutil::{decode, decode_with, Payload};

    fn tail(payload: Payload) -> Payload {
        payload
            .sub(b"NNAM", &0x0010_5a7fu32.to_le_bytes())
            .sub(b"SNAM", &1.5f32.to_bits().to_le_bytes())
            .sub(b"RNAM", &[0, 0, 10, 0, 0xf6, 0xff])
            .sub(b"ONAM", &0u32.to_le_bytes())
            .sub(b"XNAM", &[0; 12])
    }

    fn ctda(marker: u8) -> [u8; 32] {
        let mut body = [0u8; 32];
        body[0] = marker;
        body
    }

    #[test]
    fn conditions_keep_their_parameters() {
        let payload = Payload::new(Dialect::Modern)
            .string(b"EDID", "LoadScreenDragon")
            .string(b"DESC", "Dragons are back.")
            .sub(b"CTDA", &ctda(1))
            .string(b"CIS2", "::Alias_0")
            .sub(b"CTDA", &ctda(2));
        let bytes = tail(payload).string(b"MOD2", "camera\\path.nif").record(b"LSCR");

        let record = decode(Dialect::Modern, &bytes).unwrap();
        let screen = record.shape::<LoadScreen>().unwrap();
        assert_eq!(screen.text, LocalizedString::Inline("Dragons are back.".into()));
        assert_eq!(screen.conditions.len(), 2);
        assert_eq!(screen.conditions[0].secondary.as_deref(), Some("::Alias_0"));
        assert_eq!(screen.conditions[1].primary[0], 2);
        assert_eq!(screen.conditions[1].secondary, None);
        assert_eq!(screen.static_form, 0x0010_5a7f);
        assert_eq!(screen.camera_path.as_deref(), Some("camera\\path.nif"));
        assert_eq!(record.to_bytes(CompressionPolicy::Preserve).unwrap(), bytes);
    }

    #[test]
    fn parameter_attaches_across_other_fields() {
        let payload = Payload::new(Dialect::Modern)
            .string(b"EDID", "Spread")
            .string(b"DESC", "")
            .sub(b"CTDA", &ctda(7))
            .sub(b"NNAM", &0u32.to_le_bytes())
            .string(b"CIS2", "late");
        let payload = payload
            .sub(b"SNAM", &0u32.to_le_bytes())
            .sub(b"RNAM", &[0; 6])
            .sub(b"ONAM", &0u32.to_le_bytes())
            .sub(b"XNAM", &[0; 12]);
        let record = decode(Dialect::Modern, &payload.record(b"LSCR")).unwrap();
        let screen = record.shape::<LoadScreen>().unwrap();
        assert_eq!(screen.conditions[0].secondary.as_deref(), Some("late"));
    }

    #[test]
    fn parameter_before_any_condition_is_out_of_order() {
        let payload = Payload::new(Dialect::Modern)
            .string(b"EDID", "Orphan")
            .string(b"DESC", "")
            .string(b"CIS2", "nobody");
        assert!(matches!(
            decode(Dialect::Modern, &tail(payload).record(b"LSCR")),
            Err(DecodeError::OutOfOrderSubrecord {
                subrecord: CIS2,
                requires: CTDA,
                ..
            })
        ));
    }

    #[test]
    fn second_parameter_for_one_condition_is_duplicate() {
        let payload = Payload::new(Dialect::Modern)
            .string(b"EDID", "Twice")
            .string(b"DESC", "")
            .sub(b"CTDA", &ctda(1))
            .string(b"CIS2", "a")
            .string(b"CIS2", "b");
        assert!(matches!(
            decode(Dialect::Modern, &tail(payload).record(b"LSCR")),
            Err(DecodeError::DuplicateSubrecord { subrecord: CIS2, .. })
        ));
    }

    #[test]
    fn missing_translation_is_reported() {
        let bytes = Payload::new(Dialect::Modern)
            .string(b"EDID", "NoXnam")
            .string(b"DESC", "")
            .sub(b"NNAM", &0u32.to_le_bytes())
            .sub(b"SNAM", &0u32.to_le_bytes())
            .sub(b"RNAM", &[0; 6])
            .sub(b"ONAM", &0u32.to_le_bytes())
            .record(b"LSCR");
        assert!(matches!(
            decode(Dialect::Modern, &bytes),
            Err(DecodeError::MissingRequiredSubrecord { subrecord: XNAM, .. })
        ));
    }

    #[test]
    fn localized_description_is_a_table_index() {
        let payload = Payload::new(Dialect::Modern)
            .string(b"EDID", "Localized")
            .sub(b"DESC", &0x0000_1234u32.to_le_bytes());
        let bytes = tail(payload).record(b"LSCR");

        let strings: StringTable = [(0x1234u32, "Watch the skies.")].into_iter().collect();
        let ctx = DecodeContext::new(Dialect::Modern)
            .localized(true)
            .with_strings(&strings);
        let record = decode_with(ctx, &bytes).unwrap();
        let screen = record.shape::<LoadScreen>().unwrap();
        assert_eq!(screen.text, LocalizedString::Index(0x1234));
        assert_eq!(screen.text.resolve(Some(&strings as &dyn StringLookup)), Some("Watch the skies."));
        assert_eq!(record.to_bytes(CompressionPolicy::Preserve).unwrap(), bytes);
    }

    #[test]
    fn wrong_length_rotation_is_invalid() {
        let payload = Payload::new(Dialect::Modern)
            .string(b"EDID", "BadRot")
            .string(b"DESC", "")
            .sub(b"RNAM", &[0; 4]);
        assert!(matches!(
            decode(Dialect::Modern, &tail(payload).record(b"LSCR")),
            Err(DecodeError::InvalidLength { subrecord: RNAM, actual: 4, .. })
        ));
    }
}
