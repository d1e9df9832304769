use crate::record::{DecodeContext, RecordShape};
use crate::shapes::DATA;
use crate::subrecord::{SubrecordCursor, SubrecordWriter};
use esmkit_core::{DecodeError, Dialect, EncodeError, Tag};

const NAME: Tag = Tag(*b"NAME");
const NNAM: Tag = Tag(*b"NNAM");
const INDX: Tag = Tag(*b"INDX");
const INAM: Tag = Tag(*b"INAM");
const INTV: Tag = Tag(*b"INTV");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeveledItemEntry {
    pub item: String,
    pub level: u16,
}

/// A legacy leveled item list (`LEVI`).
///
/// `INDX` declares how many `INAM`/`INTV` pairs follow. It is checked on
/// decode and recomputed from `entries` on encode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeveledItem {
    pub id: String,
    pub list_flags: u32,
    pub chance_none: u8,
    pub entries: Vec<LeveledItemEntry>,
}

impl RecordShape for LeveledItem {
    const TAG: Tag = Tag(*b"LEVI");
    const DIALECT: Dialect = Dialect::Legacy;

    fn decode(cursor: &mut SubrecordCursor<'_>, _ctx: &DecodeContext<'_>) -> Result<Self, DecodeError> {
        let id = cursor.expect(NAME, &[NAME])?.string()?;
        let list_flags = cursor.expect(DATA, &[DATA])?.fixed::<u32>()?;
        let chance_none = cursor.expect(NNAM, &[NNAM])?.fixed::<u8>()?;
        let declared = cursor.expect(INDX, &[INDX])?.fixed::<u32>()?;

        let mut entries = Vec::new();
        while let Some(sub) = cursor.next()? {
            match sub.tag {
                INAM => {
                    let item = sub.string()?;
                    let level = cursor.expect(INTV, &[INTV])?.fixed::<u16>()?;
                    entries.push(LeveledItemEntry { item, level });
                }
                INTV => return Err(cursor.out_of_order(&sub, INAM)),
                _ => return Err(cursor.unexpected(&sub, &[INAM])),
            }
        }

        if entries.len() as u64 != u64::from(declared) {
            return Err(DecodeError::CountMismatch {
                record: Self::TAG,
                subrecord: INDX,
                declared: u64::from(declared),
                actual: entries.len() as u64,
            });
        }

        Ok(Self {
            id,
            list_flags,
            chance_none,
            entries,
        })
    }

    fn encode(&self, out: &mut SubrecordWriter<'_>) -> Result<(), EncodeError> {
        let count = u32::try_from(self.entries.len()).map_err(|_| EncodeError::SizeOverflow {
            record: Self::TAG,
            subrecord: INDX,
            len: self.entries.len() as u64,
            limit: u64::from(u32::MAX),
        })?;
        out.string(NAME, &self.id)?;
        out.fixed(DATA, self.list_flags)?;
        out.fixed(NNAM, self.chance_none)?;
        out.fixed(INDX, count)?;
        for entry in &self.entries {
            out.string(INAM, &entry.item)?;
            out.fixed(INTV, entry.level)?;
        }
        Ok(())
    }

    fn editor_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompressionPolicy;
    use crate::shapes::testutil::{decode, Payload};

    fn list(declared: u32, pairs: &[(&str, u16)]) -> Vec<u8> {
        let mut payload = Payload::new(Dialect::Legacy)
            .string(b"NAME", "random_dagger")
            .sub(b"DATA", &1u32.to_le_bytes())
            .sub(b"NNAM", &[25])
            .sub(b"INDX", &declared.to_le_bytes());
        for (item, level) in pairs {
            payload = payload.string(b"INAM", item).sub(b"INTV", &level.to_le_bytes());
        }
        payload.record(b"LEVI")
    }

    #[test]
    fn decodes_entries_in_order() {
        let bytes = list(2, &[("iron dagger", 1), ("steel dagger", 5)]);
        let record = decode(Dialect::Legacy, &bytes).unwrap();
        let levi = record.shape::<LeveledItem>().unwrap();
        assert_eq!(levi.chance_none, 25);
        assert_eq!(
            levi.entries,
            vec![
                LeveledItemEntry {
                    item: "iron dagger".into(),
                    level: 1
                },
                LeveledItemEntry {
                    item: "steel dagger".into(),
                    level: 5
                },
            ]
        );
        assert_eq!(record.to_bytes(CompressionPolicy::Preserve).unwrap(), bytes);
    }

    #[test]
    fn declared_count_must_match_pairs() {
        let bytes = list(3, &[("iron dagger", 1)]);
        assert_eq!(
            decode(Dialect::Legacy, &bytes).unwrap_err(),
            DecodeError::CountMismatch {
                record: Tag(*b"LEVI"),
                subrecord: INDX,
                declared: 3,
                actual: 1,
            }
        );
    }

    #[test]
    fn empty_list_is_valid() {
        let bytes = list(0, &[]);
        let record = decode(Dialect::Legacy, &bytes).unwrap();
        assert!(record.shape::<LeveledItem>().unwrap().entries.is_empty());
    }

    #[test]
    fn level_without_item_is_out_of_order() {
        let bytes = Payload::new(Dialect::Legacy)
            .string(b"NAME", "x")
            .sub(b"DATA", &0u32.to_le_bytes())
            .sub(b"NNAM", &[0])
            .sub(b"INDX", &1u32.to_le_bytes())
            .sub(b"INTV", &1u16.to_le_bytes())
            .record(b"LEVI");
        assert!(matches!(
            decode(Dialect::Legacy, &bytes),
            Err(DecodeError::OutOfOrderSubrecord {
                subrecord: INTV,
                requires: INAM,
                ..
            })
        ));
    }
}
