//! Fields spanning two subrecords: a primary and a secondary that belongs to
//! it by position.
//!
//! Two attachment rules occur in real files and are kept apart:
//!
//! - immediate: the secondary is required and must be the very next
//!   subrecord (`MAST` then `DATA`);
//! - latest primary: the secondary is optional and attaches to the most recent
//!   primary, even with other subrecords in between (`CTDA` then `CIS2`).

use crate::subrecord::{Subrecord, SubrecordCursor};
use esmkit_core::{DecodeError, Tag};

/// A primary value and its optional secondary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound<P, S> {
    pub primary: P,
    pub secondary: Option<S>,
}

impl<P, S> Compound<P, S> {
    pub const fn new(primary: P) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn with_secondary(primary: P, secondary: S) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }
}

/// Reads the secondary that must directly follow a primary.
///
/// Any other tag in that slot is unexpected; running out of payload first
/// means the secondary is missing.
pub fn read_immediate<'a>(
    cursor: &mut SubrecordCursor<'a>,
    secondary: &'static Tag,
) -> Result<Subrecord<'a>, DecodeError> {
    cursor.expect(*secondary, std::slice::from_ref(secondary))
}

/// Attaches `sub` to the last primary in `list`.
///
/// Fails when no primary has been read yet, or when the last one already has
/// a secondary.
pub fn attach_to_latest<'a, P, S>(
    cursor: &SubrecordCursor<'a>,
    list: &mut [Compound<P, S>],
    sub: &Subrecord<'a>,
    primary: Tag,
    read: impl FnOnce(&Subrecord<'a>) -> Result<S, DecodeError>,
) -> Result<(), DecodeError> {
    match list.last_mut() {
        Some(last) => cursor.once(&mut last.secondary, sub, read),
        None => Err(cursor.out_of_order(sub, primary)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esmkit_core::Dialect;

    const MAST: Tag = Tag(*b"MAST");
    const DATA: Tag = Tag(*b"DATA");
    const CTDA: Tag = Tag(*b"CTDA");
    const CIS2: Tag = Tag(*b"CIS2");
    const REC: Tag = Tag(*b"TEST");

    fn sub(out: &mut Vec<u8>, tag: Tag, body: &[u8]) {
        out.extend_from_slice(tag.as_bytes());
        out.extend_from_slice(&(body.len() as u16).to_le_bytes());
        out.extend_from_slice(body);
    }

    #[test]
    fn immediate_secondary_must_follow() {
        let mut payload = Vec::new();
        sub(&mut payload, MAST, b"Skyrim.esm\0");
        sub(&mut payload, MAST, b"Update.esm\0");
        let mut cursor = SubrecordCursor::new(REC, Dialect::Modern, &payload, 0);
        cursor.expect(MAST, &[MAST]).unwrap();
        let err = read_immediate(&mut cursor, &DATA).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnexpectedSubrecordTag {
                record: REC,
                found: MAST,
                expected: &[DATA],
                at: 17
            }
        );
    }

    #[test]
    fn immediate_secondary_missing_at_end() {
        let mut payload = Vec::new();
        sub(&mut payload, MAST, b"Skyrim.esm\0");
        let mut cursor = SubrecordCursor::new(REC, Dialect::Modern, &payload, 0);
        cursor.next().unwrap();
        assert!(matches!(
            read_immediate(&mut cursor, &DATA),
            Err(DecodeError::MissingRequiredSubrecord { subrecord: DATA, .. })
        ));
    }

    #[test]
    fn latest_primary_attaches_across_other_subrecords() {
        let mut payload = Vec::new();
        sub(&mut payload, CTDA, &[1; 4]);
        sub(&mut payload, CTDA, &[2; 4]);
        sub(&mut payload, Tag(*b"NNAM"), &[0; 4]);
        sub(&mut payload, CIS2, b"x\0");

        let mut cursor = SubrecordCursor::new(REC, Dialect::Modern, &payload, 0);
        let mut list: Vec<Compound<[u8; 4], String>> = Vec::new();
        while let Some(s) = cursor.next().unwrap() {
            match s.tag {
                CTDA => list.push(Compound::new(s.blob::<4>().unwrap())),
                CIS2 => attach_to_latest(&cursor, &mut list, &s, CTDA, Subrecord::string).unwrap(),
                _ => {}
            }
        }
        assert_eq!(list[0].secondary, None);
        assert_eq!(list[1].secondary.as_deref(), Some("x"));
    }

    #[test]
    fn latest_primary_rejects_orphan_and_second_secondary() {
        let mut payload = Vec::new();
        sub(&mut payload, CIS2, b"a\0");
        let mut cursor = SubrecordCursor::new(REC, Dialect::Modern, &payload, 0);
        let s = cursor.next().unwrap().unwrap();
        let mut list: Vec<Compound<[u8; 4], String>> = Vec::new();
        assert!(matches!(
            attach_to_latest(&cursor, &mut list, &s, CTDA, Subrecord::string),
            Err(DecodeError::OutOfOrderSubrecord { requires: CTDA, .. })
        ));

        list.push(Compound::with_secondary([0; 4], "first".to_string()));
        assert!(matches!(
            attach_to_latest(&cursor, &mut list, &s, CTDA, Subrecord::string),
            Err(DecodeError::DuplicateSubrecord { subrecord: CIS2, .. })
        ));
    }
}
