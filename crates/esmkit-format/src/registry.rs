use crate::record::{decode_boxed, DecodeFn, RecordShape};
use crate::shapes;
use esmkit_core::{Dialect, Tag};
use std::collections::HashMap;
use std::fmt;

/// Maps `(dialect, tag)` to the decoder of a record shape.
#[derive(Clone, Default)]
pub struct ShapeRegistry {
    decoders: HashMap<(Dialect, Tag), DecodeFn>,
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every shape shipped in [`crate::shapes`].
    pub fn with_builtin_shapes() -> Self {
        let mut registry = Self::new();
        shapes::register_builtin(&mut registry);
        registry
    }

    /// Registers `S`, replacing any shape already bound to its tag.
    pub fn register<S: RecordShape>(&mut self) -> &mut Self {
        self.decoders
            .insert((S::DIALECT, S::TAG), decode_boxed::<S> as DecodeFn);
        self
    }

    pub fn lookup(&self, dialect: Dialect, tag: Tag) -> Option<DecodeFn> {
        self.decoders.get(&(dialect, tag)).copied()
    }

    pub fn contains(&self, dialect: Dialect, tag: Tag) -> bool {
        self.decoders.contains_key(&(dialect, tag))
    }

    /// Registered tags of `dialect`, sorted.
    pub fn tags(&self, dialect: Dialect) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self
            .decoders
            .keys()
            .filter(|(d, _)| *d == dialect)
            .map(|(_, tag)| *tag)
            .collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeRegistry")
            .field("legacy", &self.tags(Dialect::Legacy))
            .field("modern", &self.tags(Dialect::Modern))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::Sample;

    #[test]
    fn registration_is_per_dialect() {
        let mut registry = ShapeRegistry::new();
        registry.register::<Sample>();
        assert!(registry.contains(Dialect::Modern, Sample::TAG));
        assert!(!registry.contains(Dialect::Legacy, Sample::TAG));
        assert!(registry.lookup(Dialect::Legacy, Sample::TAG).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn builtin_shapes_cover_both_file_headers() {
        let registry = ShapeRegistry::with_builtin_shapes();
        assert!(registry.contains(Dialect::Legacy, Tag::TES3));
        assert!(registry.contains(Dialect::Modern, Tag::TES4));
        assert_eq!(
            registry.tags(Dialect::Legacy),
            vec![Tag(*b"GLOB"), Tag(*b"LEVI"), Tag::TES3]
        );
        assert_eq!(
            registry.tags(Dialect::Modern),
            vec![
                Tag(*b"FLST"),
                Tag(*b"GLOB"),
                Tag(*b"KYWD"),
                Tag(*b"LSCR"),
                Tag::TES4
            ]
        );
    }
}
