use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Resolves string-table indices stored by localized modern files.
///
/// Loading the tables themselves is the caller's business; the codec only
/// consumes this lookup.
pub trait StringLookup {
    fn lookup(&self, id: u32) -> Option<&str>;
}

/// An in-memory string table keyed by index. Index `0` is reserved for the
/// empty string and is never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    entries: HashMap<u32, String>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when `id` is `0`; such entries are dropped.
    pub fn insert(&mut self, id: u32, value: impl Into<String>) -> bool {
        if id == 0 {
            return false;
        }
        self.entries.insert(id, value.into());
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StringLookup for StringTable {
    fn lookup(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<(u32, S)> for StringTable {
    fn from_iter<I: IntoIterator<Item = (u32, S)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (id, value) in iter {
            table.insert(id, value);
        }
        table
    }
}

/// A string-valued field that is either inline text or a string-table index,
/// depending on the file header's localized flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalizedString {
    Inline(String),
    Index(u32),
}

impl Default for LocalizedString {
    fn default() -> Self {
        Self::Inline(String::new())
    }
}

impl LocalizedString {
    /// Text of the field. Index `0` is the empty string; other indices go
    /// through `strings` and yield `None` when unresolved.
    pub fn resolve<'s>(&'s self, strings: Option<&'s dyn StringLookup>) -> Option<&'s str> {
        match self {
            Self::Inline(text) => Some(text),
            Self::Index(0) => Some(""),
            Self::Index(id) => {
                let found = strings.and_then(|table| table.lookup(*id));
                if found.is_none() {
                    tracing::warn!(id = *id, "localized string index not found in string table");
                }
                found
            }
        }
    }

    pub const fn is_localized(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}
