//! Whole files: open, query and write back.

use crate::config::WriteOptions;
use crate::cursor::ByteWriter;
use crate::dispatch::{Entry, GroupContents, RecordDispatcher};
use crate::localization::StringLookup;
use crate::record::Record;
use esmkit_core::{Dialect, EncodeError, Error, Tag};
use memmap2::Mmap;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// A decoded plugin or master file, file header first.
#[derive(Debug, Clone, PartialEq)]
pub struct EsmFile {
    dialect: Dialect,
    entries: Vec<Entry>,
}

impl EsmFile {
    pub fn new(dialect: Dialect, entries: Vec<Entry>) -> Self {
        Self { dialect, entries }
    }

    /// Opens `path` with the built-in shapes and default read options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::open_with(path, &RecordDispatcher::default(), None)
    }

    pub fn open_with(
        path: impl AsRef<Path>,
        dispatcher: &RecordDispatcher,
        strings: Option<&dyn StringLookup>,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: the map is only read for the duration of this call and
        // decoded values own their bytes.
        let mmap = unsafe { Mmap::map(&file)? };
        debug!(path = %path.display(), len = mmap.len(), "opened file");
        Ok(Self::from_bytes_with(&mmap, dispatcher, strings)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, esmkit_core::DecodeError> {
        Self::from_bytes_with(bytes, &RecordDispatcher::default(), None)
    }

    pub fn from_bytes_with(
        bytes: &[u8],
        dispatcher: &RecordDispatcher,
        strings: Option<&dyn StringLookup>,
    ) -> Result<Self, esmkit_core::DecodeError> {
        let (dialect, entries) = dispatcher.read_all_with(bytes, strings)?;
        Ok(Self { dialect, entries })
    }

    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut Vec<Entry> {
        &mut self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    /// The `TES3`/`TES4` record, if the file starts with one.
    pub fn header(&self) -> Option<&Record> {
        self.entries
            .first()
            .and_then(Entry::as_record)
            .filter(|record| record.tag == self.dialect.file_header_tag())
    }

    /// Every record in file order, groups flattened.
    pub fn records(&self) -> Records<'_> {
        Records {
            stack: vec![self.entries.iter()],
        }
    }

    pub fn find_by_form_id(&self, form_id: u32) -> Option<&Record> {
        self.records()
            .find(|record| record.header.form_id() == Some(form_id))
    }

    pub fn count_by_tag(&self) -> BTreeMap<Tag, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records() {
            *counts.entry(record.tag).or_insert(0) += 1;
        }
        counts
    }

    /// Encodes every entry in order. Returns the number of bytes written.
    pub fn write_to<W: Write>(&self, writer: W, options: &WriteOptions) -> Result<u64, EncodeError> {
        let mut sink = ByteWriter::new(writer);
        let mut total = 0u64;
        for entry in &self.entries {
            total += entry.encode(&mut sink, options.compression)?;
        }
        sink.flush()?;
        debug!(entries = self.entries.len(), bytes = total, "wrote file");
        Ok(total)
    }

    pub fn to_bytes(&self, options: &WriteOptions) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        self.write_to(&mut out, options)?;
        Ok(out)
    }
}

/// Depth-first walk over the records of a file.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    stack: Vec<std::slice::Iter<'a, Entry>>,
}

impl<'a> Iterator for Records<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(Entry::Record(record)) => return Some(record),
                Some(Entry::Group(group)) => {
                    if let GroupContents::Entries(entries) = &group.contents {
                        self.stack.push(entries.iter());
                    }
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Encodes `file` fully, then replaces `path` through a temporary sibling so
/// readers never see a partial file.
pub fn write_file_atomic(path: impl AsRef<Path>, file: &EsmFile, options: &WriteOptions) -> Result<(), Error> {
    let bytes = file.to_bytes(options)?;
    atomic_write(path.as_ref(), &bytes)
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("plugin.esp");

    let mut i = 0u32;
    loop {
        let tmp_name = if i == 0 {
            format!("{base}.tmp")
        } else {
            format!("{base}.tmp.{i}")
        };
        let tmp_path = dir.join(tmp_name);
        match OpenOptions::new().write(true).create_new(true).open(&tmp_path) {
            Ok(mut f) => {
                let written = f
                    .write_all(bytes)
                    .and_then(|()| f.sync_all())
                    .and_then(|()| std::fs::rename(&tmp_path, path));
                if let Err(e) = written {
                    drop(f);
                    let _ = std::fs::remove_file(&tmp_path);
                    return Err(e.into());
                }
                debug!(path = %path.display(), bytes = bytes.len(), "replaced file");
                return Ok(());
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                i = i.saturating_add(1);
            }
            Err(e) => return Err(e.into()),
        }
    }
}
