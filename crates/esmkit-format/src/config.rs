use esmkit_core::{Dialect, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether records are compressed on encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionPolicy {
    /// Follow each record's compressed flag.
    #[default]
    Preserve,
    Never,
    Always,
}

impl CompressionPolicy {
    /// Legacy records are never compressed.
    pub const fn should_compress(self, dialect: Dialect, flagged: bool) -> bool {
        match (dialect, self) {
            (Dialect::Legacy, _) | (Dialect::Modern, Self::Never) => false,
            (Dialect::Modern, Self::Always) => true,
            (Dialect::Modern, Self::Preserve) => flagged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Forces a dialect instead of detecting it from the first tag.
    pub dialect: Option<Dialect>,
    /// The first record must be the dialect's `TES3`/`TES4` header.
    pub require_file_header: bool,
    /// Overrides the file header's localized flag.
    pub localized: Option<bool>,
    /// Decode group contents; when off, groups are kept as raw bytes.
    pub descend_groups: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            dialect: None,
            require_file_header: true,
            localized: None,
            descend_groups: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    pub compression: CompressionPolicy,
}

/// Read and write options, loadable from a JSON file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub read: ReadOptions,
    pub write: WriteOptions,
}

impl CodecConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = CodecConfig::from_json(r#"{ "write": { "compression": "never" } }"#).unwrap();
        assert_eq!(cfg.write.compression, CompressionPolicy::Never);
        assert_eq!(cfg.read, ReadOptions::default());
        assert!(cfg.read.require_file_header);
    }

    #[test]
    fn reads_dialect_override() {
        let cfg = CodecConfig::from_json(
            r#"{ "read": { "dialect": "legacy", "descend_groups": false } }"#,
        )
        .unwrap();
        assert_eq!(cfg.read.dialect, Some(Dialect::Legacy));
        assert!(!cfg.read.descend_groups);
    }

    #[test]
    fn malformed_json_is_invalid_data() {
        let err = CodecConfig::from_json("{ read: ").unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::InvalidData),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("esmkit.json");
        std::fs::write(&path, r#"{ "write": { "compression": "always" } }"#).unwrap();
        let cfg = CodecConfig::load(&path).unwrap();
        assert_eq!(cfg.write.compression, CompressionPolicy::Always);
    }

    #[test]
    fn legacy_never_compresses() {
        assert!(!CompressionPolicy::Always.should_compress(Dialect::Legacy, true));
        assert!(CompressionPolicy::Preserve.should_compress(Dialect::Modern, true));
        assert!(!CompressionPolicy::Preserve.should_compress(Dialect::Modern, false));
        assert!(CompressionPolicy::Always.should_compress(Dialect::Modern, false));
    }
}
