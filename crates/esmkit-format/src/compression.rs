//! Whole-record zlib payloads used by the modern dialect.
//!
//! Stored layout: `decompressed_size:u32 | zlib stream`.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use tracing::trace;

use esmkit_core::{DecodeError, EncodeError, Tag};

const MAX_PREALLOC_RATIO: usize = 8;

/// Inflates a stored payload. `at` is the payload's offset, for diagnostics.
///
/// The result is exactly the declared decompressed size or an error.
pub fn inflate(record: Tag, stored: &[u8], at: u64) -> Result<Vec<u8>, DecodeError> {
    let fail = |detail: String| DecodeError::CompressionError { record, detail, at };

    if stored.len() <= 4 {
        return Err(fail(format!(
            "declared size {} cannot hold the decompressed size and a stream",
            stored.len()
        )));
    }
    let mut prefix = [0u8; 4];
    prefix.copy_from_slice(&stored[..4]);
    let expected = u32::from_le_bytes(prefix);
    let stream = &stored[4..];

    trace!(
        record = %record,
        compressed = stream.len(),
        expected,
        "inflating record payload"
    );

    // The declared size is untrusted; let the buffer grow past a sane guess.
    let guess = stream.len().saturating_mul(MAX_PREALLOC_RATIO);
    let mut out = Vec::with_capacity(usize::try_from(expected).map_or(guess, |n| n.min(guess)));
    ZlibDecoder::new(stream)
        .take(u64::from(expected) + 1)
        .read_to_end(&mut out)
        .map_err(|e| fail(format!("zlib decompression failed: {e}")))?;
    if out.len() as u64 != u64::from(expected) {
        return Err(fail(format!(
            "inflated to {} bytes, header declares {expected}",
            out.len()
        )));
    }
    Ok(out)
}

/// Deflates `raw` and prepends its length.
pub fn deflate(record: Tag, raw: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let fail = |detail: String| EncodeError::Compression { record, detail };

    let len = u32::try_from(raw.len())
        .map_err(|_| fail(format!("{} bytes exceed the u32 size prefix", raw.len())))?;
    let mut out = Vec::with_capacity(raw.len() / 2 + 8);
    out.extend_from_slice(&len.to_le_bytes());
    let mut encoder = ZlibEncoder::new(out, Compression::default());
    encoder
        .write_all(raw)
        .map_err(|e| fail(format!("zlib compression failed: {e}")))?;
    let out = encoder
        .finish()
        .map_err(|e| fail(format!("zlib compression failed: {e}")))?;
    trace!(record = %record, raw = raw.len(), stored = out.len(), "deflated record payload");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSCR: Tag = Tag(*b"LSCR");

    #[test]
    fn deflate_then_inflate_restores_payload() {
        let raw: Vec<u8> = (0..2000u32).flat_map(|i| (i % 17).to_le_bytes()).collect();
        let stored = deflate(LSCR, &raw).unwrap();
        assert_eq!(&stored[..4], &(raw.len() as u32).to_le_bytes());
        assert!(stored.len() < raw.len());
        assert_eq!(inflate(LSCR, &stored, 0).unwrap(), raw);
    }

    #[test]
    fn rejects_payload_too_small_for_prefix() {
        let err = inflate(LSCR, &[1, 0, 0, 0], 24).unwrap_err();
        assert!(matches!(err, DecodeError::CompressionError { at: 24, .. }));
    }

    #[test]
    fn rejects_size_disagreement() {
        let mut stored = deflate(LSCR, b"EDID\x02\x00a\x00").unwrap();
        stored[..4].copy_from_slice(&9u32.to_le_bytes());
        let err = inflate(LSCR, &stored, 0).unwrap_err();
        match err {
            DecodeError::CompressionError { detail, .. } => {
                assert!(detail.contains("declares 9"), "{detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        stored[..4].copy_from_slice(&4u32.to_le_bytes());
        assert!(inflate(LSCR, &stored, 0).is_err());
    }

    #[test]
    fn huge_declared_size_fails_without_reserving_it() {
        let mut stored = deflate(LSCR, &[7u8; 16]).unwrap();
        stored[..4].copy_from_slice(&u32::MAX.to_le_bytes());
        match inflate(LSCR, &stored, 0).unwrap_err() {
            DecodeError::CompressionError { detail, .. } => {
                assert!(detail.contains("inflated to 16 bytes"), "{detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_corrupt_stream() {
        let stored = [8u8, 0, 0, 0, 0xde, 0xad, 0xbe, 0xef];
        assert!(matches!(
            inflate(LSCR, &stored, 0),
            Err(DecodeError::CompressionError { .. })
        ));
    }
}
