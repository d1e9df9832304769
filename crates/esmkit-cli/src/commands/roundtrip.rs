use anyhow::Context;
use esmkit_format::{write_file_atomic, EsmFile, RecordDispatcher, WriteOptions};

use crate::types::RoundtripJson;

pub(crate) fn cmd_roundtrip(
    path: &str,
    out: Option<&str>,
    dispatcher: &RecordDispatcher,
    options: &WriteOptions,
    json: bool,
) -> anyhow::Result<()> {
    let input = std::fs::read(path).with_context(|| format!("read {path}"))?;
    let file = EsmFile::from_bytes_with(&input, dispatcher, None).with_context(|| format!("decode {path}"))?;
    let output = file.to_bytes(options).with_context(|| format!("encode {path}"))?;

    let first_difference = first_difference(&input, &output);
    if let Some(out) = out {
        write_file_atomic(out, &file, options).with_context(|| format!("write {out}"))?;
    }

    if json {
        let report = RoundtripJson {
            path,
            identical: first_difference.is_none(),
            input_len: input.len() as u64,
            output_len: output.len() as u64,
            first_difference,
            out,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match first_difference {
        None => println!("IDENTICAL: {path} ({} bytes)", input.len()),
        Some(at) => println!(
            "CHANGED: {path}: first difference at offset 0x{at:X} ({} -> {} bytes)",
            input.len(),
            output.len()
        ),
    }
    if let Some(out) = out {
        println!("Wrote: {out}");
    }
    Ok(())
}

/// Offset of the first byte where `a` and `b` disagree, counting a length
/// difference as a disagreement at the end of the shorter one.
fn first_difference(a: &[u8], b: &[u8]) -> Option<u64> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then_some(a.len().min(b.len())))
        .map(|at| at as u64)
}
