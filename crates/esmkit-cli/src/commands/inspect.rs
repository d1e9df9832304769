use anyhow::Context;
use esmkit_format::shapes::legacy::Tes3Header;
use esmkit_format::shapes::modern::Tes4Header;
use esmkit_format::shapes::MasterFile;
use esmkit_format::{Entry, EsmFile, Record, RecordDispatcher};

use crate::types::{FileHeaderJson, InspectJson, MasterJson, RecordJson};

pub(crate) fn cmd_inspect(
    path: &str,
    dispatcher: &RecordDispatcher,
    form_id: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let file = EsmFile::open_with(path, dispatcher, None).with_context(|| format!("open {path}"))?;

    if let Some(form_id) = form_id {
        let Some(record) = file.find_by_form_id(form_id) else {
            anyhow::bail!("form id 0x{form_id:08X} not found in {path}");
        };
        return print_record(path, record, json);
    }

    let header = file.header().and_then(header_json);
    let records_by_tag = file
        .count_by_tag()
        .into_iter()
        .map(|(tag, n)| (tag.to_string(), n as u64))
        .collect();
    let out = InspectJson {
        path,
        dialect: file.dialect().name(),
        header,
        entry_count: file.entries().len() as u64,
        group_count: count_groups(file.entries()),
        record_count: file.records().count() as u64,
        records_by_tag,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("File: {path}");
    println!("Dialect: {}", out.dialect);
    if let Some(h) = &out.header {
        println!(
            "Header: {} version={} num_records={} localized={}",
            h.tag, h.version, h.num_records, h.localized
        );
        if !h.author.is_empty() {
            println!("  author: {}", h.author);
        }
        if let Some(d) = &h.description {
            println!("  description: {d}");
        }
        for m in &h.masters {
            println!("  master: {} ({} bytes)", m.name, m.size);
        }
    }
    println!(
        "Entries: {} top-level, {} groups, {} records",
        out.entry_count, out.group_count, out.record_count
    );
    for (tag, n) in &out.records_by_tag {
        println!("  {tag}: {n}");
    }
    Ok(())
}

fn print_record(path: &str, record: &Record, json: bool) -> anyhow::Result<()> {
    let out = RecordJson {
        path,
        tag: record.tag.to_string(),
        form_id: record.header.form_id(),
        flags: record.header.flags,
        stored_size: record.header.size,
        compressed: record.header.is_compressed(),
        deleted: record.is_tombstone(),
        editor_id: record.editor_id().map(str::to_string),
        fields: record.fields().map(|f| format!("{f:#?}")),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "Record: {} form_id={} flags=0x{:08X} size={}",
        out.tag,
        out.form_id.map_or_else(|| "-".to_string(), |id| format!("0x{id:08X}")),
        out.flags,
        out.stored_size
    );
    if let Some(id) = &out.editor_id {
        println!("  editor id: {id}");
    }
    match &out.fields {
        Some(fields) => println!("{fields}"),
        None => println!("  (deleted)"),
    }
    Ok(())
}

fn header_json(record: &Record) -> Option<FileHeaderJson> {
    let masters = |list: &[MasterFile]| -> Vec<MasterJson> {
        list.iter()
            .map(|m| MasterJson {
                name: m.name.clone(),
                size: m.size,
            })
            .collect()
    };
    if let Some(h) = record.shape::<Tes4Header>() {
        return Some(FileHeaderJson {
            tag: record.tag.to_string(),
            version: h.version,
            num_records: h.num_records,
            author: h.author.clone(),
            description: h.summary.clone(),
            localized: record.header.is_localized(),
            masters: masters(&h.masters),
        });
    }
    record.shape::<Tes3Header>().map(|h| FileHeaderJson {
        tag: record.tag.to_string(),
        version: h.version,
        num_records: h.num_records,
        author: h.company.clone(),
        description: Some(h.description.clone()).filter(|d| !d.is_empty()),
        localized: false,
        masters: masters(&h.masters),
    })
}

fn count_groups(entries: &[Entry]) -> u64 {
    entries
        .iter()
        .map(|e| match e {
            Entry::Group(g) => 1 + count_groups(g.entries()),
            Entry::Record(_) => 0,
        })
        .sum()
}
