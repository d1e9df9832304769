use esmkit_core::Error;
use esmkit_format::{EsmFile, RecordDispatcher};

use crate::types::ValidateJson;

pub(crate) fn cmd_validate(path: &str, dispatcher: &RecordDispatcher, json: bool) -> anyhow::Result<()> {
    let result = EsmFile::open_with(path, dispatcher, None);
    if json {
        let out = match &result {
            Ok(file) => ValidateJson {
                ok: true,
                path,
                dialect: Some(file.dialect().name()),
                record_count: Some(file.records().count() as u64),
                error: None,
                error_kind: None,
            },
            Err(e) => ValidateJson {
                ok: false,
                path,
                dialect: None,
                record_count: None,
                error: Some(e.to_string()),
                error_kind: Some(error_kind(e)),
            },
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        if out.ok {
            Ok(())
        } else {
            std::process::exit(1);
        }
    } else {
        match result {
            Ok(file) => {
                println!(
                    "OK: {path} ({}, {} records)",
                    file.dialect(),
                    file.records().count()
                );
                Ok(())
            }
            Err(e) => anyhow::bail!("INVALID: {path}: {e}"),
        }
    }
}

fn error_kind(e: &Error) -> &'static str {
    match e {
        Error::Io(_) => "io",
        Error::Decode(d) => d.kind_name(),
        Error::Encode(_) => "encode",
    }
}
