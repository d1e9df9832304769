use anyhow::Context;
use esmkit_format::{CodecConfig, RecordDispatcher};

use crate::cli::{Cli, Command};

pub(crate) fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.config.as_deref() {
        Some(path) => CodecConfig::load(path).with_context(|| format!("load config {path}"))?,
        None => CodecConfig::default(),
    };
    let dispatcher = RecordDispatcher::default().with_options(config.read);

    match cli.cmd {
        Command::Validate { path } => {
            crate::commands::validate::cmd_validate(&path, &dispatcher, cli.json)
        }
        Command::Inspect { path, form_id } => {
            crate::commands::inspect::cmd_inspect(&path, &dispatcher, form_id, cli.json)
        }
        Command::Roundtrip {
            path,
            out,
            compression,
        } => {
            let mut write = config.write;
            if let Some(compression) = compression {
                write.compression = compression.into();
            }
            crate::commands::roundtrip::cmd_roundtrip(
                &path,
                out.as_deref(),
                &dispatcher,
                &write,
                cli.json,
            )
        }
    }
}
