use clap::{Parser, Subcommand, ValueEnum};
use esmkit_format::CompressionPolicy;

#[derive(Parser)]
#[command(
    name = "esmkit",
    version,
    about = "Validate, inspect and round-trip ESM/ESP plugin files.",
    long_about = "Validate, inspect and round-trip ESM/ESP plugin files.\n\nNotes:\n  - The dialect (TES3 or TES4) is detected from the first record unless a config file sets it.\n  - Only the built-in record shapes are decoded; any other record type is reported as unknown."
)]
pub(crate) struct Cli {
    /// Emit machine-readable JSON instead of human output.
    #[arg(long, global = true)]
    pub(crate) json: bool,

    /// Log decode progress to stderr (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,

    /// JSON file with read/write options.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) config: Option<String>,

    #[command(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Check that a file decodes completely.
    Validate {
        /// Plugin or master path.
        path: String,
    },
    /// Summarize a file, or print one record by form ID.
    Inspect {
        /// Plugin or master path.
        path: String,
        /// Form ID to print (decimal or `0x` hex).
        #[arg(long, value_parser = parse_form_id)]
        form_id: Option<u32>,
    },
    /// Decode and re-encode a file, reporting whether the bytes survive.
    Roundtrip {
        /// Plugin or master path.
        path: String,
        /// Write the re-encoded file here.
        #[arg(long)]
        out: Option<String>,
        /// Override the configured compression policy.
        #[arg(long, value_enum)]
        compression: Option<CompressionArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum CompressionArg {
    Preserve,
    Never,
    Always,
}

impl From<CompressionArg> for CompressionPolicy {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Preserve => Self::Preserve,
            CompressionArg::Never => Self::Never,
            CompressionArg::Always => Self::Always,
        }
    }
}

fn parse_form_id(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid form id {s:?}: {e}"))
}
