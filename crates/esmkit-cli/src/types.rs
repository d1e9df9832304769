use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
pub(crate) struct ValidateJson<'a> {
    pub(crate) ok: bool,
    pub(crate) path: &'a str,
    pub(crate) dialect: Option<&'static str>,
    pub(crate) record_count: Option<u64>,
    pub(crate) error: Option<String>,
    pub(crate) error_kind: Option<&'static str>,
}

#[derive(Serialize)]
pub(crate) struct InspectJson<'a> {
    pub(crate) path: &'a str,
    pub(crate) dialect: &'static str,
    pub(crate) header: Option<FileHeaderJson>,
    pub(crate) entry_count: u64,
    pub(crate) group_count: u64,
    pub(crate) record_count: u64,
    pub(crate) records_by_tag: BTreeMap<String, u64>,
}

#[derive(Serialize)]
pub(crate) struct FileHeaderJson {
    pub(crate) tag: String,
    pub(crate) version: f32,
    pub(crate) num_records: u32,
    pub(crate) author: String,
    pub(crate) description: Option<String>,
    pub(crate) localized: bool,
    pub(crate) masters: Vec<MasterJson>,
}

#[derive(Serialize)]
pub(crate) struct MasterJson {
    pub(crate) name: String,
    pub(crate) size: u64,
}

#[derive(Serialize)]
pub(crate) struct RecordJson<'a> {
    pub(crate) path: &'a str,
    pub(crate) tag: String,
    pub(crate) form_id: Option<u32>,
    pub(crate) flags: u32,
    pub(crate) stored_size: u32,
    pub(crate) compressed: bool,
    pub(crate) deleted: bool,
    pub(crate) editor_id: Option<String>,
    pub(crate) fields: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct RoundtripJson<'a> {
    pub(crate) path: &'a str,
    pub(crate) identical: bool,
    pub(crate) input_len: u64,
    pub(crate) output_len: u64,
    pub(crate) first_difference: Option<u64>,
    pub(crate) out: Option<&'a str>,
}
