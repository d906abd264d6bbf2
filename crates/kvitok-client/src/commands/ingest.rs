use std::path::Path;

use crate::ClientResult;
use crate::commands::common::open_store;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::IngestData;
use crate::ingest::{ingest_bytes, input};

#[derive(Debug, Default)]
pub struct IngestOptions<'a> {
    pub path: Option<String>,
    pub user_id: String,
    pub home_override: Option<&'a Path>,
    pub stdin_override: Option<Vec<u8>>,
}

pub fn run(path: Option<String>, user_id: &str) -> ClientResult<SuccessEnvelope> {
    run_with_options(IngestOptions {
        path,
        user_id: user_id.to_string(),
        home_override: None,
        stdin_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: IngestOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let source = input::resolve_source(options.path.as_deref(), options.stdin_override)?;
    let (mut connection, db_path) = open_store(options.home_override)?;

    let receipts = ingest_bytes(&mut connection, &db_path, &source.content, &options.user_id)?;

    success(
        "ingest",
        IngestData {
            user_id: options.user_id,
            source_used: source.source_kind.as_str().to_string(),
            source_ref: source.source_ref,
            receipts,
        },
    )
}
