use std::path::Path;

use crate::ClientResult;
use crate::commands::common::open_store;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{ReceiptDeleteData, ReceiptListData};
use crate::receipts::{self, DEFAULT_RECEIPT_LIMIT};
use crate::users::require_user;

pub fn list(user_id: &str, skip: Option<i64>, limit: Option<i64>) -> ClientResult<SuccessEnvelope> {
    list_with_home_override(user_id, skip, limit, None)
}

#[doc(hidden)]
pub fn list_with_home_override(
    user_id: &str,
    skip: Option<i64>,
    limit: Option<i64>,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let skip = skip.unwrap_or(0).max(0);
    let limit = limit.unwrap_or(DEFAULT_RECEIPT_LIMIT).max(0);

    let (connection, db_path) = open_store(home_override)?;
    require_user(&connection, &db_path, user_id)?;
    let receipts = receipts::list_receipts(&connection, &db_path, user_id, skip, limit)?;
    success(
        "receipt list",
        ReceiptListData {
            skip,
            limit,
            receipts,
        },
    )
}

pub fn show(user_id: &str, receipt_id: &str) -> ClientResult<SuccessEnvelope> {
    show_with_home_override(user_id, receipt_id, None)
}

#[doc(hidden)]
pub fn show_with_home_override(
    user_id: &str,
    receipt_id: &str,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (connection, db_path) = open_store(home_override)?;
    require_user(&connection, &db_path, user_id)?;
    let detail = receipts::receipt_detail(&connection, &db_path, user_id, receipt_id)?;
    success("receipt show", detail)
}

pub fn delete(user_id: &str, receipt_id: &str) -> ClientResult<SuccessEnvelope> {
    delete_with_home_override(user_id, receipt_id, None)
}

#[doc(hidden)]
pub fn delete_with_home_override(
    user_id: &str,
    receipt_id: &str,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (mut connection, db_path) = open_store(home_override)?;
    require_user(&connection, &db_path, user_id)?;
    let items_deleted = receipts::delete_receipt(&mut connection, &db_path, user_id, receipt_id)?;
    success(
        "receipt delete",
        ReceiptDeleteData {
            receipt_id: receipt_id.to_string(),
            deleted: true,
            items_deleted,
        },
    )
}
