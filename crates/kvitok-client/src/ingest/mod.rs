pub(crate) mod dedupe;
pub mod input;
pub mod measure;
pub mod normalize;
pub(crate) mod persist;

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};
use serde_json::{Map, Value};

use crate::contracts::types::{IngestOutcome, IngestReport};
use crate::ingest::measure::Measure;
use crate::state::map_sqlite_error;
use crate::users::require_active_user;
use crate::{ClientError, ClientResult};

pub use crate::contracts::types::ItemIssue;

/// `(fiscal_drive_number, fiscal_document_number, fiscal_sign)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiscalTriple {
    pub drive_number: Option<String>,
    pub document_number: Option<i64>,
    pub sign: Option<String>,
}

impl FiscalTriple {
    pub fn synthetic_external_id(&self) -> Option<String> {
        match (&self.drive_number, self.document_number, &self.sign) {
            (Some(drive), Some(document), Some(sign)) => {
                Some(format!("fiscal:{drive}:{document}:{sign}"))
            }
            _ => None,
        }
    }
}

/// Canonical receipt produced by the normalizer. Money is in minor units.
#[derive(Debug, Clone)]
pub struct ParsedReceipt {
    pub external_id: String,
    /// Wall-clock time as printed on the receipt.
    pub date_time: NaiveDateTime,
    pub total_sum: i64,
    pub cash_total_sum: i64,
    pub ecash_total_sum: i64,
    pub credit_sum: i64,
    pub prepaid_sum: i64,
    pub provision_sum: i64,
    pub fiscal: FiscalTriple,
    pub shift_number: Option<i64>,
    pub operation_type: Option<i64>,
    pub kkt_reg_id: Option<String>,
    pub nds10: Option<i64>,
    pub nds18: Option<i64>,
    pub legal_name: Option<String>,
    pub inn: Option<String>,
    pub retail_name: Option<String>,
    pub address: Option<String>,
    pub operator_name: Option<String>,
    pub operator_inn: Option<String>,
    pub items: Vec<ParsedItem>,
    pub items_in_source: usize,
    pub item_issues: Vec<ItemIssue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    pub position: i64,
    pub name: String,
    pub price: i64,
    pub quantity: f64,
    pub sum: i64,
    pub measure: Measure,
    pub product_type: Option<i64>,
    pub gtin: Option<String>,
    pub raw_product_code: Option<String>,
}

/// Normalizes `bytes` and ingests every document for `user_id`.
///
/// Nothing is written unless the whole payload normalizes. Each document is
/// then stored in its own transaction, in input order. When a later document
/// fails, the error's `data` carries `failed_index` and the reports of the
/// documents already committed.
pub fn ingest_bytes(
    connection: &mut Connection,
    db_path: &Path,
    bytes: &[u8],
    user_id: &str,
) -> ClientResult<Vec<IngestReport>> {
    let receipts = normalize::normalize_bytes(bytes)?;

    let mut reports = Vec::with_capacity(receipts.len());
    for (index, receipt) in receipts.iter().enumerate() {
        match ingest_receipt(connection, db_path, receipt, user_id) {
            Ok(report) => reports.push(report),
            Err(error) => return Err(with_committed_reports(error, index, &reports)),
        }
    }

    Ok(reports)
}

fn with_committed_reports(
    error: ClientError,
    failed_index: usize,
    committed: &[IngestReport],
) -> ClientError {
    if committed.is_empty() {
        return error;
    }

    let committed = match serde_json::to_value(committed) {
        Ok(value) => value,
        Err(_) => return error,
    };
    tracing::warn!(
        code = %error.code,
        failed_index,
        "ingestion stopped after committing earlier documents"
    );

    let mut data = match error.data.clone() {
        Some(Value::Object(map)) => map,
        Some(other) => {
            let mut map = Map::new();
            map.insert("detail".to_string(), other);
            map
        }
        None => Map::new(),
    };
    data.insert("failed_index".to_string(), Value::from(failed_index));
    data.insert("committed_reports".to_string(), committed);
    error.with_data(Value::Object(data))
}

/// Stores one parsed receipt atomically, or returns the receipt it duplicates.
pub fn ingest_receipt(
    connection: &mut Connection,
    db_path: &Path,
    parsed: &ParsedReceipt,
    user_id: &str,
) -> ClientResult<IngestReport> {
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    require_active_user(&transaction, db_path, user_id)?;

    if let Some(existing) =
        dedupe::find_by_external_id(&transaction, db_path, user_id, &parsed.external_id)?
    {
        transaction
            .commit()
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        return Ok(finish(
            parsed,
            existing.receipt_id,
            IngestOutcome::DuplicateExternalId,
            existing.item_count,
        ));
    }

    if let Some(existing) =
        dedupe::find_by_fiscal_triple(&transaction, db_path, user_id, &parsed.fiscal)?
    {
        let (outcome, item_count) = if existing.item_count == 0 && !parsed.items.is_empty() {
            persist::insert_items(&transaction, db_path, &existing.receipt_id, &parsed.items)?;
            (IngestOutcome::ItemsAttached, parsed.items.len() as i64)
        } else {
            (IngestOutcome::DuplicateFiscalTriple, existing.item_count)
        };
        transaction
            .commit()
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        return Ok(finish(parsed, existing.receipt_id, outcome, item_count));
    }

    let shop_id = persist::resolve_or_create_shop(&transaction, db_path, user_id, parsed)?;
    let cashier_id = persist::get_or_create_cashier(
        &transaction,
        db_path,
        parsed.operator_name.as_deref(),
        parsed.operator_inn.as_deref(),
    )?;
    let receipt_id = persist::insert_receipt(
        &transaction,
        db_path,
        user_id,
        &shop_id,
        cashier_id.as_deref(),
        parsed,
    )?;
    persist::insert_items(&transaction, db_path, &receipt_id, &parsed.items)?;

    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    Ok(finish(
        parsed,
        receipt_id,
        IngestOutcome::Created,
        parsed.items.len() as i64,
    ))
}

fn finish(
    parsed: &ParsedReceipt,
    receipt_id: String,
    outcome: IngestOutcome,
    items_processed: i64,
) -> IngestReport {
    tracing::info!(
        %receipt_id,
        external_id = %parsed.external_id,
        outcome = outcome.as_str(),
        items_processed,
        items_in_source = parsed.items_in_source,
        "receipt ingested"
    );
    for issue in &parsed.item_issues {
        tracing::warn!(
            %receipt_id,
            path = %issue.path,
            message = %issue.message,
            "skipped malformed line item"
        );
    }

    IngestReport {
        receipt_id,
        external_id: parsed.external_id.clone(),
        outcome,
        items_processed,
        items_in_source: parsed.items_in_source as i64,
        item_issues: parsed.item_issues.clone(),
    }
}
