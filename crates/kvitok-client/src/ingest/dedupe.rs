use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::ClientResult;
use crate::ingest::FiscalTriple;
use crate::state::map_sqlite_error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExistingReceipt {
    pub(crate) receipt_id: String,
    pub(crate) item_count: i64,
}

pub(crate) fn find_by_external_id(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    external_id: &str,
) -> ClientResult<Option<ExistingReceipt>> {
    connection
        .query_row(
            "SELECT
                r.receipt_id,
                (SELECT COUNT(*) FROM receipt_items i WHERE i.receipt_id = r.receipt_id)
             FROM receipts r
             WHERE r.user_id = ?1
               AND r.external_id = ?2
             LIMIT 1",
            params![user_id, external_id],
            |row| {
                Ok(ExistingReceipt {
                    receipt_id: row.get(0)?,
                    item_count: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

/// Looks up a receipt of the same user by fiscal triple. An incomplete triple
/// never matches.
pub(crate) fn find_by_fiscal_triple(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    fiscal: &FiscalTriple,
) -> ClientResult<Option<ExistingReceipt>> {
    let (Some(drive_number), Some(document_number), Some(sign)) =
        (&fiscal.drive_number, fiscal.document_number, &fiscal.sign)
    else {
        return Ok(None);
    };

    connection
        .query_row(
            "SELECT
                r.receipt_id,
                (SELECT COUNT(*) FROM receipt_items i WHERE i.receipt_id = r.receipt_id)
             FROM receipts r
             WHERE r.user_id = ?1
               AND r.fiscal_drive_number = ?2
               AND r.fiscal_document_number = ?3
               AND r.fiscal_sign = ?4
             ORDER BY r.receipt_id ASC
             LIMIT 1",
            params![user_id, drive_number, document_number, sign],
            |row| {
                Ok(ExistingReceipt {
                    receipt_id: row.get(0)?,
                    item_count: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}
