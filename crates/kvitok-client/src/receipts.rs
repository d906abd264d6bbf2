use std::path::Path;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use crate::contracts::types::{CashierRecord, ReceiptDetail, ReceiptItemRecord, ReceiptSummary};
use crate::shops::load_shop;
use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

pub const DEFAULT_RECEIPT_LIMIT: i64 = 100;

/// Newest first.
pub fn list_receipts(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    skip: i64,
    limit: i64,
) -> ClientResult<Vec<ReceiptSummary>> {
    let mut statement = connection
        .prepare(
            "SELECT
                r.receipt_id,
                r.external_id,
                r.date_time,
                r.total_sum,
                r.shop_id,
                COALESCE(s.retail_name, s.legal_name),
                (SELECT COUNT(*) FROM receipt_items i WHERE i.receipt_id = r.receipt_id)
             FROM receipts r
             JOIN shops s ON s.shop_id = r.shop_id
             WHERE r.user_id = ?1
             ORDER BY r.date_time DESC, r.receipt_id DESC
             LIMIT ?2 OFFSET ?3",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows = statement
        .query_map(params![user_id, limit.max(0), skip.max(0)], |row| {
            Ok(ReceiptSummary {
                receipt_id: row.get(0)?,
                external_id: row.get(1)?,
                date_time: row.get(2)?,
                total_sum: row.get(3)?,
                shop_id: row.get(4)?,
                shop_name: row.get(5)?,
                items_count: row.get(6)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut receipts = Vec::new();
    for row in rows {
        receipts.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(receipts)
}

pub fn receipt_detail(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    receipt_id: &str,
) -> ClientResult<ReceiptDetail> {
    let header = connection
        .query_row(
            "SELECT
                receipt_id,
                external_id,
                date_time,
                total_sum,
                cash_total_sum,
                ecash_total_sum,
                credit_sum,
                prepaid_sum,
                provision_sum,
                fiscal_drive_number,
                fiscal_document_number,
                fiscal_sign,
                shift_number,
                operation_type,
                kkt_reg_id,
                nds10,
                nds18,
                shop_id,
                cashier_id
             FROM receipts
             WHERE user_id = ?1 AND receipt_id = ?2",
            params![user_id, receipt_id],
            |row| {
                Ok(ReceiptHeader {
                    receipt_id: row.get(0)?,
                    external_id: row.get(1)?,
                    date_time: row.get(2)?,
                    total_sum: row.get(3)?,
                    cash_total_sum: row.get(4)?,
                    ecash_total_sum: row.get(5)?,
                    credit_sum: row.get(6)?,
                    prepaid_sum: row.get(7)?,
                    provision_sum: row.get(8)?,
                    fiscal_drive_number: row.get(9)?,
                    fiscal_document_number: row.get(10)?,
                    fiscal_sign: row.get(11)?,
                    shift_number: row.get(12)?,
                    operation_type: row.get(13)?,
                    kkt_reg_id: row.get(14)?,
                    nds10: row.get(15)?,
                    nds18: row.get(16)?,
                    shop_id: row.get(17)?,
                    cashier_id: row.get(18)?,
                })
            },
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .ok_or_else(|| ClientError::receipt_not_found(receipt_id))?;

    let shop = load_shop(connection, db_path, user_id, &header.shop_id)?;
    let cashier = match header.cashier_id.as_deref() {
        Some(cashier_id) => load_cashier(connection, db_path, cashier_id)?,
        None => None,
    };
    let items = load_items(connection, db_path, &header.receipt_id)?;

    Ok(ReceiptDetail {
        receipt_id: header.receipt_id,
        external_id: header.external_id,
        date_time: header.date_time,
        total_sum: header.total_sum,
        cash_total_sum: header.cash_total_sum,
        ecash_total_sum: header.ecash_total_sum,
        credit_sum: header.credit_sum,
        prepaid_sum: header.prepaid_sum,
        provision_sum: header.provision_sum,
        fiscal_drive_number: header.fiscal_drive_number,
        fiscal_document_number: header.fiscal_document_number,
        fiscal_sign: header.fiscal_sign,
        shift_number: header.shift_number,
        operation_type: header.operation_type,
        kkt_reg_id: header.kkt_reg_id,
        nds10: header.nds10,
        nds18: header.nds18,
        shop,
        cashier,
        items,
    })
}

/// Deletes a receipt and its items. Returns the number of items removed.
pub fn delete_receipt(
    connection: &mut Connection,
    db_path: &Path,
    user_id: &str,
    receipt_id: &str,
) -> ClientResult<i64> {
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let items = transaction
        .query_row(
            "SELECT COUNT(*) FROM receipt_items WHERE receipt_id = ?1",
            params![receipt_id],
            |row| row.get::<_, i64>(0),
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let deleted = transaction
        .execute(
            "DELETE FROM receipts WHERE user_id = ?1 AND receipt_id = ?2",
            params![user_id, receipt_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if deleted == 0 {
        return Err(ClientError::receipt_not_found(receipt_id));
    }

    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    tracing::info!(%receipt_id, items, "deleted receipt");
    Ok(items)
}

struct ReceiptHeader {
    receipt_id: String,
    external_id: String,
    date_time: String,
    total_sum: i64,
    cash_total_sum: i64,
    ecash_total_sum: i64,
    credit_sum: i64,
    prepaid_sum: i64,
    provision_sum: i64,
    fiscal_drive_number: Option<String>,
    fiscal_document_number: Option<i64>,
    fiscal_sign: Option<String>,
    shift_number: Option<i64>,
    operation_type: Option<i64>,
    kkt_reg_id: Option<String>,
    nds10: Option<i64>,
    nds18: Option<i64>,
    shop_id: String,
    cashier_id: Option<String>,
}

fn load_cashier(
    connection: &Connection,
    db_path: &Path,
    cashier_id: &str,
) -> ClientResult<Option<CashierRecord>> {
    connection
        .query_row(
            "SELECT cashier_id, name, inn FROM cashiers WHERE cashier_id = ?1",
            params![cashier_id],
            |row| {
                Ok(CashierRecord {
                    cashier_id: row.get(0)?,
                    name: row.get(1)?,
                    inn: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

fn load_items(
    connection: &Connection,
    db_path: &Path,
    receipt_id: &str,
) -> ClientResult<Vec<ReceiptItemRecord>> {
    let mut statement = connection
        .prepare(
            "SELECT
                item_id,
                position,
                name,
                price,
                quantity,
                sum,
                measure,
                product_type,
                gtin,
                raw_product_code
             FROM receipt_items
             WHERE receipt_id = ?1
             ORDER BY position ASC, item_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows = statement
        .query_map(params![receipt_id], |row| {
            Ok(ReceiptItemRecord {
                item_id: row.get(0)?,
                position: row.get(1)?,
                name: row.get(2)?,
                price: row.get(3)?,
                quantity: row.get(4)?,
                sum: row.get(5)?,
                measure: row.get(6)?,
                product_type: row.get(7)?,
                gtin: row.get(8)?,
                raw_product_code: row.get(9)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(items)
}
