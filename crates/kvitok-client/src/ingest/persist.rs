use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use ulid::Ulid;

use crate::ClientResult;
use crate::ingest::{ParsedItem, ParsedReceipt};
use crate::resolver::resolve_shop_with_tax_id;
use crate::state::map_sqlite_error;

const UNKNOWN_SHOP_NAME: &str = "Неизвестный магазин";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Picks the shop for a new receipt: resolver match (which prefers the shop
/// with the same tax id over a loose name match), then get-or-create by tax
/// id, then a fresh shop without one.
pub(crate) fn resolve_or_create_shop(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    parsed: &ParsedReceipt,
) -> ClientResult<String> {
    let trade_name = parsed
        .retail_name
        .as_deref()
        .or(parsed.legal_name.as_deref());
    let inn = parsed.inn.as_deref().filter(|inn| !inn.trim().is_empty());

    if let Some(name) = trade_name
        && let Some(shop_id) = resolve_shop_with_tax_id(
            connection,
            db_path,
            user_id,
            name,
            parsed.address.as_deref(),
            inn,
        )?
    {
        return Ok(shop_id);
    }

    let legal_name = parsed
        .legal_name
        .as_deref()
        .or(parsed.retail_name.as_deref())
        .unwrap_or(UNKNOWN_SHOP_NAME);

    let new_shop = NewShop {
        legal_name,
        inn,
        retail_name: parsed.retail_name.as_deref(),
        address: parsed.address.as_deref(),
    };

    get_or_create_shop(connection, db_path, user_id, &new_shop)
}

pub(crate) struct NewShop<'a> {
    pub(crate) legal_name: &'a str,
    pub(crate) inn: Option<&'a str>,
    pub(crate) retail_name: Option<&'a str>,
    pub(crate) address: Option<&'a str>,
}

/// Insert-or-fetch on `(user_id, inn)`. Shops without a tax id are always new.
pub(crate) fn get_or_create_shop(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    shop: &NewShop<'_>,
) -> ClientResult<String> {
    let shop_id = format!("shop_{}", Ulid::new());
    let timestamp = now_timestamp();

    let Some(inn) = shop.inn else {
        connection
            .execute(
                "INSERT INTO shops (
                    shop_id,
                    user_id,
                    legal_name,
                    inn,
                    retail_name,
                    address,
                    created_at
                 ) VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6)",
                params![
                    &shop_id,
                    user_id,
                    shop.legal_name,
                    shop.retail_name,
                    shop.address,
                    &timestamp
                ],
            )
            .map_err(|error| map_sqlite_error(db_path, &error))?;
        tracing::debug!(%shop_id, "created shop without tax id");
        return Ok(shop_id);
    };

    let inserted = connection
        .execute(
            "INSERT OR IGNORE INTO shops (
                shop_id,
                user_id,
                legal_name,
                inn,
                retail_name,
                address,
                created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &shop_id,
                user_id,
                shop.legal_name,
                inn,
                shop.retail_name,
                shop.address,
                &timestamp
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let existing = connection
        .query_row(
            "SELECT shop_id FROM shops WHERE user_id = ?1 AND inn = ?2",
            params![user_id, inn],
            |row| row.get::<_, String>(0),
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    if inserted > 0 {
        tracing::debug!(shop_id = %existing, %inn, "created shop");
    }

    Ok(existing)
}

/// Insert-or-fetch by tax id, else by name. `None` when both are absent.
pub(crate) fn get_or_create_cashier(
    connection: &Connection,
    db_path: &Path,
    name: Option<&str>,
    inn: Option<&str>,
) -> ClientResult<Option<String>> {
    let inn = inn.filter(|value| !value.trim().is_empty());
    let name = name.filter(|value| !value.trim().is_empty());
    if inn.is_none() && name.is_none() {
        return Ok(None);
    }

    let cashier_id = format!("csh_{}", Ulid::new());
    connection
        .execute(
            "INSERT OR IGNORE INTO cashiers (cashier_id, name, inn) VALUES (?1, ?2, ?3)",
            params![&cashier_id, name, inn],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let existing = match inn {
        Some(inn) => connection
            .query_row(
                "SELECT cashier_id FROM cashiers WHERE inn = ?1",
                params![inn],
                |row| row.get::<_, String>(0),
            )
            .optional(),
        None => connection
            .query_row(
                "SELECT cashier_id FROM cashiers WHERE name = ?1 AND inn IS NULL",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional(),
    }
    .map_err(|error| map_sqlite_error(db_path, &error))?;

    Ok(existing)
}

pub(crate) fn insert_receipt(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    shop_id: &str,
    cashier_id: Option<&str>,
    parsed: &ParsedReceipt,
) -> ClientResult<String> {
    let receipt_id = format!("rcpt_{}", Ulid::new());
    connection
        .execute(
            "INSERT INTO receipts (
                receipt_id,
                user_id,
                shop_id,
                cashier_id,
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
                created_at
             ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21
             )",
            params![
                &receipt_id,
                user_id,
                shop_id,
                cashier_id,
                &parsed.external_id,
                parsed.date_time.format(TIMESTAMP_FORMAT).to_string(),
                parsed.total_sum,
                parsed.cash_total_sum,
                parsed.ecash_total_sum,
                parsed.credit_sum,
                parsed.prepaid_sum,
                parsed.provision_sum,
                &parsed.fiscal.drive_number,
                parsed.fiscal.document_number,
                &parsed.fiscal.sign,
                parsed.shift_number,
                parsed.operation_type,
                &parsed.kkt_reg_id,
                parsed.nds10,
                parsed.nds18,
                now_timestamp()
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(receipt_id)
}

pub(crate) fn insert_items(
    connection: &Connection,
    db_path: &Path,
    receipt_id: &str,
    items: &[ParsedItem],
) -> ClientResult<()> {
    let mut statement = connection
        .prepare(
            "INSERT INTO receipt_items (
                item_id,
                receipt_id,
                position,
                name,
                price,
                quantity,
                sum,
                measure,
                product_type,
                gtin,
                raw_product_code
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    for item in items {
        statement
            .execute(params![
                format!("item_{}", Ulid::new()),
                receipt_id,
                item.position,
                &item.name,
                item.price,
                item.quantity,
                item.sum,
                item.measure.as_str(),
                item.product_type,
                &item.gtin,
                &item.raw_product_code
            ])
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    Ok(())
}

pub(crate) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn now_timestamp() -> String {
    format_timestamp(&Utc::now())
}
