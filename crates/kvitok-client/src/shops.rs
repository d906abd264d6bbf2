use std::path::Path;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use ulid::Ulid;

use crate::contracts::types::{PatternRecord, ShopRecord};
use crate::ingest::persist::now_timestamp;
use crate::resolver::patterns::{PatternType, compile_pattern};
use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

pub const DEFAULT_PATTERN_PRIORITY: i64 = 10;

const SHOP_COLUMNS: &str = "shop_id, legal_name, inn, retail_name, address, category, \
     is_favorite, notes, created_at";

/// User-editable shop fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ShopUpdate {
    pub category: Option<String>,
    pub is_favorite: Option<bool>,
    pub notes: Option<String>,
    pub retail_name: Option<String>,
}

impl ShopUpdate {
    fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.is_favorite.is_none()
            && self.notes.is_none()
            && self.retail_name.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewPattern<'a> {
    pub shop_id: &'a str,
    pub pattern_type: PatternType,
    pub pattern_value: &'a str,
    pub is_regex: bool,
    pub priority: i64,
}

pub fn list_shops(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    favorite_only: bool,
) -> ClientResult<Vec<ShopRecord>> {
    let mut statement = connection
        .prepare(&format!(
            "SELECT {SHOP_COLUMNS}
             FROM shops
             WHERE user_id = ?1
               AND (?2 = 0 OR is_favorite = 1)
             ORDER BY COALESCE(retail_name, legal_name) ASC, shop_id ASC"
        ))
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows = statement
        .query_map(params![user_id, favorite_only], shop_from_row)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut shops = Vec::new();
    for row in rows {
        shops.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(shops)
}

pub fn load_shop(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    shop_id: &str,
) -> ClientResult<ShopRecord> {
    connection
        .query_row(
            &format!("SELECT {SHOP_COLUMNS} FROM shops WHERE user_id = ?1 AND shop_id = ?2"),
            params![user_id, shop_id],
            shop_from_row,
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .ok_or_else(|| ClientError::shop_not_found(shop_id))
}

pub fn update_shop(
    connection: &mut Connection,
    db_path: &Path,
    user_id: &str,
    shop_id: &str,
    update: &ShopUpdate,
) -> ClientResult<ShopRecord> {
    if update.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Nothing to update. Pass at least one of --category, --favorite, --notes, --retail-name.",
            Some("shop update"),
        ));
    }

    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    load_shop(&transaction, db_path, user_id, shop_id)?;

    transaction
        .execute(
            "UPDATE shops SET
                category = COALESCE(?1, category),
                is_favorite = COALESCE(?2, is_favorite),
                notes = COALESCE(?3, notes),
                retail_name = COALESCE(?4, retail_name)
             WHERE user_id = ?5 AND shop_id = ?6",
            params![
                &update.category,
                update.is_favorite,
                &update.notes,
                &update.retail_name,
                user_id,
                shop_id
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let shop = load_shop(&transaction, db_path, user_id, shop_id)?;
    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(shop)
}

/// Deletes a shop and its patterns. Refused while receipts reference it.
pub fn delete_shop(
    connection: &mut Connection,
    db_path: &Path,
    user_id: &str,
    shop_id: &str,
) -> ClientResult<()> {
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    load_shop(&transaction, db_path, user_id, shop_id)?;

    let receipt_count = transaction
        .query_row(
            "SELECT COUNT(*) FROM receipts WHERE shop_id = ?1",
            params![shop_id],
            |row| row.get::<_, i64>(0),
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if receipt_count > 0 {
        return Err(ClientError::shop_in_use(shop_id, receipt_count));
    }

    transaction
        .execute(
            "DELETE FROM shops WHERE user_id = ?1 AND shop_id = ?2",
            params![user_id, shop_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    tracing::info!(%shop_id, "deleted shop");
    Ok(())
}

/// Stores a resolver rule. Invalid regexes are kept and reported through
/// `regex_valid`; the resolver skips them.
pub fn add_pattern(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    pattern: &NewPattern<'_>,
) -> ClientResult<PatternRecord> {
    if pattern.pattern_value.trim().is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Pattern value must not be empty.",
            Some("pattern add"),
        ));
    }
    load_shop(connection, db_path, user_id, pattern.shop_id)?;

    let pattern_id = format!("pat_{}", Ulid::new());
    connection
        .execute(
            "INSERT INTO store_patterns (
                pattern_id,
                user_id,
                shop_id,
                pattern_type,
                pattern_value,
                is_regex,
                priority,
                created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &pattern_id,
                user_id,
                pattern.shop_id,
                pattern.pattern_type.as_str(),
                pattern.pattern_value,
                pattern.is_regex,
                pattern.priority,
                now_timestamp()
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let record = load_pattern(connection, db_path, user_id, &pattern_id)?;
    if !record.regex_valid {
        tracing::warn!(%pattern_id, "stored store pattern with invalid regex");
    }
    Ok(record)
}

pub fn list_patterns(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<Vec<PatternRecord>> {
    let mut statement = connection
        .prepare(
            "SELECT pattern_id, shop_id, pattern_type, pattern_value, is_regex, priority, created_at
             FROM store_patterns
             WHERE user_id = ?1
             ORDER BY priority ASC, rowid ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows = statement
        .query_map(params![user_id], pattern_from_row)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut patterns = Vec::new();
    for row in rows {
        patterns.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(patterns)
}

pub fn remove_pattern(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    pattern_id: &str,
) -> ClientResult<()> {
    let removed = connection
        .execute(
            "DELETE FROM store_patterns WHERE user_id = ?1 AND pattern_id = ?2",
            params![user_id, pattern_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if removed == 0 {
        return Err(ClientError::pattern_not_found(pattern_id));
    }
    Ok(())
}

fn load_pattern(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    pattern_id: &str,
) -> ClientResult<PatternRecord> {
    connection
        .query_row(
            "SELECT pattern_id, shop_id, pattern_type, pattern_value, is_regex, priority, created_at
             FROM store_patterns
             WHERE user_id = ?1 AND pattern_id = ?2",
            params![user_id, pattern_id],
            pattern_from_row,
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .ok_or_else(|| ClientError::pattern_not_found(pattern_id))
}

pub(crate) fn shop_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShopRecord> {
    Ok(ShopRecord {
        shop_id: row.get(0)?,
        legal_name: row.get(1)?,
        inn: row.get(2)?,
        retail_name: row.get(3)?,
        address: row.get(4)?,
        category: row.get(5)?,
        is_favorite: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn pattern_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatternRecord> {
    let pattern_value: String = row.get(3)?;
    let is_regex: bool = row.get(4)?;
    let regex_valid = !is_regex || compile_pattern(&pattern_value).is_ok();
    Ok(PatternRecord {
        pattern_id: row.get(0)?,
        shop_id: row.get(1)?,
        pattern_type: row.get(2)?,
        pattern_value,
        is_regex,
        priority: row.get(5)?,
        regex_valid,
        created_at: row.get(6)?,
    })
}
