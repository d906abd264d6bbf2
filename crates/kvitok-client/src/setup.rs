use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};

use crate::config::ClientConfig;
use crate::migrations::{EXPECTED_USER_VERSION, REQUIRED_INDEX_NAMES, run_pending};
use crate::state::{ensure_store_directory, map_sqlite_error, open_connection};
use crate::{ClientError, ClientResult};

const USERS_COLUMNS: [&str; 7] = [
    "user_id",
    "email",
    "password_hash",
    "full_name",
    "bot_identity",
    "is_active",
    "created_at",
];
const SHOPS_COLUMNS: [&str; 10] = [
    "shop_id",
    "user_id",
    "legal_name",
    "inn",
    "retail_name",
    "address",
    "category",
    "is_favorite",
    "notes",
    "created_at",
];
const CASHIERS_COLUMNS: [&str; 3] = ["cashier_id", "name", "inn"];
const RECEIPTS_COLUMNS: [&str; 12] = [
    "receipt_id",
    "user_id",
    "shop_id",
    "cashier_id",
    "external_id",
    "date_time",
    "total_sum",
    "cash_total_sum",
    "ecash_total_sum",
    "fiscal_drive_number",
    "fiscal_document_number",
    "fiscal_sign",
];
const RECEIPT_ITEMS_COLUMNS: [&str; 9] = [
    "item_id",
    "receipt_id",
    "name",
    "price",
    "quantity",
    "sum",
    "measure",
    "gtin",
    "raw_product_code",
];
const STORE_PATTERNS_COLUMNS: [&str; 7] = [
    "pattern_id",
    "user_id",
    "shop_id",
    "pattern_type",
    "pattern_value",
    "is_regex",
    "priority",
];

const REQUIRED_CORE_TABLES: [(&str, &[&str]); 7] = [
    ("internal_meta", &["key", "value"]),
    ("users", &USERS_COLUMNS),
    ("shops", &SHOPS_COLUMNS),
    ("cashiers", &CASHIERS_COLUMNS),
    ("receipts", &RECEIPTS_COLUMNS),
    ("receipt_items", &RECEIPT_ITEMS_COLUMNS),
    ("store_patterns", &STORE_PATTERNS_COLUMNS),
];

#[derive(Debug, Clone)]
pub struct SetupContext {
    pub db_path: String,
    pub schema_version: String,
    pub busy_timeout: Duration,
}

impl SetupContext {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.db_path)
    }

    pub fn connect(&self) -> ClientResult<Connection> {
        open_connection(&self.db_path(), self.busy_timeout)
    }
}

pub fn ensure_initialized() -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(None)
}

pub fn ensure_initialized_at(home_override: &Path) -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(Some(home_override))
}

pub(crate) fn ensure_initialized_with_home_override(
    home_override: Option<&Path>,
) -> ClientResult<SetupContext> {
    let config = ClientConfig::resolve(home_override)?;
    ensure_store_directory(&config.home)?;

    let db_path = config.db_path();
    let mut connection = open_connection(&db_path, config.busy_timeout)?;

    run_pending(&mut connection).map_err(|error| map_migration_error(&db_path, &error))?;

    verify_core_tables(&connection, &db_path)?;
    verify_indexes_and_version(&connection, &db_path)?;
    let schema_version = read_schema_version(&connection, &db_path)?;

    tracing::debug!(db_path = %db_path.display(), %schema_version, "receipt store ready");

    Ok(SetupContext {
        db_path: db_path.display().to_string(),
        schema_version,
        busy_timeout: config.busy_timeout,
    })
}

fn map_migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> ClientError {
    match error {
        rusqlite_migration::Error::RusqliteError { query: _, err } => {
            let mapped = map_sqlite_error(db_path, err);
            if matches!(
                mapped.code.as_str(),
                "store_locked" | "store_corrupt" | "store_permission_denied"
            ) {
                mapped
            } else {
                ClientError::migration_failed(db_path, &error.to_string())
            }
        }
        _ => ClientError::migration_failed(db_path, &error.to_string()),
    }
}

fn verify_core_tables(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    for (table_name, required_columns) in REQUIRED_CORE_TABLES {
        if !sqlite_object_exists(connection, "table", table_name, db_path)? {
            return Err(ClientError::store_corrupt(db_path));
        }

        let columns = table_columns(connection, table_name, db_path)?;
        for required_column in required_columns {
            if !columns.iter().any(|column| column == required_column) {
                return Err(ClientError::store_corrupt(db_path));
            }
        }
    }

    Ok(())
}

fn verify_indexes_and_version(connection: &Connection, db_path: &Path) -> ClientResult<()> {
    let user_version = connection
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if user_version != EXPECTED_USER_VERSION {
        return Err(ClientError::store_corrupt(db_path));
    }

    // The uniqueness indexes carry the dedupe and get-or-create guarantees.
    for index_name in REQUIRED_INDEX_NAMES {
        if !sqlite_object_exists(connection, "index", index_name, db_path)? {
            return Err(ClientError::store_corrupt(db_path));
        }
    }

    Ok(())
}

fn sqlite_object_exists(
    connection: &Connection,
    object_type: &str,
    object_name: &str,
    db_path: &Path,
) -> ClientResult<bool> {
    let exists = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2 LIMIT 1",
            params![object_type, object_name],
            |_row| Ok(true),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?
        .unwrap_or(false);

    Ok(exists)
}

fn table_columns(
    connection: &Connection,
    table_name: &str,
    db_path: &Path,
) -> ClientResult<Vec<String>> {
    if !REQUIRED_CORE_TABLES
        .iter()
        .any(|(required_name, _)| required_name == &table_name)
    {
        return Err(ClientError::store_failed(
            db_path,
            "Refused PRAGMA table inspection for non-core table.",
        ));
    }

    // SAFETY: `table_name` is restricted to REQUIRED_CORE_TABLES above.
    let sql = format!("PRAGMA table_info({table_name})");
    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let column_iter = statement
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut columns: Vec<String> = Vec::new();
    for row in column_iter {
        columns.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }

    Ok(columns)
}

fn read_schema_version(connection: &Connection, db_path: &Path) -> ClientResult<String> {
    let value = connection
        .query_row(
            "SELECT value FROM internal_meta WHERE key = 'schema_version' LIMIT 1",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    Ok(value.unwrap_or_else(|| "v1".to_string()))
}
