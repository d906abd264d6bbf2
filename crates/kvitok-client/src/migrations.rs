use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

const BOOTSTRAP_SQL: &str = include_str!("migrations/0001_bootstrap.sql");
const ADD_STORE_PATTERNS_SQL: &str = include_str!("migrations/0002_store_patterns.sql");

pub const EXPECTED_USER_VERSION: i64 = 2;

pub const REQUIRED_INDEX_NAMES: [&str; 5] = [
    "idx_shops_user_inn",
    "idx_cashiers_inn",
    "idx_cashiers_name_without_inn",
    "idx_receipts_fiscal_triple",
    "idx_store_patterns_user_priority",
];

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    migrations().to_latest(conn)
}

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![M::up(BOOTSTRAP_SQL), M::up(ADD_STORE_PATTERNS_SQL)])
}
