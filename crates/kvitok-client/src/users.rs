use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use ulid::Ulid;

use crate::contracts::types::UserRecord;
use crate::ingest::persist::now_timestamp;
use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

const USER_COLUMNS: &str = "user_id, email, full_name, bot_identity, is_active, created_at";

/// Creates a user. The password hash is stored as given.
pub fn register_user(
    connection: &Connection,
    db_path: &Path,
    email: &str,
    password_hash: &str,
    full_name: Option<&str>,
) -> ClientResult<UserRecord> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ClientError::invalid_argument_for_command(
            "Email must be a non-empty address containing `@`.",
            Some("user register"),
        ));
    }
    if password_hash.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Password hash must not be empty.",
            Some("user register"),
        ));
    }

    let user_id = format!("usr_{}", Ulid::new());
    let inserted = connection
        .execute(
            "INSERT OR IGNORE INTO users (
                user_id,
                email,
                password_hash,
                full_name,
                bot_identity,
                is_active,
                created_at
             ) VALUES (?1, ?2, ?3, ?4, NULL, 1, ?5)",
            params![
                &user_id,
                &email,
                password_hash,
                full_name.map(str::trim).filter(|name| !name.is_empty()),
                now_timestamp()
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    if inserted == 0 {
        return Err(ClientError::user_exists(&email));
    }

    tracing::info!(%user_id, "registered user");
    load_user(connection, db_path, &user_id)
}

pub fn load_user(connection: &Connection, db_path: &Path, user_id: &str) -> ClientResult<UserRecord> {
    find_user(connection, db_path, user_id)?.ok_or_else(|| ClientError::user_not_found(user_id))
}

pub fn find_user_by_bot_identity(
    connection: &Connection,
    db_path: &Path,
    bot_identity: &str,
) -> ClientResult<Option<UserRecord>> {
    connection
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE bot_identity = ?1"),
            params![bot_identity],
            user_from_row,
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

/// Binds a messaging-bot identity to the user, moving it off any other user.
pub fn link_bot_identity(
    connection: &mut Connection,
    db_path: &Path,
    user_id: &str,
    bot_identity: &str,
) -> ClientResult<UserRecord> {
    let bot_identity = bot_identity.trim();
    if bot_identity.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            "Bot identity must not be empty.",
            Some("user link-bot"),
        ));
    }

    let transaction = connection
        .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    load_user(&transaction, db_path, user_id)?;
    transaction
        .execute(
            "UPDATE users SET bot_identity = NULL WHERE bot_identity = ?1 AND user_id != ?2",
            params![bot_identity, user_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    transaction
        .execute(
            "UPDATE users SET bot_identity = ?1 WHERE user_id = ?2",
            params![bot_identity, user_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let user = load_user(&transaction, db_path, user_id)?;
    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(user)
}

pub fn set_user_active(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    is_active: bool,
) -> ClientResult<UserRecord> {
    let updated = connection
        .execute(
            "UPDATE users SET is_active = ?1 WHERE user_id = ?2",
            params![is_active, user_id],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    if updated == 0 {
        return Err(ClientError::user_not_found(user_id));
    }

    tracing::info!(%user_id, is_active, "changed user activation");
    load_user(connection, db_path, user_id)
}

pub(crate) fn require_user(connection: &Connection, db_path: &Path, user_id: &str) -> ClientResult<()> {
    load_user(connection, db_path, user_id).map(|_| ())
}

pub(crate) fn require_active_user(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<()> {
    let user = load_user(connection, db_path, user_id)?;
    if !user.is_active {
        return Err(ClientError::user_inactive(user_id));
    }
    Ok(())
}

fn find_user(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<Option<UserRecord>> {
    connection
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            params![user_id],
            user_from_row,
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        bot_identity: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}
