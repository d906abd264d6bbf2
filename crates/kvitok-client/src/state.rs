use std::fs;
use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Error as SqliteError, ffi::ErrorCode};

use crate::{ClientError, ClientResult};

pub fn ensure_store_directory(path: &Path) -> ClientResult<()> {
    fs::create_dir_all(path).map_err(|error| map_io_error(path, &error))?;
    set_private_permissions_best_effort(path);
    Ok(())
}

/// Opens a connection with a bounded busy timeout and foreign keys enforced.
pub fn open_connection(db_path: &Path, busy_timeout: Duration) -> ClientResult<Connection> {
    let connection =
        Connection::open(db_path).map_err(|error| map_sqlite_error(db_path, &error))?;
    connection
        .busy_timeout(busy_timeout)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    connection
        .pragma_update(None, "foreign_keys", "ON")
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(connection)
}

pub fn map_io_error(path: &Path, error: &std::io::Error) -> ClientError {
    if error.kind() == std::io::ErrorKind::PermissionDenied {
        return ClientError::store_permission_denied(path, &error.to_string());
    }

    ClientError::store_failed(path, &error.to_string())
}

pub fn map_sqlite_error(path: &Path, error: &SqliteError) -> ClientError {
    let error_code = error.sqlite_error_code();

    if matches!(
        error_code,
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    ) {
        return ClientError::store_locked(path);
    }

    if matches!(error_code, Some(ErrorCode::NotADatabase)) {
        return ClientError::store_corrupt(path);
    }

    if matches!(
        error_code,
        Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly)
    ) {
        return ClientError::store_permission_denied(path, &error.to_string());
    }

    ClientError::store_failed(path, &error.to_string())
}

#[cfg(unix)]
fn set_private_permissions_best_effort(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o700));
}

#[cfg(not(unix))]
fn set_private_permissions_best_effort(_path: &Path) {}
