use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::ClientResult;
use crate::setup::{SetupContext, ensure_initialized, ensure_initialized_at};

pub(crate) fn load_setup(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    if let Some(path) = home_override {
        return ensure_initialized_at(path);
    }
    ensure_initialized()
}

/// Initializes the store if needed and opens a connection to it.
pub(crate) fn open_store(home_override: Option<&Path>) -> ClientResult<(Connection, PathBuf)> {
    let setup = load_setup(home_override)?;
    let connection = setup.connect()?;
    Ok((connection, setup.db_path()))
}
