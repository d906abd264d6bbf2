use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{ClientError, ClientResult};

pub const HOME_ENV: &str = "KVITOK_HOME";
pub const BUSY_TIMEOUT_ENV: &str = "KVITOK_BUSY_TIMEOUT_MS";
pub const LOG_ENV: &str = "KVITOK_LOG";

const DEFAULT_HOME_DIR: &str = ".kvitok";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 2_000;

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub home: PathBuf,
    pub busy_timeout: Duration,
}

impl ClientConfig {
    /// Resolves settings, preferring `home_override` over `KVITOK_HOME`.
    pub fn resolve(home_override: Option<&Path>) -> ClientResult<Self> {
        let home = match home_override {
            Some(path) => path.to_path_buf(),
            None => default_home()?,
        };

        Ok(Self {
            home: absolutize(&home)?,
            busy_timeout: busy_timeout_from_env(),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.home.join("kvitok.db")
    }
}

fn default_home() -> ClientResult<PathBuf> {
    if let Some(override_path) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(override_path));
    }

    match home::home_dir() {
        Some(home_path) => Ok(home_path.join(DEFAULT_HOME_DIR)),
        None => Err(ClientError::store_failed(
            Path::new("."),
            "Could not resolve a home directory for the receipt store.",
        )),
    }
}

fn busy_timeout_from_env() -> Duration {
    let millis = std::env::var(BUSY_TIMEOUT_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS);
    Duration::from_millis(millis)
}

fn absolutize(path: &Path) -> ClientResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|error| ClientError::store_failed(path, &error.to_string()))
}
