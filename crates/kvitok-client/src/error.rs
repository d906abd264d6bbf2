use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

pub(crate) const INGEST_HELP_COMMAND: &str = "kvitok ingest --help";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// True for failures of the store itself rather than of the caller's input.
    pub fn is_storage(&self) -> bool {
        self.code.starts_with("store_") || self.code == "migration_failed"
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `kvitok {cmd} --help` for usage."),
            None => "Run `kvitok --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn receipt_parse(detail: &str) -> Self {
        Self::new(
            "receipt_parse_error",
            &format!("Receipt document is not valid JSON: {detail}"),
            vec![
                "Export the receipt again from the e-receipt service as a .json file.".to_string(),
                format!("Run `{INGEST_HELP_COMMAND}` to review the accepted shapes."),
            ],
        )
    }

    pub fn receipt_schema(path: &str, detail: &str) -> Self {
        Self::new(
            "receipt_schema_error",
            &format!("Receipt document is missing or has an invalid `{path}`: {detail}"),
            vec![
                "Check that the document is a fiscal receipt export, not a receipt list or QR payload."
                    .to_string(),
                format!("Run `{INGEST_HELP_COMMAND}` to review the required fields."),
            ],
        )
        .with_data(json!({
            "path": path,
        }))
    }

    pub fn user_not_found(user_id: &str) -> Self {
        Self::new(
            "user_not_found",
            &format!("User `{user_id}` was not found."),
            vec!["Run `kvitok user register <email>` to create a user.".to_string()],
        )
        .with_data(json!({
            "user_id": user_id,
        }))
    }

    pub fn user_inactive(user_id: &str) -> Self {
        Self::new(
            "user_inactive",
            &format!("User `{user_id}` is deactivated."),
            vec![format!("Run `kvitok user activate {user_id}` to re-enable the user.")],
        )
        .with_data(json!({
            "user_id": user_id,
        }))
    }

    pub fn user_exists(email: &str) -> Self {
        Self::new(
            "user_exists",
            &format!("A user with email `{email}` is already registered."),
            vec!["Use the existing user id, or register with a different email.".to_string()],
        )
    }

    pub fn shop_not_found(shop_id: &str) -> Self {
        Self::new(
            "shop_not_found",
            &format!("Shop `{shop_id}` was not found for this user."),
            vec!["Run `kvitok shop list --user <id>` to find a valid shop id.".to_string()],
        )
        .with_data(json!({
            "shop_id": shop_id,
        }))
    }

    pub fn shop_in_use(shop_id: &str, receipt_count: i64) -> Self {
        Self::new(
            "shop_in_use",
            &format!("Shop `{shop_id}` is referenced by {receipt_count} receipts and cannot be deleted."),
            vec!["Delete or reassign the receipts that reference this shop first.".to_string()],
        )
        .with_data(json!({
            "shop_id": shop_id,
            "receipt_count": receipt_count,
        }))
    }

    pub fn pattern_not_found(pattern_id: &str) -> Self {
        Self::new(
            "pattern_not_found",
            &format!("Store pattern `{pattern_id}` was not found for this user."),
            vec!["Run `kvitok pattern list --user <id>` to find a valid pattern id.".to_string()],
        )
    }

    pub fn receipt_not_found(receipt_id: &str) -> Self {
        Self::new(
            "receipt_not_found",
            &format!("Receipt `{receipt_id}` was not found for this user."),
            vec!["Run `kvitok receipt list --user <id>` to find a valid receipt id.".to_string()],
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn store_permission_denied(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_permission_denied",
            &format!("Cannot open receipt store at `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or set `KVITOK_HOME` to a writable directory."
            )],
        )
    }

    pub fn store_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_locked",
            &format!("Receipt store is locked at `{location}`."),
            vec![
                format!("Close other processes using `{location}` so the lock is released."),
                "Raise `KVITOK_BUSY_TIMEOUT_MS` if ingestions regularly overlap.".to_string(),
            ],
        )
    }

    pub fn store_corrupt(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_corrupt",
            &format!("Receipt store appears corrupt at `{location}`."),
            vec![format!(
                "Replace `{location}` with a valid SQLite file or restore from backup."
            )],
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "migration_failed",
            &format!("Receipt store migration failed at `{location}`: {detail}"),
            vec!["Resolve conflicting schema objects referenced in the error details.".to_string()],
        )
    }

    pub fn store_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "store_failed",
            &format!("Receipt store operation failed at `{location}`: {detail}"),
            Vec::new(),
        )
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
