use std::path::Path;

use crate::commands::common::open_store;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{PatternListData, PatternRemoveData};
use crate::resolver::patterns::PatternType;
use crate::shops::{self, DEFAULT_PATTERN_PRIORITY, NewPattern};
use crate::users::require_user;
use crate::{ClientError, ClientResult};

#[derive(Debug)]
pub struct PatternAddOptions<'a> {
    pub user_id: String,
    pub shop_id: String,
    pub pattern_type: String,
    pub pattern_value: String,
    pub is_regex: bool,
    pub priority: Option<i64>,
    pub home_override: Option<&'a Path>,
}

pub fn add(
    user_id: &str,
    shop_id: &str,
    pattern_type: &str,
    pattern_value: &str,
    is_regex: bool,
    priority: Option<i64>,
) -> ClientResult<SuccessEnvelope> {
    add_with_options(PatternAddOptions {
        user_id: user_id.to_string(),
        shop_id: shop_id.to_string(),
        pattern_type: pattern_type.to_string(),
        pattern_value: pattern_value.to_string(),
        is_regex,
        priority,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn add_with_options(options: PatternAddOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let Some(pattern_type) = PatternType::parse(&options.pattern_type) else {
        return Err(ClientError::invalid_argument_for_command(
            &format!(
                "Unknown pattern type `{}`. Use one of: name, address, both.",
                options.pattern_type
            ),
            Some("pattern add"),
        ));
    };

    let (connection, db_path) = open_store(options.home_override)?;
    require_user(&connection, &db_path, &options.user_id)?;
    let pattern = shops::add_pattern(
        &connection,
        &db_path,
        &options.user_id,
        &NewPattern {
            shop_id: &options.shop_id,
            pattern_type,
            pattern_value: &options.pattern_value,
            is_regex: options.is_regex,
            priority: options.priority.unwrap_or(DEFAULT_PATTERN_PRIORITY),
        },
    )?;
    success("pattern add", pattern)
}

pub fn list(user_id: &str) -> ClientResult<SuccessEnvelope> {
    list_with_home_override(user_id, None)
}

#[doc(hidden)]
pub fn list_with_home_override(
    user_id: &str,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (connection, db_path) = open_store(home_override)?;
    require_user(&connection, &db_path, user_id)?;
    let patterns = shops::list_patterns(&connection, &db_path, user_id)?;
    success("pattern list", PatternListData { patterns })
}

pub fn remove(user_id: &str, pattern_id: &str) -> ClientResult<SuccessEnvelope> {
    remove_with_home_override(user_id, pattern_id, None)
}

#[doc(hidden)]
pub fn remove_with_home_override(
    user_id: &str,
    pattern_id: &str,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (connection, db_path) = open_store(home_override)?;
    require_user(&connection, &db_path, user_id)?;
    shops::remove_pattern(&connection, &db_path, user_id, pattern_id)?;
    success(
        "pattern remove",
        PatternRemoveData {
            pattern_id: pattern_id.to_string(),
            removed: true,
        },
    )
}
