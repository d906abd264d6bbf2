use std::path::Path;

use crate::ClientResult;
use crate::commands::common::open_store;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::users;

pub fn register(
    email: &str,
    password_hash: &str,
    full_name: Option<&str>,
) -> ClientResult<SuccessEnvelope> {
    register_with_home_override(email, password_hash, full_name, None)
}

#[doc(hidden)]
pub fn register_with_home_override(
    email: &str,
    password_hash: &str,
    full_name: Option<&str>,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (connection, db_path) = open_store(home_override)?;
    let user = users::register_user(&connection, &db_path, email, password_hash, full_name)?;
    success("user register", user)
}

pub fn link_bot(user_id: &str, bot_identity: &str) -> ClientResult<SuccessEnvelope> {
    link_bot_with_home_override(user_id, bot_identity, None)
}

#[doc(hidden)]
pub fn link_bot_with_home_override(
    user_id: &str,
    bot_identity: &str,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (mut connection, db_path) = open_store(home_override)?;
    let user = users::link_bot_identity(&mut connection, &db_path, user_id, bot_identity)?;
    success("user link-bot", user)
}

pub fn find_by_bot(bot_identity: &str) -> ClientResult<SuccessEnvelope> {
    find_by_bot_with_home_override(bot_identity, None)
}

#[doc(hidden)]
pub fn find_by_bot_with_home_override(
    bot_identity: &str,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (connection, db_path) = open_store(home_override)?;
    let user = users::find_user_by_bot_identity(&connection, &db_path, bot_identity.trim())?;
    success("user find-bot", user)
}

pub fn set_active(user_id: &str, is_active: bool) -> ClientResult<SuccessEnvelope> {
    set_active_with_home_override(user_id, is_active, None)
}

#[doc(hidden)]
pub fn set_active_with_home_override(
    user_id: &str,
    is_active: bool,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (connection, db_path) = open_store(home_override)?;
    let user = users::set_user_active(&connection, &db_path, user_id, is_active)?;
    let command = if is_active {
        "user activate"
    } else {
        "user deactivate"
    };
    success(command, user)
}
