use std::path::Path;

use crate::ClientResult;
use crate::commands::common::open_store;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{ShopDeleteData, ShopListData, ShopResolveData};
use crate::resolver::resolve_shop;
use crate::shops::{self, ShopUpdate};
use crate::users::require_user;

#[derive(Debug, Default)]
pub struct ShopUpdateOptions<'a> {
    pub user_id: String,
    pub shop_id: String,
    pub update: ShopUpdate,
    pub home_override: Option<&'a Path>,
}

pub fn list(user_id: &str, favorite_only: bool) -> ClientResult<SuccessEnvelope> {
    list_with_home_override(user_id, favorite_only, None)
}

#[doc(hidden)]
pub fn list_with_home_override(
    user_id: &str,
    favorite_only: bool,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (connection, db_path) = open_store(home_override)?;
    require_user(&connection, &db_path, user_id)?;
    let shops = shops::list_shops(&connection, &db_path, user_id, favorite_only)?;
    success(
        "shop list",
        ShopListData {
            favorite_only,
            shops,
        },
    )
}

pub fn resolve(
    user_id: &str,
    trade_name: &str,
    address: Option<&str>,
) -> ClientResult<SuccessEnvelope> {
    resolve_with_home_override(user_id, trade_name, address, None)
}

#[doc(hidden)]
pub fn resolve_with_home_override(
    user_id: &str,
    trade_name: &str,
    address: Option<&str>,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (connection, db_path) = open_store(home_override)?;
    require_user(&connection, &db_path, user_id)?;
    let shop_id = resolve_shop(&connection, &db_path, user_id, trade_name, address)?;
    success(
        "shop resolve",
        ShopResolveData {
            trade_name: trade_name.to_string(),
            address: address.map(str::to_string),
            shop_id,
        },
    )
}

pub fn update(user_id: &str, shop_id: &str, update: ShopUpdate) -> ClientResult<SuccessEnvelope> {
    update_with_options(ShopUpdateOptions {
        user_id: user_id.to_string(),
        shop_id: shop_id.to_string(),
        update,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn update_with_options(options: ShopUpdateOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let (mut connection, db_path) = open_store(options.home_override)?;
    require_user(&connection, &db_path, &options.user_id)?;
    let shop = shops::update_shop(
        &mut connection,
        &db_path,
        &options.user_id,
        &options.shop_id,
        &options.update,
    )?;
    success("shop update", shop)
}

pub fn delete(user_id: &str, shop_id: &str) -> ClientResult<SuccessEnvelope> {
    delete_with_home_override(user_id, shop_id, None)
}

#[doc(hidden)]
pub fn delete_with_home_override(
    user_id: &str,
    shop_id: &str,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (mut connection, db_path) = open_store(home_override)?;
    require_user(&connection, &db_path, user_id)?;
    shops::delete_shop(&mut connection, &db_path, user_id, shop_id)?;
    success(
        "shop delete",
        ShopDeleteData {
            shop_id: shop_id.to_string(),
            deleted: true,
        },
    )
}
