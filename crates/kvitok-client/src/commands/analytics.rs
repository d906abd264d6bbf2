use std::path::Path;

use chrono::{DateTime, Utc};

use crate::analytics::{self, DEFAULT_TOP_PRODUCTS_LIMIT, Pagination, ShopSort};
use crate::commands::common::open_store;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{MonthlyDynamicsData, ShopSpendingData, TopProductsData};
use crate::users::require_user;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
pub struct TopProductsOptions<'a> {
    pub user_id: String,
    pub months_back: Option<u32>,
    pub limit: Option<i64>,
    pub as_of: Option<DateTime<Utc>>,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct ShopSpendingOptions<'a> {
    pub user_id: String,
    pub sort_by: Option<String>,
    pub descending: bool,
    pub pagination: Pagination,
    pub home_override: Option<&'a Path>,
}

pub fn total(user_id: &str) -> ClientResult<SuccessEnvelope> {
    total_with_home_override(user_id, None)
}

#[doc(hidden)]
pub fn total_with_home_override(
    user_id: &str,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    let (connection, db_path) = open_store(home_override)?;
    require_user(&connection, &db_path, user_id)?;
    let totals = analytics::total_spending(&connection, &db_path, user_id)?;
    success("analytics total", totals)
}

pub fn monthly(user_id: &str, year: i32) -> ClientResult<SuccessEnvelope> {
    monthly_with_home_override(user_id, year, None)
}

#[doc(hidden)]
pub fn monthly_with_home_override(
    user_id: &str,
    year: i32,
    home_override: Option<&Path>,
) -> ClientResult<SuccessEnvelope> {
    if !(1..=9999).contains(&year) {
        return Err(ClientError::invalid_argument_for_command(
            "Year must be between 1 and 9999.",
            Some("analytics monthly"),
        ));
    }

    let (connection, db_path) = open_store(home_override)?;
    require_user(&connection, &db_path, user_id)?;
    let months = analytics::monthly_dynamics(&connection, &db_path, user_id, year)?;
    success("analytics monthly", MonthlyDynamicsData { year, months })
}

pub fn top_products(
    user_id: &str,
    months_back: Option<u32>,
    limit: Option<i64>,
) -> ClientResult<SuccessEnvelope> {
    top_products_with_options(TopProductsOptions {
        user_id: user_id.to_string(),
        months_back,
        limit,
        as_of: None,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn top_products_with_options(options: TopProductsOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let limit = options.limit.unwrap_or(DEFAULT_TOP_PRODUCTS_LIMIT);

    let (connection, db_path) = open_store(options.home_override)?;
    require_user(&connection, &db_path, &options.user_id)?;
    let products = analytics::top_products_as_of(
        &connection,
        &db_path,
        &options.user_id,
        options.months_back,
        limit,
        options.as_of.unwrap_or_else(Utc::now),
    )?;
    success(
        "analytics top-products",
        TopProductsData {
            months_back: options.months_back,
            limit,
            products,
        },
    )
}

pub fn by_shop(
    user_id: &str,
    sort_by: Option<String>,
    descending: bool,
    pagination: Pagination,
) -> ClientResult<SuccessEnvelope> {
    by_shop_with_options(ShopSpendingOptions {
        user_id: user_id.to_string(),
        sort_by,
        descending,
        pagination,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn by_shop_with_options(options: ShopSpendingOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let sort = ShopSort::from_request(options.sort_by.as_deref(), options.descending);
    let window = options.pagination.resolve();

    let (connection, db_path) = open_store(options.home_override)?;
    require_user(&connection, &db_path, &options.user_id)?;
    let shops =
        analytics::spending_by_shop(&connection, &db_path, &options.user_id, sort, window)?;
    success(
        "analytics by-shop",
        ShopSpendingData {
            sort_by: sort.key.as_str().to_string(),
            descending: sort.descending,
            offset: window.offset,
            limit: window.limit,
            shops,
        },
    )
}
