use std::path::Path;

use rusqlite::{Connection, params};

use crate::ClientResult;
use crate::contracts::types::ShopSpendingRow;
use crate::state::map_sqlite_error;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopSortKey {
    Id,
    RetailName,
    LegalName,
    TotalAmount,
    ReceiptsCount,
    ReceiptAvg,
}

impl ShopSortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "id" => Some(Self::Id),
            "retail_name" => Some(Self::RetailName),
            "legal_name" => Some(Self::LegalName),
            "total_amount" => Some(Self::TotalAmount),
            "receipts_count" => Some(Self::ReceiptsCount),
            "receipt_avg" => Some(Self::ReceiptAvg),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::RetailName => "retail_name",
            Self::LegalName => "legal_name",
            Self::TotalAmount => "total_amount",
            Self::ReceiptsCount => "receipts_count",
            Self::ReceiptAvg => "receipt_avg",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Id => "s.shop_id",
            Self::RetailName => "s.retail_name",
            Self::LegalName => "s.legal_name",
            Self::TotalAmount => "total_amount",
            Self::ReceiptsCount => "receipts_count",
            Self::ReceiptAvg => "receipt_avg",
        }
    }
}

/// Sort requested by the caller. Unknown keys become total amount descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopSort {
    pub key: ShopSortKey,
    pub descending: bool,
}

impl ShopSort {
    pub fn from_request(sort_by: Option<&str>, descending: bool) -> Self {
        match sort_by {
            None => Self {
                key: ShopSortKey::TotalAmount,
                descending,
            },
            Some(value) => match ShopSortKey::parse(value) {
                Some(key) => Self { key, descending },
                None => {
                    tracing::debug!(sort_by = value, "unknown shop sort key, using total_amount");
                    Self {
                        key: ShopSortKey::TotalAmount,
                        descending: true,
                    }
                }
            },
        }
    }
}

/// Either offset/limit or page/page-size. Page fields win when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWindow {
    pub offset: i64,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn resolve(&self) -> RowWindow {
        if self.page.is_some() || self.page_size.is_some() {
            let page = self.page.unwrap_or(1).max(1);
            let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
            return RowWindow {
                offset: (page - 1).saturating_mul(page_size),
                limit: Some(page_size),
            };
        }

        RowWindow {
            offset: self.offset.unwrap_or(0).max(0),
            limit: self.limit.map(|limit| limit.max(0)),
        }
    }
}

pub fn spending_by_shop(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    sort: ShopSort,
    window: RowWindow,
) -> ClientResult<Vec<ShopSpendingRow>> {
    let direction = if sort.descending { "DESC" } else { "ASC" };
    // Column and direction come from the enums above, never from caller text.
    let sql = format!(
        "SELECT
            s.shop_id,
            s.retail_name,
            s.legal_name,
            s.inn,
            s.address,
            s.category,
            s.is_favorite,
            SUM(r.total_sum) AS total_amount,
            COUNT(r.receipt_id) AS receipts_count,
            AVG(r.total_sum) AS receipt_avg
         FROM shops s
         JOIN receipts r ON r.shop_id = s.shop_id
         WHERE r.user_id = ?1
         GROUP BY s.shop_id
         ORDER BY {} {direction}, s.shop_id ASC
         LIMIT ?2 OFFSET ?3",
        sort.key.column()
    );

    let mut statement = connection
        .prepare(&sql)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows = statement
        .query_map(
            params![user_id, window.limit.unwrap_or(-1), window.offset],
            |row| {
                Ok(ShopSpendingRow {
                    shop_id: row.get(0)?,
                    retail_name: row.get(1)?,
                    legal_name: row.get(2)?,
                    inn: row.get(3)?,
                    address: row.get(4)?,
                    category: row.get(5)?,
                    is_favorite: row.get(6)?,
                    total_amount: row.get(7)?,
                    receipts_count: row.get(8)?,
                    receipt_avg: row.get(9)?,
                })
            },
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut shops = Vec::new();
    for row in rows {
        shops.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(shops)
}
