//! Maps a trade name and optional address to one of the user's shops.
//!
//! Tiers run in order and the first hit wins: exact name (and address when
//! given), the user's pattern rules by priority, the shop registered under the
//! receipt's tax id when one is known, then a loose substring match on stored
//! names. Comparisons fold case with `str::to_lowercase` because
//! SQLite's `lower()` only folds ASCII.

pub mod patterns;

use std::path::Path;

use rusqlite::{Connection, params};

use crate::ClientResult;
use crate::resolver::patterns::{PatternRule, PatternType, first_match};
use crate::state::map_sqlite_error;

#[derive(Debug, Clone)]
struct CandidateShop {
    shop_id: String,
    legal_name: String,
    retail_name: Option<String>,
    address: Option<String>,
    inn: Option<String>,
}

impl CandidateShop {
    fn display_name(&self) -> &str {
        self.retail_name.as_deref().unwrap_or(&self.legal_name)
    }
}

pub fn resolve_shop(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    trade_name: &str,
    address: Option<&str>,
) -> ClientResult<Option<String>> {
    resolve_shop_with_tax_id(connection, db_path, user_id, trade_name, address, None)
}

/// Same tiers as [`resolve_shop`]. A known `inn` is tried before the substring
/// tier, and that tier never returns a shop registered under another tax id.
pub fn resolve_shop_with_tax_id(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    trade_name: &str,
    address: Option<&str>,
    inn: Option<&str>,
) -> ClientResult<Option<String>> {
    let trade_name = trade_name.trim();
    if trade_name.is_empty() {
        return Ok(None);
    }
    let address = address.map(str::trim).filter(|value| !value.is_empty());

    let candidates = load_candidates(connection, db_path, user_id)?;
    let name_key = trade_name.to_lowercase();
    let address_key = address.map(str::to_lowercase);

    let exact = candidates.iter().find(|shop| {
        if shop.display_name().trim().to_lowercase() != name_key {
            return false;
        }
        match &address_key {
            Some(wanted) => shop
                .address
                .as_deref()
                .is_some_and(|stored| stored.trim().to_lowercase() == *wanted),
            None => true,
        }
    });
    if let Some(shop) = exact {
        tracing::debug!(shop_id = %shop.shop_id, tier = "exact", "resolved shop");
        return Ok(Some(shop.shop_id.clone()));
    }

    let rules = load_rules(connection, db_path, user_id)?;
    if let Some(rule) = first_match(&rules, trade_name, address) {
        tracing::debug!(
            shop_id = %rule.shop_id,
            pattern_id = %rule.pattern_id,
            tier = "pattern",
            "resolved shop"
        );
        return Ok(Some(rule.shop_id.clone()));
    }

    let inn = inn.map(str::trim).filter(|value| !value.is_empty());
    if let Some(wanted) = inn
        && let Some(shop) = candidates
            .iter()
            .find(|shop| shop.inn.as_deref() == Some(wanted))
    {
        tracing::debug!(shop_id = %shop.shop_id, tier = "tax_id", "resolved shop");
        return Ok(Some(shop.shop_id.clone()));
    }

    let partial = candidates.iter().find(|shop| {
        if inn.is_some() && shop.inn.is_some() {
            return false;
        }
        shop.retail_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&name_key))
            || shop.legal_name.to_lowercase().contains(&name_key)
    });
    if let Some(shop) = partial {
        tracing::debug!(shop_id = %shop.shop_id, tier = "partial", "resolved shop");
        return Ok(Some(shop.shop_id.clone()));
    }

    Ok(None)
}

fn load_candidates(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<Vec<CandidateShop>> {
    let mut statement = connection
        .prepare(
            "SELECT shop_id, legal_name, retail_name, address, inn
             FROM shops
             WHERE user_id = ?1
             ORDER BY rowid ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows = statement
        .query_map(params![user_id], |row| {
            Ok(CandidateShop {
                shop_id: row.get(0)?,
                legal_name: row.get(1)?,
                retail_name: row.get(2)?,
                address: row.get(3)?,
                inn: row.get(4)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut candidates = Vec::new();
    for row in rows {
        candidates.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(candidates)
}

/// Loads the user's rules in evaluation order.
pub(crate) fn load_rules(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<Vec<PatternRule>> {
    let mut statement = connection
        .prepare(
            "SELECT pattern_id, shop_id, pattern_type, pattern_value, is_regex, priority
             FROM store_patterns
             WHERE user_id = ?1
             ORDER BY priority ASC, rowid ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows = statement
        .query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rules = Vec::new();
    for row in rows {
        let (pattern_id, shop_id, pattern_type, pattern_value, is_regex, priority) =
            row.map_err(|error| map_sqlite_error(db_path, &error))?;
        // Guarded by the CHECK constraint on pattern_type.
        let Some(pattern_type) = PatternType::parse(&pattern_type) else {
            continue;
        };
        rules.push(PatternRule {
            pattern_id,
            shop_id,
            pattern_type,
            pattern_value,
            is_regex,
            priority,
        });
    }
    Ok(rules)
}
