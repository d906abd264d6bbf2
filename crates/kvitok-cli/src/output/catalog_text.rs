//! Users, shops and pattern rules.

use std::io;

use serde_json::Value;

use super::format::{
    Align, Column, int_field, key_value_rows, or_dash, render_table_or_blocks, rows_of, str_field,
    terminal_width,
};

pub fn render_user(command: &str, data: &Value) -> io::Result<String> {
    if data.is_null() {
        return Ok("No user is linked to that bot identity.".to_string());
    }

    let heading = match command {
        "user register" => "Registered user.",
        "user link-bot" => "Linked bot identity.",
        "user activate" => "User activated.",
        "user deactivate" => "User deactivated.",
        _ => "User:",
    };
    let active = data.get("is_active").and_then(Value::as_bool).unwrap_or(false);

    let mut lines = vec![heading.to_string()];
    lines.extend(key_value_rows(&[
        ("User id:", or_dash(str_field(data, "user_id"))),
        ("Email:", or_dash(str_field(data, "email"))),
        ("Name:", or_dash(str_field(data, "full_name"))),
        ("Bot identity:", or_dash(str_field(data, "bot_identity"))),
        ("Active:", if active { "yes" } else { "no" }.to_string()),
    ]));
    Ok(lines.join("\n"))
}

pub fn render_shop_list(data: &Value) -> io::Result<String> {
    let shops = rows_of(data, "shops");
    if shops.is_empty() {
        return Ok("No shops yet. Shops are created as receipts are ingested.".to_string());
    }

    let columns = [
        Column {
            name: "Shop",
            align: Align::Left,
        },
        Column {
            name: "Legal name",
            align: Align::Left,
        },
        Column {
            name: "INN",
            align: Align::Left,
        },
        Column {
            name: "Category",
            align: Align::Left,
        },
        Column {
            name: "Fav",
            align: Align::Left,
        },
        Column {
            name: "Id",
            align: Align::Left,
        },
    ];
    let rows = shops
        .iter()
        .map(|shop| {
            let favorite = shop.get("is_favorite").and_then(Value::as_bool) == Some(true);
            vec![
                or_dash(str_field(shop, "retail_name")),
                or_dash(str_field(shop, "legal_name")),
                or_dash(str_field(shop, "inn")),
                or_dash(str_field(shop, "category")),
                if favorite { "*" } else { "" }.to_string(),
                or_dash(str_field(shop, "shop_id")),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![format!("{} shop(s):", shops.len())];
    lines.extend(render_table_or_blocks(&columns, &rows, terminal_width(), "Shop"));
    Ok(lines.join("\n"))
}

pub fn render_shop(data: &Value) -> io::Result<String> {
    let favorite = data.get("is_favorite").and_then(Value::as_bool) == Some(true);
    let mut lines = vec!["Shop updated.".to_string()];
    lines.extend(key_value_rows(&[
        ("Shop id:", or_dash(str_field(data, "shop_id"))),
        ("Trade name:", or_dash(str_field(data, "retail_name"))),
        ("Legal name:", or_dash(str_field(data, "legal_name"))),
        ("INN:", or_dash(str_field(data, "inn"))),
        ("Address:", or_dash(str_field(data, "address"))),
        ("Category:", or_dash(str_field(data, "category"))),
        ("Favorite:", if favorite { "yes" } else { "no" }.to_string()),
        ("Notes:", or_dash(str_field(data, "notes"))),
    ]));
    Ok(lines.join("\n"))
}

pub fn render_shop_resolve(data: &Value) -> io::Result<String> {
    let trade_name = or_dash(str_field(data, "trade_name"));
    Ok(match str_field(data, "shop_id") {
        Some(shop_id) => format!("`{trade_name}` resolves to {shop_id}."),
        None => format!("`{trade_name}` does not match any known shop."),
    })
}

pub fn render_shop_delete(data: &Value) -> io::Result<String> {
    Ok(format!(
        "Deleted shop {} and its pattern rules.",
        or_dash(str_field(data, "shop_id"))
    ))
}

pub fn render_pattern_list(data: &Value) -> io::Result<String> {
    let patterns = rows_of(data, "patterns");
    if patterns.is_empty() {
        return Ok("No pattern rules. Add one with `kvitok pattern add`.".to_string());
    }

    let columns = [
        Column {
            name: "Priority",
            align: Align::Right,
        },
        Column {
            name: "Type",
            align: Align::Left,
        },
        Column {
            name: "Pattern",
            align: Align::Left,
        },
        Column {
            name: "Shop",
            align: Align::Left,
        },
        Column {
            name: "Id",
            align: Align::Left,
        },
    ];
    let rows = patterns
        .iter()
        .map(|pattern| {
            vec![
                int_field(pattern, "priority").to_string(),
                or_dash(str_field(pattern, "pattern_type")),
                pattern_label(pattern),
                or_dash(str_field(pattern, "shop_id")),
                or_dash(str_field(pattern, "pattern_id")),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![format!("{} rule(s), evaluated top to bottom:", patterns.len())];
    lines.extend(render_table_or_blocks(&columns, &rows, terminal_width(), "Rule"));
    Ok(lines.join("\n"))
}

pub fn render_pattern_add(data: &Value) -> io::Result<String> {
    let mut lines = vec![format!(
        "Added rule {} for shop {}: {}",
        or_dash(str_field(data, "pattern_id")),
        or_dash(str_field(data, "shop_id")),
        pattern_label(data)
    )];
    if data.get("regex_valid").and_then(Value::as_bool) == Some(false) {
        lines.push(
            "  Warning: the regex does not compile, so this rule will never match.".to_string(),
        );
    }
    Ok(lines.join("\n"))
}

pub fn render_pattern_remove(data: &Value) -> io::Result<String> {
    Ok(format!(
        "Removed rule {}.",
        or_dash(str_field(data, "pattern_id"))
    ))
}

fn pattern_label(pattern: &Value) -> String {
    let value = or_dash(str_field(pattern, "pattern_value"));
    let is_regex = pattern.get("is_regex").and_then(Value::as_bool) == Some(true);
    let valid = pattern.get("regex_valid").and_then(Value::as_bool) != Some(false);
    match (is_regex, valid) {
        (false, _) => format!("\"{value}\""),
        (true, true) => format!("/{value}/"),
        (true, false) => format!("/{value}/ (invalid)"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{render_pattern_add, render_shop_resolve, render_user};

    #[test]
    fn unlinked_bot_identity_renders_a_notice() {
        let rendered = render_user("user find-bot", &Value::Null);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert_eq!(text, "No user is linked to that bot identity.");
        }
    }

    #[test]
    fn invalid_regex_rules_are_flagged() {
        let rendered = render_pattern_add(&json!({
            "pattern_id": "pat_1",
            "shop_id": "shop_1",
            "pattern_value": "([",
            "is_regex": true,
            "regex_valid": false
        }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("/([/ (invalid)"));
            assert!(text.contains("will never match"));
        }
    }

    #[test]
    fn unresolved_trade_name_is_reported() {
        let rendered = render_shop_resolve(&json!({
            "trade_name": "Ашан",
            "address": null,
            "shop_id": null
        }));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert_eq!(text, "`Ашан` does not match any known shop.");
        }
    }
}
