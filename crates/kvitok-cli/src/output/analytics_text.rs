use std::io;

use serde_json::Value;

use super::format::{
    Align, Column, format_money, format_quantity, int_field, key_value_rows, or_dash,
    render_table_or_blocks, rows_of, str_field, terminal_width,
};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn render_total(data: &Value) -> io::Result<String> {
    let mut lines = vec!["Lifetime spending:".to_string()];
    lines.extend(key_value_rows(&[
        ("Receipts:", int_field(data, "receipts_count").to_string()),
        ("Total:", format_money(int_field(data, "total_sum"))),
        ("Cash:", format_money(int_field(data, "cash_total_sum"))),
        ("Card:", format_money(int_field(data, "ecash_total_sum"))),
        ("Credit:", format_money(int_field(data, "credit_sum"))),
        ("Prepaid:", format_money(int_field(data, "prepaid_sum"))),
    ]));
    Ok(lines.join("\n"))
}

pub fn render_monthly(data: &Value) -> io::Result<String> {
    let year = int_field(data, "year");
    let months = rows_of(data, "months");
    if months.is_empty() {
        return Ok(format!("No receipts in {year}."));
    }

    let columns = [
        Column {
            name: "Month",
            align: Align::Left,
        },
        Column {
            name: "Receipts",
            align: Align::Right,
        },
        Column {
            name: "Total",
            align: Align::Right,
        },
        Column {
            name: "Cash",
            align: Align::Right,
        },
        Column {
            name: "Card",
            align: Align::Right,
        },
    ];
    let rows = months
        .iter()
        .map(|month| {
            vec![
                month_name(int_field(month, "month")),
                int_field(month, "receipts_count").to_string(),
                format_money(int_field(month, "total_sum")),
                format_money(int_field(month, "cash_total_sum")),
                format_money(int_field(month, "ecash_total_sum")),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![format!("Spending by month, {year}:")];
    lines.extend(render_table_or_blocks(&columns, &rows, terminal_width(), "Month"));
    Ok(lines.join("\n"))
}

pub fn render_top_products(data: &Value) -> io::Result<String> {
    let products = rows_of(data, "products");
    let window = match data.get("months_back").and_then(Value::as_i64) {
        Some(months) => format!("last {months} month(s)"),
        None => "all time".to_string(),
    };
    if products.is_empty() {
        return Ok(format!("No purchases for {window}."));
    }

    let columns = [
        Column {
            name: "#",
            align: Align::Right,
        },
        Column {
            name: "Product",
            align: Align::Left,
        },
        Column {
            name: "Qty",
            align: Align::Right,
        },
        Column {
            name: "Spent",
            align: Align::Right,
        },
    ];
    let rows = products
        .iter()
        .enumerate()
        .map(|(index, product)| {
            let quantity = product
                .get("total_quantity")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            vec![
                (index + 1).to_string(),
                or_dash(str_field(product, "name")),
                format!(
                    "{} {}",
                    format_quantity(quantity),
                    or_dash(str_field(product, "measure"))
                ),
                format_money(int_field(product, "total_sum")),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![format!("Top products, {window}:")];
    lines.extend(render_table_or_blocks(&columns, &rows, terminal_width(), "Product"));
    Ok(lines.join("\n"))
}

pub fn render_by_shop(data: &Value) -> io::Result<String> {
    let shops = rows_of(data, "shops");
    if shops.is_empty() {
        return Ok("No shop spending in this range.".to_string());
    }

    let columns = [
        Column {
            name: "Shop",
            align: Align::Left,
        },
        Column {
            name: "Receipts",
            align: Align::Right,
        },
        Column {
            name: "Total",
            align: Align::Right,
        },
        Column {
            name: "Average",
            align: Align::Right,
        },
        Column {
            name: "Id",
            align: Align::Left,
        },
    ];
    let rows = shops
        .iter()
        .map(|shop| {
            let average = shop
                .get("receipt_avg")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            vec![
                or_dash(str_field(shop, "retail_name").or_else(|| str_field(shop, "legal_name"))),
                int_field(shop, "receipts_count").to_string(),
                format_money(int_field(shop, "total_amount")),
                // Averages are fractional kopecks; round for display only.
                format_money(average.round() as i64),
                or_dash(str_field(shop, "shop_id")),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let direction = if data.get("descending").and_then(Value::as_bool) == Some(true) {
        "descending"
    } else {
        "ascending"
    };
    let mut lines = vec![format!(
        "Spending by shop, sorted by {} {direction}:",
        or_dash(str_field(data, "sort_by"))
    )];
    lines.extend(render_table_or_blocks(&columns, &rows, terminal_width(), "Shop"));
    Ok(lines.join("\n"))
}

fn month_name(month: i64) -> String {
    usize::try_from(month - 1)
        .ok()
        .and_then(|index| MONTH_NAMES.get(index))
        .map_or_else(|| month.to_string(), |name| (*name).to_string())
}
