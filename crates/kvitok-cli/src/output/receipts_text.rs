use std::io;

use serde_json::Value;

use super::format::{
    Align, Column, format_money, format_quantity, int_field, key_value_rows, or_dash,
    render_table_or_blocks, rows_of, str_field, terminal_width,
};

pub fn render_receipt_list(data: &Value) -> io::Result<String> {
    let receipts = rows_of(data, "receipts");
    if receipts.is_empty() {
        return Ok("No receipts in this range.".to_string());
    }

    let columns = [
        Column {
            name: "Date",
            align: Align::Left,
        },
        Column {
            name: "Shop",
            align: Align::Left,
        },
        Column {
            name: "Items",
            align: Align::Right,
        },
        Column {
            name: "Total",
            align: Align::Right,
        },
        Column {
            name: "Receipt",
            align: Align::Left,
        },
    ];
    let rows = receipts
        .iter()
        .map(|receipt| {
            vec![
                or_dash(str_field(receipt, "date_time")),
                or_dash(str_field(receipt, "shop_name")),
                int_field(receipt, "items_count").to_string(),
                format_money(int_field(receipt, "total_sum")),
                or_dash(str_field(receipt, "receipt_id")),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let skip = int_field(data, "skip");
    let mut lines = vec![format!(
        "Receipts {}-{}, newest first:",
        skip + 1,
        skip + i64::try_from(receipts.len()).unwrap_or(0)
    )];
    lines.extend(render_table_or_blocks(&columns, &rows, terminal_width(), "Receipt"));
    Ok(lines.join("\n"))
}

pub fn render_receipt_detail(data: &Value) -> io::Result<String> {
    let empty = Value::Null;
    let shop = data.get("shop").unwrap_or(&empty);
    let cashier = data.get("cashier").unwrap_or(&empty);
    let shop_name = str_field(shop, "retail_name").or_else(|| str_field(shop, "legal_name"));

    let mut lines = vec![format!("Receipt {}", or_dash(str_field(data, "receipt_id")))];
    lines.extend(key_value_rows(&[
        ("Date:", or_dash(str_field(data, "date_time"))),
        ("Shop:", or_dash(shop_name)),
        ("Address:", or_dash(str_field(shop, "address"))),
        ("Cashier:", or_dash(str_field(cashier, "name"))),
        ("Total:", format_money(int_field(data, "total_sum"))),
        ("Cash:", format_money(int_field(data, "cash_total_sum"))),
        ("Card:", format_money(int_field(data, "ecash_total_sum"))),
        ("Fiscal drive:", or_dash(str_field(data, "fiscal_drive_number"))),
        (
            "Fiscal document:",
            data.get("fiscal_document_number")
                .and_then(Value::as_i64)
                .map_or_else(|| "-".to_string(), |number| number.to_string()),
        ),
        ("External id:", or_dash(str_field(data, "external_id"))),
    ]));

    let items = rows_of(data, "items");
    lines.push(String::new());
    if items.is_empty() {
        lines.push("  No line items stored for this receipt.".to_string());
        return Ok(lines.join("\n"));
    }

    let columns = [
        Column {
            name: "#",
            align: Align::Right,
        },
        Column {
            name: "Item",
            align: Align::Left,
        },
        Column {
            name: "Qty",
            align: Align::Right,
        },
        Column {
            name: "Price",
            align: Align::Right,
        },
        Column {
            name: "Sum",
            align: Align::Right,
        },
    ];
    let rows = items
        .iter()
        .map(|item| {
            let quantity = item.get("quantity").and_then(Value::as_f64).unwrap_or(0.0);
            vec![
                (int_field(item, "position") + 1).to_string(),
                or_dash(str_field(item, "name")),
                format!(
                    "{} {}",
                    format_quantity(quantity),
                    or_dash(str_field(item, "measure"))
                ),
                format_money(int_field(item, "price")),
                format_money(int_field(item, "sum")),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    lines.extend(render_table_or_blocks(&columns, &rows, terminal_width(), "Item"));
    Ok(lines.join("\n"))
}

pub fn render_receipt_delete(data: &Value) -> io::Result<String> {
    Ok(format!(
        "Deleted receipt {} with {} item(s).",
        or_dash(str_field(data, "receipt_id")),
        int_field(data, "items_deleted")
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_receipt_detail, render_receipt_list};

    #[test]
    fn detail_lists_items_with_units_and_money() {
        let data = json!({
            "receipt_id": "rcpt_1",
            "external_id": "a",
            "date_time": "2026-03-01 10:00:00",
            "total_sum": 14980,
            "cash_total_sum": 0,
            "ecash_total_sum": 14980,
            "fiscal_drive_number": "7281440500123456",
            "fiscal_document_number": 1042,
            "shop": {"retail_name": "Пятёрочка", "legal_name": "ООО", "address": "ул. Ленина, 1"},
            "cashier": null,
            "items": [
                {"position": 0, "name": "Яблоки", "quantity": 0.753, "measure": "кг", "price": 12990, "sum": 9781}
            ]
        });

        let rendered = render_receipt_detail(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("Пятёрочка"));
            assert!(text.contains("149.80"));
            assert!(text.contains("0.753 кг"));
            assert!(text.contains("97.81"));
            assert!(text.contains("1042"));
        }
    }

    #[test]
    fn empty_list_renders_a_notice() {
        let rendered = render_receipt_list(&json!({"skip": 0, "limit": 100, "receipts": []}));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert_eq!(text, "No receipts in this range.");
        }
    }
}
