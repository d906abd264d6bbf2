use std::cmp;

use serde_json::Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub name: &'a str,
    pub align: Align,
}

const INDENT: &str = "  ";
const COLUMN_GAP: &str = "  ";
const MIN_COLUMN_WIDTH: usize = 6;

pub fn terminal_width() -> usize {
    let from_env = std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(120);
    cmp::max(from_env, 40)
}

/// Width in characters. Byte length overcounts Cyrillic text.
fn width_of(value: &str) -> usize {
    value.chars().count()
}

/// Kopecks to `1 234.56`. Sign is kept for refunds.
pub fn format_money(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let absolute = minor_units.unsigned_abs();
    let whole = (absolute / 100).to_string();
    let fraction = absolute % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }
    format!("{sign}{grouped}.{fraction:02}")
}

pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        return format!("{quantity:.0}");
    }
    let text = format!("{quantity:.3}");
    text.trim_end_matches('0').to_string()
}

pub fn or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => "-".to_string(),
    }
}

pub fn str_field<'a>(row: &'a Value, key: &str) -> Option<&'a str> {
    row.get(key).and_then(Value::as_str)
}

pub fn int_field(row: &Value, key: &str) -> i64 {
    row.get(key).and_then(Value::as_i64).unwrap_or(0)
}

pub fn rows_of<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn key_value_rows(entries: &[(&str, String)]) -> Vec<String> {
    let label_width = entries
        .iter()
        .map(|(label, _)| width_of(label))
        .max()
        .unwrap_or(0);

    entries
        .iter()
        .map(|(label, value)| format!("{INDENT}{label:<label_width$}  {value}"))
        .collect()
}

/// Renders an aligned table, or one block per row when the columns cannot
/// fit in `max_width` even at their minimum width.
pub fn render_table_or_blocks(
    columns: &[Column<'_>],
    rows: &[Vec<String>],
    max_width: usize,
    block_label: &str,
) -> Vec<String> {
    if columns.is_empty() {
        return Vec::new();
    }

    let mut widths = columns
        .iter()
        .map(|column| width_of(column.name))
        .collect::<Vec<usize>>();
    for row in rows {
        for (slot, cell) in widths.iter_mut().zip(row) {
            *slot = cmp::max(*slot, width_of(cell));
        }
    }

    let overhead = INDENT.len() + COLUMN_GAP.len() * columns.len().saturating_sub(1);
    let budget = max_width.saturating_sub(overhead);
    if !shrink_to_budget(&mut widths, columns, budget) {
        return render_blocks(columns, rows, block_label);
    }

    let header = columns
        .iter()
        .map(|column| column.name.to_string())
        .collect::<Vec<String>>();
    let mut output = vec![format_row(columns, &header, &widths)];
    for row in rows {
        let clipped = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| clip(cell, *width))
            .collect::<Vec<String>>();
        output.push(format_row(columns, &clipped, &widths));
    }
    output
}

/// Narrows the widest columns first. Header names are never cut.
fn shrink_to_budget(widths: &mut [usize], columns: &[Column<'_>], budget: usize) -> bool {
    let floors = columns
        .iter()
        .map(|column| cmp::max(width_of(column.name), MIN_COLUMN_WIDTH))
        .collect::<Vec<usize>>();

    let mut total = widths.iter().sum::<usize>();
    while total > budget {
        let widest = widths
            .iter()
            .enumerate()
            .filter(|(index, width)| **width > floors[*index])
            .max_by_key(|(_, width)| **width)
            .map(|(index, _)| index);
        let Some(index) = widest else {
            return false;
        };
        widths[index] -= 1;
        total -= 1;
    }
    true
}

fn clip(value: &str, width: usize) -> String {
    if width_of(value) <= width {
        return value.to_string();
    }
    let mut clipped = value
        .chars()
        .take(width.saturating_sub(1))
        .collect::<String>();
    clipped.push('…');
    clipped
}

fn format_row(columns: &[Column<'_>], cells: &[String], widths: &[usize]) -> String {
    let pieces = columns
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(index, (column, width))| {
            let value = cells.get(index).map(String::as_str).unwrap_or("");
            match column.align {
                Align::Left => format!("{value:<width$}"),
                Align::Right => format!("{value:>width$}"),
            }
        })
        .collect::<Vec<String>>();
    format!("{INDENT}{}", pieces.join(COLUMN_GAP).trim_end())
}

fn render_blocks(columns: &[Column<'_>], rows: &[Vec<String>], block_label: &str) -> Vec<String> {
    let label_width = columns
        .iter()
        .map(|column| width_of(column.name) + 1)
        .max()
        .unwrap_or(0);

    let mut output = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        if row_index > 0 {
            output.push(String::new());
        }
        output.push(format!("{INDENT}{block_label} {}:", row_index + 1));
        for (column_index, column) in columns.iter().enumerate() {
            let label = format!("{}:", column.name);
            let value = row.get(column_index).map(String::as_str).unwrap_or("");
            output.push(format!("{INDENT}{INDENT}{label:<label_width$}  {value}"));
        }
    }
    output
}
