use std::io;

use serde_json::Value;

use super::format::{
    Align, Column, int_field, or_dash, render_table_or_blocks, rows_of, str_field, terminal_width,
};

pub fn render_ingest(data: &Value) -> io::Result<String> {
    let reports = rows_of(data, "receipts");
    let created = reports
        .iter()
        .filter(|report| str_field(report, "outcome") == Some("created"))
        .count();
    let duplicates = reports
        .iter()
        .filter(|report| {
            matches!(
                str_field(report, "outcome"),
                Some("duplicate_external_id" | "duplicate_fiscal_triple")
            )
        })
        .count();
    let attached = reports.len() - created - duplicates;

    let mut lines = vec![format!(
        "Processed {} receipt(s) from {}.",
        reports.len(),
        source_label(data)
    )];
    lines.push(format!(
        "  {created} new, {duplicates} already stored, {attached} filled in with items."
    ));

    if !reports.is_empty() {
        lines.push(String::new());
        let columns = [
            Column {
                name: "External id",
                align: Align::Left,
            },
            Column {
                name: "Outcome",
                align: Align::Left,
            },
            Column {
                name: "Items",
                align: Align::Right,
            },
            Column {
                name: "Receipt",
                align: Align::Left,
            },
        ];
        let rows = reports
            .iter()
            .map(|report| {
                vec![
                    or_dash(str_field(report, "external_id")),
                    outcome_label(str_field(report, "outcome")).to_string(),
                    format!(
                        "{}/{}",
                        int_field(report, "items_processed"),
                        int_field(report, "items_in_source")
                    ),
                    or_dash(str_field(report, "receipt_id")),
                ]
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(render_table_or_blocks(
            &columns,
            &rows,
            terminal_width(),
            "Receipt",
        ));
    }

    let issues = reports
        .iter()
        .flat_map(|report| rows_of(report, "item_issues"))
        .collect::<Vec<&Value>>();
    if !issues.is_empty() {
        lines.push(String::new());
        lines.push("Skipped items:".to_string());
        for issue in issues {
            lines.push(format!(
                "  {}: {}",
                or_dash(str_field(issue, "path")),
                or_dash(str_field(issue, "message"))
            ));
        }
    }

    Ok(lines.join("\n"))
}

fn source_label(data: &Value) -> String {
    match (str_field(data, "source_used"), str_field(data, "source_ref")) {
        (Some("file"), Some(path)) => path.to_string(),
        _ => "stdin".to_string(),
    }
}

fn outcome_label(outcome: Option<&str>) -> &'static str {
    match outcome {
        Some("created") => "new",
        Some("duplicate_external_id") => "duplicate (id)",
        Some("duplicate_fiscal_triple") => "duplicate (fiscal)",
        Some("items_attached") => "items attached",
        _ => "unknown",
    }
}
