mod analytics_text;
mod catalog_text;
mod error_text;
mod format;
mod ingest_text;
mod json;
mod mode;
mod receipts_text;

use std::io;

use kvitok_client::{ClientError, SuccessEnvelope};

pub use mode::{OutputMode, mode_for_command};

use crate::stdout_io::write_stdout_line;

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Text => render_text_success(success)?,
        OutputMode::Json => json::render_success_json(success)?,
    };
    write_stdout_line(&body)
}

pub fn print_failure(error: &ClientError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

fn render_text_success(success: &SuccessEnvelope) -> io::Result<String> {
    let data = &success.data;
    match success.command.as_str() {
        "ingest" => ingest_text::render_ingest(data),
        "user register" | "user link-bot" | "user find-bot" | "user activate"
        | "user deactivate" => catalog_text::render_user(&success.command, data),
        "shop list" => catalog_text::render_shop_list(data),
        "shop resolve" => catalog_text::render_shop_resolve(data),
        "shop update" => catalog_text::render_shop(data),
        "shop delete" => catalog_text::render_shop_delete(data),
        "pattern add" => catalog_text::render_pattern_add(data),
        "pattern list" => catalog_text::render_pattern_list(data),
        "pattern remove" => catalog_text::render_pattern_remove(data),
        "receipt list" => receipts_text::render_receipt_list(data),
        "receipt show" => receipts_text::render_receipt_detail(data),
        "receipt delete" => receipts_text::render_receipt_delete(data),
        "analytics total" => analytics_text::render_total(data),
        "analytics monthly" => analytics_text::render_monthly(data),
        "analytics top-products" => analytics_text::render_top_products(data),
        "analytics by-shop" => analytics_text::render_by_shop(data),
        _ => Err(io::Error::other(format!(
            "unsupported text output command `{}`",
            success.command
        ))),
    }
}
