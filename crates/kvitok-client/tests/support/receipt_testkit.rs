#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use kvitok_client::commands::ingest::{self, IngestOptions};
use kvitok_client::commands::users;
use kvitok_client::{ClientResult, SuccessEnvelope};
use rusqlite::Connection;
use serde_json::{Value, json};
use tempfile::{Builder, TempDir};

pub const SHOP_INN: &str = "7825706086";

pub fn temp_home(prefix: &str) -> std::io::Result<(TempDir, PathBuf)> {
    let dir = Builder::new().prefix(prefix).tempdir()?;
    let home = dir.path().join("kvitok-home");
    fs::create_dir_all(&home)?;
    Ok((dir, home))
}

pub fn register_user(home: &Path, email: &str) -> String {
    let result =
        users::register_with_home_override(email, "argon2id$fixture", Some("Test User"), Some(home));
    assert!(result.is_ok());
    result
        .ok()
        .and_then(|envelope| envelope.data["user_id"].as_str().map(str::to_string))
        .unwrap_or_default()
}

pub fn item(name: &str, price: i64, quantity: f64, sum: i64) -> Value {
    json!({
        "name": name,
        "price": price,
        "quantity": quantity,
        "sum": sum,
        "productType": 1,
        "productCodeData": {"gtin": "04601234567890", "rawProductCode": "0104601234567890"}
    })
}

/// A wrapped export with one outlet, one cashier and a complete fiscal triple.
pub fn receipt_document(external_id: &str, date_time: &str, total_sum: i64, items: Vec<Value>) -> Value {
    json!({
        "_id": external_id,
        "ticket": {
            "document": {
                "receipt": {
                    "user": "ООО \"АГРОТОРГ\"",
                    "userInn": SHOP_INN,
                    "retailPlace": "Пятёрочка",
                    "retailPlaceAddress": "г. Москва, ул. Ленина, 1",
                    "operator": "Иванова А.",
                    "operatorInn": "500100732259",
                    "dateTime": date_time,
                    "totalSum": total_sum,
                    "cashTotalSum": 0,
                    "ecashTotalSum": total_sum,
                    "fiscalDriveNumber": "7281440500123456",
                    "fiscalDocumentNumber": fiscal_number_for(external_id),
                    "fiscalSign": "3179034512",
                    "shiftNumber": 212,
                    "items": items
                }
            }
        }
    })
}

fn fiscal_number_for(external_id: &str) -> i64 {
    external_id
        .bytes()
        .fold(17_i64, |acc, byte| (acc * 31 + i64::from(byte)) % 1_000_000)
}

pub fn set_receipt_field(document: &mut Value, field: &str, value: Value) {
    if let Some(body) = document
        .pointer_mut("/ticket/document/receipt")
        .and_then(Value::as_object_mut)
    {
        body.insert(field.to_string(), value);
    }
}

pub fn remove_receipt_field(document: &mut Value, field: &str) {
    if let Some(body) = document
        .pointer_mut("/ticket/document/receipt")
        .and_then(Value::as_object_mut)
    {
        body.remove(field);
    }
}

pub fn with_shop(mut document: Value, retail_name: &str, inn: Option<&str>, address: &str) -> Value {
    set_receipt_field(&mut document, "retailPlace", json!(retail_name));
    set_receipt_field(&mut document, "retailPlaceAddress", json!(address));
    match inn {
        Some(value) => set_receipt_field(&mut document, "userInn", json!(value)),
        None => remove_receipt_field(&mut document, "userInn"),
    }
    document
}

pub fn with_fiscal(mut document: Value, drive: &str, number: i64, sign: &str) -> Value {
    set_receipt_field(&mut document, "fiscalDriveNumber", json!(drive));
    set_receipt_field(&mut document, "fiscalDocumentNumber", json!(number));
    set_receipt_field(&mut document, "fiscalSign", json!(sign));
    document
}

pub fn ingest_value(home: &Path, user_id: &str, document: &Value) -> ClientResult<SuccessEnvelope> {
    let bytes = serde_json::to_vec(document).unwrap_or_default();
    ingest::run_with_options(IngestOptions {
        path: Some("-".to_string()),
        user_id: user_id.to_string(),
        home_override: Some(home),
        stdin_override: Some(bytes),
    })
}

/// Ingests a single document and returns its report.
pub fn ingest_ok(home: &Path, user_id: &str, document: &Value) -> Value {
    let result = ingest_value(home, user_id, document);
    assert!(result.is_ok(), "ingest failed: {:?}", result.as_ref().err());
    result
        .ok()
        .map(|envelope| envelope.data["receipts"][0].clone())
        .unwrap_or(Value::Null)
}

pub fn open_db(home: &Path) -> Option<Connection> {
    Connection::open(home.join("kvitok.db")).ok()
}

pub fn count_rows(home: &Path, sql: &str) -> i64 {
    open_db(home)
        .and_then(|conn| conn.query_row(sql, [], |row| row.get::<_, i64>(0)).ok())
        .unwrap_or(-1)
}
