use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};

use crate::ingest::measure::{ExplicitUnit, infer_measure};
use crate::ingest::{FiscalTriple, ItemIssue, ParsedItem, ParsedReceipt};
use crate::{ClientError, ClientResult};

const WRAPPED_BODY_PATH: &str = "ticket.document.receipt";
const NAIVE_DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// The two document layouts produced by the e-receipt service.
enum DocumentShape<'a> {
    /// `{_id, ticket: {document: {receipt: {...}}}}`
    Wrapped {
        external_id: String,
        body: &'a Map<String, Value>,
    },
    /// Receipt fields at the top level, `_id` optional.
    Flat {
        external_id: Option<String>,
        body: &'a Map<String, Value>,
    },
}

/// Decodes raw bytes into one canonical receipt per document.
///
/// A top-level array yields one receipt per element, in order. Every element
/// is normalized before anything is returned, so a schema problem anywhere
/// rejects the whole payload.
pub fn normalize_bytes(bytes: &[u8]) -> ClientResult<Vec<ParsedReceipt>> {
    let value = serde_json::from_slice::<Value>(bytes)
        .map_err(|error| ClientError::receipt_parse(&error.to_string()))?;

    match &value {
        Value::Array(elements) => {
            if elements.is_empty() {
                return Err(ClientError::receipt_schema(
                    "[0]",
                    "the document array is empty",
                ));
            }
            elements
                .iter()
                .enumerate()
                .map(|(index, element)| normalize_document(element, &format!("[{index}]")))
                .collect()
        }
        _ => Ok(vec![normalize_document(&value, "")?]),
    }
}

/// Normalizes one receipt document. `prefix` is prepended to error paths.
pub fn normalize_document(document: &Value, prefix: &str) -> ClientResult<ParsedReceipt> {
    match classify(document, prefix)? {
        DocumentShape::Wrapped { external_id, body } => {
            normalize_body(body, &join_path(prefix, WRAPPED_BODY_PATH), Some(external_id), prefix)
        }
        DocumentShape::Flat { external_id, body } => {
            normalize_body(body, prefix, external_id, prefix)
        }
    }
}

fn classify<'a>(document: &'a Value, prefix: &str) -> ClientResult<DocumentShape<'a>> {
    let Some(root) = document.as_object() else {
        let path = if prefix.is_empty() { "document" } else { prefix };
        return Err(ClientError::receipt_schema(
            path,
            "expected a receipt object",
        ));
    };

    let external_id = read_string(root, "_id");

    if !root.contains_key("ticket") {
        return Ok(DocumentShape::Flat {
            external_id,
            body: root,
        });
    }

    let Some(external_id) = external_id else {
        return Err(ClientError::receipt_schema(
            &join_path(prefix, "_id"),
            "field is missing",
        ));
    };

    let body = root
        .get("ticket")
        .and_then(|ticket| ticket.get("document"))
        .and_then(|document| document.get("receipt"))
        .and_then(Value::as_object);
    let Some(body) = body else {
        return Err(ClientError::receipt_schema(
            &join_path(prefix, WRAPPED_BODY_PATH),
            "field is missing",
        ));
    };

    Ok(DocumentShape::Wrapped { external_id, body })
}

fn normalize_body(
    body: &Map<String, Value>,
    base: &str,
    external_id: Option<String>,
    prefix: &str,
) -> ClientResult<ParsedReceipt> {
    let total_sum = required_money(body, base, "totalSum")?;

    let Some(raw_items) = body.get("items") else {
        return Err(ClientError::receipt_schema(
            &join_path(base, "items"),
            "field is missing",
        ));
    };
    let Some(raw_items) = raw_items.as_array() else {
        return Err(ClientError::receipt_schema(
            &join_path(base, "items"),
            "expected an array of line items",
        ));
    };

    let Some(raw_date_time) = body.get("dateTime") else {
        return Err(ClientError::receipt_schema(
            &join_path(base, "dateTime"),
            "field is missing",
        ));
    };
    let Some(date_time) = parse_date_time(raw_date_time) else {
        return Err(ClientError::receipt_schema(
            &join_path(base, "dateTime"),
            "expected an ISO-8601 timestamp or Unix seconds",
        ));
    };

    let fiscal = FiscalTriple {
        drive_number: read_string(body, "fiscalDriveNumber"),
        document_number: read_integer(body.get("fiscalDocumentNumber")),
        sign: read_string(body, "fiscalSign"),
    };

    let external_id = match external_id {
        Some(value) => value,
        None => match fiscal.synthetic_external_id() {
            Some(value) => value,
            None => {
                return Err(ClientError::receipt_schema(
                    &join_path(prefix, "_id"),
                    "field is missing and the fiscal triple is incomplete",
                ));
            }
        },
    };

    let items_path = join_path(base, "items");
    let mut items = Vec::new();
    let mut item_issues = Vec::new();
    for (index, raw_item) in raw_items.iter().enumerate() {
        match normalize_item(raw_item, index, &items_path) {
            Ok(item) => items.push(item),
            Err(issue) => item_issues.push(issue),
        }
    }

    Ok(ParsedReceipt {
        external_id,
        date_time,
        total_sum,
        cash_total_sum: optional_money(body, "cashTotalSum"),
        ecash_total_sum: optional_money(body, "ecashTotalSum"),
        credit_sum: optional_money(body, "creditSum"),
        prepaid_sum: optional_money(body, "prepaidSum"),
        provision_sum: optional_money(body, "provisionSum"),
        fiscal,
        shift_number: read_integer(body.get("shiftNumber")),
        operation_type: read_integer(body.get("operationType")),
        kkt_reg_id: read_string(body, "kktRegId"),
        nds10: read_integer(body.get("nds10")),
        nds18: read_integer(body.get("nds18")),
        legal_name: read_string(body, "user"),
        inn: read_string(body, "userInn"),
        retail_name: read_string(body, "retailPlace"),
        address: read_string(body, "retailPlaceAddress"),
        operator_name: read_string(body, "operator"),
        operator_inn: read_string(body, "operatorInn"),
        items_in_source: raw_items.len(),
        items,
        item_issues,
    })
}

fn normalize_item(raw: &Value, index: usize, items_path: &str) -> Result<ParsedItem, ItemIssue> {
    let path = format!("{items_path}[{index}]");
    let issue = |field: &str, message: &str| ItemIssue {
        index,
        path: join_path(&path, field),
        message: message.to_string(),
    };

    let Some(object) = raw.as_object() else {
        return Err(ItemIssue {
            index,
            path: path.clone(),
            message: "expected a line item object".to_string(),
        });
    };

    let Some(name) = read_string(object, "name") else {
        return Err(issue("name", "field is missing"));
    };
    let Some(price) = object.get("price").and_then(|value| read_integer(Some(value))) else {
        return Err(issue("price", "expected an integer amount in minor units"));
    };
    let Some(sum) = object.get("sum").and_then(|value| read_integer(Some(value))) else {
        return Err(issue("sum", "expected an integer amount in minor units"));
    };
    let Some(quantity) = object.get("quantity").and_then(read_number) else {
        return Err(issue("quantity", "expected a number"));
    };
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(issue("quantity", "expected a non-negative number"));
    }

    let explicit = ExplicitUnit {
        label: read_string(object, "measure"),
        ffd_code: read_integer(object.get("itemsQuantityMeasure")),
    };
    let measure = infer_measure(&name, quantity, &explicit);

    let product_code = object.get("productCodeData").and_then(Value::as_object);

    Ok(ParsedItem {
        position: index as i64,
        measure,
        name,
        price,
        quantity,
        sum,
        product_type: read_integer(object.get("productType")),
        gtin: product_code.and_then(|code| read_string(code, "gtin")),
        raw_product_code: product_code.and_then(|code| read_string(code, "rawProductCode")),
    })
}

fn required_money(body: &Map<String, Value>, base: &str, key: &str) -> ClientResult<i64> {
    let Some(value) = body.get(key) else {
        return Err(ClientError::receipt_schema(
            &join_path(base, key),
            "field is missing",
        ));
    };
    read_integer(Some(value)).ok_or_else(|| {
        ClientError::receipt_schema(
            &join_path(base, key),
            "expected an integer amount in minor units",
        )
    })
}

fn optional_money(body: &Map<String, Value>, key: &str) -> i64 {
    read_integer(body.get(key)).unwrap_or(0)
}

/// Keeps the wall-clock time printed on the receipt. An RFC 3339 offset is
/// dropped, not applied; Unix timestamps are read as UTC.
fn parse_date_time(value: &Value) -> Option<NaiveDateTime> {
    if let Some(seconds) = value.as_i64() {
        return DateTime::from_timestamp(seconds, 0).map(|moment| moment.naive_utc());
    }

    let text = value.as_str()?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_local());
    }

    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

fn read_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    let value = object.get(key)?;

    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };

    if text.is_empty() { None } else { Some(text) }
}

/// Reads an integer, accepting whole floats and numeric strings.
fn read_integer(value: Option<&Value>) -> Option<i64> {
    let current = value?;

    if let Some(integer) = current.as_i64() {
        return Some(integer);
    }

    if let Some(float) = current.as_f64() {
        if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
            return Some(float as i64);
        }
        return None;
    }

    current.as_str()?.trim().parse::<i64>().ok()
}

fn read_number(value: &Value) -> Option<f64> {
    if let Some(number) = value.as_f64() {
        return Some(number);
    }
    value.as_str()?.trim().replace(',', ".").parse::<f64>().ok()
}

fn join_path(base: &str, key: &str) -> String {
    if base.is_empty() {
        return key.to_string();
    }
    if key.starts_with('[') {
        return format!("{base}{key}");
    }
    format!("{base}.{key}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{normalize_bytes, normalize_document};
    use crate::ingest::measure::Measure;

    fn wrapped_document() -> serde_json::Value {
        json!({
            "_id": "65f0c1e2a1b2c3d4e5f60718",
            "ticket": {
                "document": {
                    "receipt": {
                        "user": "ООО \"АГРОТОРГ\"",
                        "userInn": "7825706086  ",
                        "retailPlace": "Пятёрочка",
                        "retailPlaceAddress": "г. Москва, ул. Ленина, 1",
                        "operator": "Иванова А.",
                        "operatorInn": "500100732259",
                        "dateTime": "2026-03-15T12:34:00",
                        "totalSum": 15000,
                        "cashTotalSum": 0,
                        "ecashTotalSum": 15000,
                        "fiscalDriveNumber": "7281440500123456",
                        "fiscalDocumentNumber": 4821,
                        "fiscalSign": 3179034512u64,
                        "shiftNumber": 212,
                        "items": [
                            {"name": "Хлеб", "price": 5000, "quantity": 3, "sum": 15000}
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn wrapped_document_normalizes_header_and_items() {
        let parsed = normalize_document(&wrapped_document(), "");
        assert!(parsed.is_ok());
        if let Ok(receipt) = parsed {
            assert_eq!(receipt.external_id, "65f0c1e2a1b2c3d4e5f60718");
            assert_eq!(receipt.total_sum, 15000);
            assert_eq!(receipt.ecash_total_sum, 15000);
            assert_eq!(receipt.inn.as_deref(), Some("7825706086"));
            assert_eq!(receipt.retail_name.as_deref(), Some("Пятёрочка"));
            assert_eq!(receipt.fiscal.drive_number.as_deref(), Some("7281440500123456"));
            assert_eq!(receipt.fiscal.document_number, Some(4821));
            assert_eq!(receipt.fiscal.sign.as_deref(), Some("3179034512"));
            assert_eq!(receipt.shift_number, Some(212));
            assert_eq!(
                receipt.date_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                "2026-03-15 12:34:00"
            );
            assert_eq!(receipt.items.len(), 1);
            assert_eq!(receipt.items_in_source, 1);
            assert_eq!(receipt.items[0].measure, Measure::Piece);
            assert_eq!(receipt.items[0].quantity, 3.0);
        }
    }

    #[test]
    fn flat_document_uses_fiscal_triple_when_id_is_absent() {
        let document = json!({
            "dateTime": "2026-07-01T09:00:00+03:00",
            "totalSum": 12050,
            "fiscalDriveNumber": "9960440300000001",
            "fiscalDocumentNumber": 77,
            "fiscalSign": "1234567890",
            "items": [
                {"name": "Яблоки", "price": 15990, "quantity": 0.753, "sum": 12040}
            ]
        });
        let parsed = normalize_document(&document, "");
        assert!(parsed.is_ok());
        if let Ok(receipt) = parsed {
            assert_eq!(receipt.external_id, "fiscal:9960440300000001:77:1234567890");
            assert_eq!(
                receipt.date_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                "2026-07-01 09:00:00"
            );
            assert_eq!(receipt.items[0].measure, Measure::Kilogram);
        }
    }

    #[test]
    fn missing_id_on_wrapped_document_names_the_path() {
        let mut document = wrapped_document();
        if let Some(root) = document.as_object_mut() {
            root.remove("_id");
        }
        let result = normalize_document(&document, "");
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "receipt_schema_error");
            assert_eq!(error.data.as_ref().map(|data| data["path"].clone()), Some(json!("_id")));
        }
    }

    #[test]
    fn missing_total_sum_names_the_nested_path() {
        let mut document = wrapped_document();
        if let Some(body) = document
            .pointer_mut("/ticket/document/receipt")
            .and_then(|value| value.as_object_mut())
        {
            body.remove("totalSum");
        }
        let result = normalize_document(&document, "");
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(
                error.data.as_ref().map(|data| data["path"].clone()),
                Some(json!("ticket.document.receipt.totalSum"))
            );
        }
    }

    #[test]
    fn missing_receipt_body_is_reported() {
        let document = json!({"_id": "abc", "ticket": {"document": {}}});
        let result = normalize_document(&document, "");
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(
                error.data.as_ref().map(|data| data["path"].clone()),
                Some(json!("ticket.document.receipt"))
            );
        }
    }

    #[test]
    fn non_json_input_is_a_parse_error() {
        let result = normalize_bytes(b"{not json");
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "receipt_parse_error");
        }
    }

    #[test]
    fn arrays_normalize_every_element_with_indexed_error_paths() {
        let first = wrapped_document();
        let mut second = wrapped_document();
        if let Some(root) = second.as_object_mut() {
            root.insert("_id".to_string(), json!("second"));
        }
        let payload = serde_json::to_vec(&json!([first, second]));
        assert!(payload.is_ok());
        if let Ok(bytes) = payload {
            let parsed = normalize_bytes(&bytes);
            assert!(parsed.is_ok());
            if let Ok(receipts) = parsed {
                assert_eq!(receipts.len(), 2);
                assert_eq!(receipts[1].external_id, "second");
            }
        }

        let broken = serde_json::to_vec(&json!([wrapped_document(), {"_id": "x", "ticket": {}}]));
        assert!(broken.is_ok());
        if let Ok(bytes) = broken {
            let result = normalize_bytes(&bytes);
            assert!(result.is_err());
            if let Err(error) = result {
                assert_eq!(
                    error.data.as_ref().map(|data| data["path"].clone()),
                    Some(json!("[1].ticket.document.receipt"))
                );
            }
        }
    }

    #[test]
    fn empty_array_is_a_schema_error() {
        let result = normalize_bytes(b"[]");
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "receipt_schema_error");
        }
    }

    #[test]
    fn malformed_items_are_counted_not_fatal() {
        let mut document = wrapped_document();
        if let Some(items) = document
            .pointer_mut("/ticket/document/receipt/items")
            .and_then(|value| value.as_array_mut())
        {
            items.push(json!({"name": "Сломанная позиция", "price": 10.5, "quantity": 1, "sum": 10}));
            items.push(json!("not an item"));
        }
        let parsed = normalize_document(&document, "");
        assert!(parsed.is_ok());
        if let Ok(receipt) = parsed {
            assert_eq!(receipt.items.len(), 1);
            assert_eq!(receipt.items_in_source, 3);
            assert_eq!(receipt.item_issues.len(), 2);
            assert_eq!(
                receipt.item_issues[0].path,
                "ticket.document.receipt.items[1].price"
            );
        }
    }

    #[test]
    fn money_stays_exact_integers() {
        let document = json!({
            "_id": "exact",
            "dateTime": 1773577200,
            "totalSum": 10000,
            "items": [{"name": "Сыр", "price": 5000, "quantity": 2, "sum": 10000}]
        });
        let parsed = normalize_document(&document, "");
        assert!(parsed.is_ok());
        if let Ok(receipt) = parsed {
            let item = &receipt.items[0];
            assert_eq!(item.price, 5000);
            assert_eq!(item.sum, 10000);
            assert_eq!(item.price * item.quantity as i64, item.sum);
        }
    }
}
