use std::io;

use kvitok_client::contracts::envelope::failure_from_error;
use kvitok_client::{ClientError, SuccessEnvelope};
use serde::Serialize;

/// Every command prints the same `{ok, command, version, data}` envelope.
pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    serialize_json_pretty(success)
}

pub fn render_error_json(error: &ClientError) -> io::Result<String> {
    serialize_json_pretty(&failure_from_error(error))
}

fn serialize_json_pretty<T>(value: &T) -> io::Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use kvitok_client::{ClientError, SuccessEnvelope};
    use serde_json::{Value, json};

    use super::{render_error_json, render_success_json};

    #[test]
    fn success_json_keeps_the_envelope() {
        let payload = SuccessEnvelope {
            ok: true,
            command: "analytics total".to_string(),
            version: "0.1.0".to_string(),
            data: json!({"total_sum": 0}),
        };

        let rendered = render_success_json(&payload);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let parsed: Result<Value, _> = serde_json::from_str(&text);
            assert!(parsed.is_ok());
            if let Ok(value) = parsed {
                assert_eq!(value["ok"], Value::Bool(true));
                assert_eq!(value["command"], "analytics total");
                assert_eq!(value["data"]["total_sum"], 0);
            }
        }
    }

    #[test]
    fn schema_error_json_carries_kind_and_path() {
        let error = ClientError::receipt_schema("[1].ticket.document.receipt.totalSum", "missing");
        let rendered = render_error_json(&error);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let parsed: Result<Value, _> = serde_json::from_str(&text);
            assert!(parsed.is_ok());
            if let Ok(value) = parsed {
                assert_eq!(value["ok"], Value::Bool(false));
                assert_eq!(value["error"]["code"], "receipt_schema_error");
                assert_eq!(value["error"]["kind"], "caller");
                assert_eq!(value["data"]["path"], "[1].ticket.document.receipt.totalSum");
            }
        }
    }
}
