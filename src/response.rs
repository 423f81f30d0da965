//! Classification of raw HTTP responses into append results.

use log::warn;
use serde_json::{Map, Value};

use crate::error::AppendError;
use crate::http::HttpResponse;

/// Parsed success payload returned by the append service.
pub type AppendResult = Map<String, Value>;

/// Log target for raw response diagnostics.
pub const WIRE_TARGET: &str = "email_append::wire";

/// Maps a response onto a success payload or an `AppendError`.
///
/// Only 200 and 201 count as success. Bodies that are not valid JSON are
/// treated as an empty object rather than a failure.
pub fn process_response(response: &HttpResponse, debug: bool) -> Result<AppendResult, AppendError> {
    if debug {
        tracing::info!(target: WIRE_TARGET, "status={} body={}", response.status, response.body);
    } else {
        tracing::trace!(target: WIRE_TARGET, "status={} body={}", response.status, response.body);
    }

    let parsed = match serde_json::from_str::<Value>(&response.body) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                "Response body (status {}) is not valid JSON ({}), using an empty object",
                response.status, e
            );
            Value::Object(Map::new())
        }
    };

    if !matches!(response.status, 200 | 201) {
        let (message, error_code) = match &parsed {
            Value::Object(obj) => (
                obj.get("message").map(value_text),
                obj.get("error_code").cloned(),
            ),
            _ => (None, None),
        };
        return Err(AppendError::Remote {
            status: response.status,
            message,
            error_code,
        });
    }

    match parsed {
        Value::Object(obj) => Ok(obj),
        other => Err(AppendError::Protocol(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Accessors for the fields the vendor documents on a success payload.
pub trait AppendResultExt {
    /// The `num-results` count, if present and numeric.
    fn num_results(&self) -> Option<u64>;
    /// The `results` records, if present.
    fn results(&self) -> Option<&Value>;
}

impl AppendResultExt for AppendResult {
    fn num_results(&self) -> Option<u64> {
        self.get("num-results").and_then(Value::as_u64)
    }

    fn results(&self) -> Option<&Value> {
        self.get("results")
    }
}
