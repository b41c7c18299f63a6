use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::core::models::RawItem;
use crate::errors::BriefingError;

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

/// HTTP method of an API Gateway proxy event (HTTP API v2 or REST v1).
pub fn http_method(payload: &Value) -> Option<&str> {
    v_str(payload, &["requestContext", "http", "method"])
        .or_else(|| v_str(payload, &["httpMethod"]))
}

pub fn is_preflight(payload: &Value) -> bool {
    http_method(payload).is_some_and(|m| m.eq_ignore_ascii_case("OPTIONS"))
}

/// Extracts the raw news items from a proxy event or a direct invocation.
///
/// Accepted documents are `{"items": [...]}` or a bare array. A missing or
/// empty body, or an object without `items`, yields no items.
///
/// # Errors
///
/// Returns [`BriefingError::Parse`] when the body is not valid JSON or the
/// items do not match the expected shape.
pub fn parse_raw_items(payload: &Value) -> Result<Vec<RawItem>, BriefingError> {
    let document = match payload.get("body") {
        Some(Value::String(body)) => {
            let text = if payload
                .get("isBase64Encoded")
                .and_then(Value::as_bool)
                .unwrap_or(false)
            {
                let bytes = STANDARD
                    .decode(body.trim())
                    .map_err(|e| BriefingError::Parse(format!("invalid base64 body: {e}")))?;
                String::from_utf8(bytes)
                    .map_err(|e| BriefingError::Parse(format!("body is not UTF-8: {e}")))?
            } else {
                body.clone()
            };

            if text.trim().is_empty() {
                return Ok(Vec::new());
            }
            serde_json::from_str::<Value>(&text)
                .map_err(|e| BriefingError::Parse(format!("body is not valid JSON: {e}")))?
        }
        Some(Value::Null) => return Ok(Vec::new()),
        Some(other) => other.clone(),
        // Direct invocation: the payload is the document.
        None => payload.clone(),
    };

    items_from_document(&document)
}

fn items_from_document(document: &Value) -> Result<Vec<RawItem>, BriefingError> {
    let items = match document {
        Value::Array(_) => document,
        Value::Object(map) => match map.get("items") {
            Some(items) => items,
            None => return Ok(Vec::new()),
        },
        _ => {
            return Err(BriefingError::Parse(
                "expected an object with `items` or an array of items".to_string(),
            ));
        }
    };

    serde_json::from_value(items.clone())
        .map_err(|e| BriefingError::Parse(format!("invalid items: {e}")))
}
