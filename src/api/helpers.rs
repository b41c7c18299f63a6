//! Response builders for API Gateway proxy responses.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

fn cors_headers() -> Value {
    json!({
        "Content-Type": "application/json",
        "Access-Control-Allow-Origin": "*",
        "Access-Control-Allow-Methods": "GET,POST,OPTIONS",
        "Access-Control-Allow-Headers": "Content-Type,Authorization",
    })
}

/// Returns a 200 OK response with `body` serialized as JSON.
#[must_use]
pub fn ok_json<T: Serialize>(body: &T) -> Value {
    match serde_json::to_string(body) {
        Ok(body) => json!({
            "statusCode": 200,
            "headers": cors_headers(),
            "body": body,
        }),
        Err(e) => {
            error!("Failed to serialize response body: {}", e);
            err_response(500, "Failed to serialize response")
        }
    }
}

/// Returns an empty 200 response for CORS preflight requests.
#[must_use]
pub fn preflight() -> Value {
    json!({ "statusCode": 200, "headers": cors_headers(), "body": "" })
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json!({
        "statusCode": status_code,
        "headers": cors_headers(),
        "body": json!({ "error": message }).to_string()
    })
}
