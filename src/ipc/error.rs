use serde_json::json;

use crate::api::ApiError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Map a typed API failure onto the error envelope, carrying field-level
/// messages when the platform rejected the record.
pub fn api_err(id: &str, e: &ApiError) -> serde_json::Value {
    let details = match e {
        ApiError::Rejected { fields, .. } if !fields.is_empty() => {
            Some(json!({ "fields": fields }))
        }
        _ => None,
    };
    err(id, e.code(), e.to_string(), details)
}
