use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::ipc::types::Request;
use crate::store::LoadState;

pub fn param_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Ids arrive as numbers, numeric strings, or `{Id}` objects depending on
/// the shell; normalize them all.
pub fn param_id(req: &Request, key: &str) -> Option<i64> {
    req.params.get(key).and_then(crate::platform::relation_id)
}

pub fn parse_data<T: DeserializeOwned>(req: &Request) -> Result<T, String> {
    let data = req
        .params
        .get("data")
        .cloned()
        .unwrap_or_else(|| json!({}));
    serde_json::from_value(data).map_err(|e| format!("invalid data payload: {e}"))
}

/// The uniform list result: the cached items plus the store's state pair.
pub fn list_payload<T: Serialize>(
    key: &str,
    items: &[T],
    state: LoadState,
    error: Option<&str>,
) -> Value {
    json!({
        key: items,
        "state": state.as_str(),
        "error": error,
    })
}
