use super::tool_result::Decoded;
use serde_json::{Map, Value};
use tracing::warn;

/// Turns a decoded `list_copilot_spaces` payload into listing records, each
/// object record gaining a `space_ref`.
///
/// Accepts a bare array, or an object carrying the array under `spaces` or,
/// failing that, `items`. Anything else yields an empty listing.
pub fn normalize_listing(decoded: Option<Decoded>) -> Vec<Value> {
    let mut spaces = match decoded {
        Some(Decoded::Json(Value::Array(items))) => items,
        Some(Decoded::Json(Value::Object(mut object))) => {
            match object.remove("spaces").or_else(|| object.remove("items")) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        }
        other => {
            warn!(payload = ?other, "Unexpected Copilot Spaces listing payload");
            Vec::new()
        }
    };

    for space in &mut spaces {
        if let Value::Object(record) = space {
            let space_ref = space_ref_for(record);
            record.insert("space_ref".to_string(), Value::String(space_ref));
        }
    }
    spaces
}

/// `owner/name`, or just `name` when the record carries no owner.
///
/// The owner is read from `owner_login` first, then `owner` as a plain
/// string, an object with a `login`, or any other scalar rendered as JSON.
pub fn space_ref_for(record: &Map<String, Value>) -> String {
    let owner = record
        .get("owner_login")
        .and_then(Value::as_str)
        .filter(|login| !login.is_empty())
        .map(str::to_string)
        .or_else(|| match record.get("owner") {
            Some(Value::String(owner)) => Some(owner.clone()),
            Some(Value::Object(owner)) => owner
                .get("login")
                .and_then(Value::as_str)
                .map(str::to_string),
            None | Some(Value::Null) | Some(Value::Array(_)) => None,
            Some(other) => Some(other.to_string()),
        })
        .unwrap_or_default();

    let name = match record.get("name") {
        Some(Value::String(name)) => name.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    };

    if owner.is_empty() {
        name
    } else {
        format!("{owner}/{name}")
    }
}
