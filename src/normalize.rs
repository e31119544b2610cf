//! Flattens the differently shaped list responses of the REST endpoints into one array.
//!
//! Checked in order: a bare array, `results`, `data`, then a property named after the
//! entity type (`{"customers": [...]}`). Anything else is an empty list, never an error.

use serde_json::Value;

/// Extract the item array from a raw response for `entity`
pub fn normalize(response: Value, entity: &str) -> Vec<Value> {
    match response {
        Value::Array(items) => items,
        Value::Object(mut object) => {
            for key in ["results", "data", entity] {
                if matches!(object.get(key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = object.remove(key) {
                        return items;
                    }
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}
