//! Layer merging
//!
//! Objects merge by key, arrays are replaced and scalars are overridden by
//! the later layer.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// An explicit `null` in the overlay replaces the base value.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        // arrays never concatenate
        (_, overlay) => overlay,
    }
}

/// Merge layers in precedence order, lowest first
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}
