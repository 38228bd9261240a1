//! Configuration layer merging
//!
//! - Objects: deep-merge by key
//! - Everything else: override (last wins)

use serde_json::Value;

/// Deep merge two JSON values, `overlay` taking precedence.
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

        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let result = deep_merge(json!({"cache_size": 100}), json!({"cache_size": 200}));
        assert_eq!(result["cache_size"], 200);
    }

    #[test]
    fn test_object_deep_merge() {
        let base = json!({
            "cache": {
                "cache_size": 1024,
                "file_handle_count": 16
            }
        });
        let overlay = json!({
            "cache": {
                "file_handle_count": 4
            }
        });
        let result = deep_merge(base, overlay);

        assert_eq!(result["cache"]["file_handle_count"], 4);
        assert_eq!(result["cache"]["cache_size"], 1024);
    }

    #[test]
    fn test_add_new_key() {
        let result = deep_merge(json!({"a": 1}), json!({"b": 2}));

        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], 2);
    }

    #[test]
    fn test_merge_layers() {
        let builtin = json!({
            "cache": {"cache_size": 100, "single_threaded": false}
        });
        let file = json!({
            "cache": {"cache_size": 200}
        });
        let cli = json!({
            "cache": {"single_threaded": true}
        });

        let result = merge_layers(vec![builtin, file, cli]);

        assert_eq!(result["cache"]["cache_size"], 200);
        assert_eq!(result["cache"]["single_threaded"], true);
    }

    #[test]
    fn test_merge_no_layers() {
        assert!(merge_layers(Vec::new()).is_null());
    }
}
