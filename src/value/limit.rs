use serde_json::{Map, Value};

/// Sentinel appended to a sliced array, naming the omitted count.
pub(crate) fn array_sentinel(omitted: usize) -> String {
    format!("... {omitted} more items")
}

fn is_array_sentinel(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.starts_with("... ") && s.ends_with(" more items"))
}

/// Project a parsed value down to a bounded shape.
///
/// At `max_depth` and below, arrays collapse to `"[Array(n)]"` and objects
/// to `"[Object(n keys)]"`. Above that, arrays longer than `max_items` are
/// sliced to `max_items` elements plus one trailing sentinel string.
///
/// Re-applying the projection to its own output is a no-op: collapsed
/// nodes are plain strings, and an already-sliced array (exactly
/// `max_items + 1` elements ending in the sentinel) is left alone.
pub fn limit_depth(value: &Value, max_depth: usize, max_items: usize) -> Value {
    limit_at(value, 0, max_depth, max_items)
}

fn limit_at(value: &Value, depth: usize, max_depth: usize, max_items: usize) -> Value {
    match value {
        Value::Array(items) => {
            if depth >= max_depth {
                return Value::String(format!("[Array({})]", items.len()));
            }
            let already_sliced = items.len() == max_items + 1
                && items.last().map(is_array_sentinel).unwrap_or(false);
            if items.len() <= max_items || already_sliced {
                Value::Array(
                    items
                        .iter()
                        .map(|item| limit_at(item, depth + 1, max_depth, max_items))
                        .collect(),
                )
            } else {
                let omitted = items.len() - max_items;
                let mut out: Vec<Value> = items[..max_items]
                    .iter()
                    .map(|item| limit_at(item, depth + 1, max_depth, max_items))
                    .collect();
                out.push(Value::String(array_sentinel(omitted)));
                Value::Array(out)
            }
        }
        Value::Object(map) => {
            if depth >= max_depth {
                return Value::String(format!("[Object({} keys)]", map.len()));
            }
            let mut out = Map::new();
            for (key, item) in map {
                out.insert(key.clone(), limit_at(item, depth + 1, max_depth, max_items));
            }
            Value::Object(out)
        }
        scalar => scalar.clone(),
    }
}
