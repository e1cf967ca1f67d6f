//! Recursive traversal over card payload documents.

use serde_json::{Map, Value};

/// Invokes `visit` for every JSON object nested anywhere inside `value`.
///
/// Objects are visited in document order: a parent is reported before any
/// object nested in its values, and array elements are descended in index
/// order. Scalars and the arrays themselves are never reported. Traversal is
/// purely structural, so an asset fragment is found no matter how deeply the
/// payload nests it.
pub fn walk_fragments<F>(value: &Value, visit: &mut F)
where
    F: FnMut(&Map<String, Value>),
{
    match value {
        Value::Object(fragment) => {
            visit(fragment);
            for child in fragment.values() {
                walk_fragments(child, visit);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_fragments(item, visit);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn collect_labels(value: &Value) -> Vec<String> {
        let mut labels = Vec::new();
        walk_fragments(value, &mut |fragment| {
            if let Some(label) = fragment.get("label").and_then(Value::as_str) {
                labels.push(label.to_string());
            }
        });
        labels
    }

    #[test]
    fn visits_every_nested_object() {
        let doc = json!({
            "label": "root",
            "hero": { "label": "hero", "overlay": { "label": "overlay" } },
            "actions": [
                { "label": "first" },
                { "label": "second" },
            ],
        });

        let mut count = 0;
        walk_fragments(&doc, &mut |_| count += 1);
        assert_eq!(count, 5);
    }

    #[test]
    fn parents_are_reported_before_their_children() {
        let doc = json!({
            "label": "root",
            "body": { "label": "body", "inner": { "label": "inner" } },
        });

        assert_eq!(collect_labels(&doc), ["root", "body", "inner"]);
    }

    #[test]
    fn descends_arrays_of_arrays() {
        let doc = json!([[[{ "label": "deep" }]], [{ "label": "shallow" }]]);
        assert_eq!(collect_labels(&doc), ["deep", "shallow"]);
    }

    #[test]
    fn scalars_produce_no_visits() {
        let mut count = 0;
        walk_fragments(&json!(42), &mut |_| count += 1);
        walk_fragments(&json!(["a", 1, null, true]), &mut |_| count += 1);
        assert_eq!(count, 0);
    }
}
