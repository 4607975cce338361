//! JSON to Template Context
//!
//! Converts an arbitrary JSON payload into the template engine's native
//! value tree.

use std::collections::BTreeMap;

use minijinja::Value;
use serde_json::Value as Json;

/// Build a render context from a JSON payload.
///
/// Integers keep the narrowest lossless representation (`i64`, then `u64`);
/// anything else numeric becomes `f64`.
pub fn json_to_context(json: &Json) -> Value {
    match json {
        Json::Null => Value::from(()),
        Json::Bool(b) => Value::from(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::from(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::from(s.as_str()),
        Json::Array(items) => Value::from(items.iter().map(json_to_context).collect::<Vec<_>>()),
        Json::Object(map) => Value::from(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_context(v)))
                .collect::<BTreeMap<String, Value>>(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::value::ValueKind;
    use serde_json::json;

    fn round_trip(input: &Json) -> Json {
        serde_json::to_value(json_to_context(input)).unwrap()
    }

    #[test]
    fn scalars_round_trip_exactly() {
        for input in [
            json!(null),
            json!(true),
            json!(false),
            json!(0),
            json!(-1),
            json!(i64::MIN),
            json!(i64::MAX),
            json!(u64::MAX),
            json!(1.5),
            json!(-0.25),
            json!(1e300),
            json!(""),
            json!("héllo \"world\""),
        ] {
            assert_eq!(round_trip(&input), input, "input {input}");
        }
    }

    #[test]
    fn nested_structures_round_trip() {
        let input = json!({
            "event": "push",
            "count": 3,
            "tags": ["a", 1, null, {"deep": [true]}],
            "repo": {"name": "relay", "stars": 12.5}
        });
        assert_eq!(round_trip(&input), input);
    }

    #[test]
    fn integer_representation_is_narrowest() {
        assert_eq!(
            i64::try_from(json_to_context(&json!(-7))).unwrap(),
            -7,
        );
        let big = json_to_context(&json!(u64::MAX));
        assert_eq!(u64::try_from(big).unwrap(), u64::MAX);
        assert_eq!(json_to_context(&json!(2.5)).kind(), ValueKind::Number);
    }

    #[test]
    fn objects_become_maps_and_arrays_sequences() {
        assert_eq!(json_to_context(&json!({"a": 1})).kind(), ValueKind::Map);
        assert_eq!(json_to_context(&json!([1, 2])).kind(), ValueKind::Seq);
        assert_eq!(json_to_context(&json!(null)).kind(), ValueKind::None);
        assert_eq!(json_to_context(&json!("s")).kind(), ValueKind::String);
    }

    #[test]
    fn context_is_addressable_from_templates() {
        let ctx = json_to_context(&json!({"user": {"name": "ada"}, "items": [10, 20]}));
        let env = minijinja::Environment::new();
        let out = env
            .render_str("{{ user.name }} {{ items[1] }} {{ items|length }}", ctx)
            .unwrap();
        assert_eq!(out, "ada 20 2");
    }
}
