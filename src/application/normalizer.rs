// Unwraps the envelope shapes the RPC backend may return
use serde_json::Value;

/// Peel at most one wrapper keyed by `procedure_name`:
/// `[{ name: payload }]`, then `{ name: payload }`, else the bare payload.
pub fn normalize(raw: Option<Value>, procedure_name: &str) -> Option<Value> {
    let raw = raw?;
    if let Some(inner) = unwrap_list(&raw, procedure_name) {
        return Some(inner);
    }
    if let Some(inner) = unwrap_object(&raw, procedure_name) {
        return Some(inner);
    }
    Some(raw)
}

fn unwrap_list(raw: &Value, procedure_name: &str) -> Option<Value> {
    match raw.as_array().map(Vec::as_slice) {
        Some([only]) => unwrap_object(only, procedure_name),
        _ => None,
    }
}

fn unwrap_object(raw: &Value, procedure_name: &str) -> Option<Value> {
    raw.as_object()?
        .get(procedure_name)
        .filter(|inner| is_truthy(inner))
        .cloned()
}

// Falsy values never count as a wrapper.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NAME: &str = "dashboard_funnel";

    fn payload() -> Value {
        json!([{ "etapa": "Novo", "position": "1", "total": "10", "valor": "1000" }])
    }

    #[test]
    fn test_all_shapes_yield_the_same_payload() {
        let bare = payload();
        let object_wrapped = json!({ NAME: payload() });
        let list_wrapped = json!([{ NAME: payload() }]);

        for shape in [bare, object_wrapped, list_wrapped] {
            assert_eq!(normalize(Some(shape), NAME), Some(payload()));
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let shapes = [
            payload(),
            json!({ NAME: payload() }),
            json!([{ NAME: payload() }]),
            json!({ "ativos": "3" }),
        ];
        for shape in shapes {
            let once = normalize(Some(shape), NAME);
            let twice = normalize(once.clone(), NAME);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_absent_stays_absent() {
        assert_eq!(normalize(None, NAME), None);
    }

    #[test]
    fn test_other_keys_are_not_unwrapped() {
        let raw = json!({ "dashboard_kpis": { "ativos": 1 } });
        assert_eq!(normalize(Some(raw.clone()), NAME), Some(raw));
    }

    #[test]
    fn test_multi_element_list_is_bare() {
        let raw = json!([{ NAME: [1] }, { NAME: [2] }]);
        assert_eq!(normalize(Some(raw.clone()), NAME), Some(raw));
    }

    #[test]
    fn test_falsy_wrapped_value_is_left_alone() {
        let raw = json!({ NAME: null });
        assert_eq!(normalize(Some(raw.clone()), NAME), Some(raw));

        let raw = json!([{ NAME: "" }]);
        assert_eq!(normalize(Some(raw.clone()), NAME), Some(raw));
    }

    #[test]
    fn test_empty_list_wrapper_is_peeled() {
        let raw = json!([{ NAME: [] }]);
        assert_eq!(normalize(Some(raw), NAME), Some(json!([])));
    }
}
