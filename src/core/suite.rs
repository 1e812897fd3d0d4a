// src/core/suite.rs — Normalized shape of a generated test-case payload

use serde_json::{Map, Value};

/// Key some models use to wrap the case array in an object.
pub const WRAPPER_KEY: &str = "testCases";

/// What a model actually returned, classified by shape.
///
/// Prompted models mostly emit a bare JSON array of cases, but a stubborn
/// minority wraps it in `{"testCases": [...]}` (sometimes with siblings like
/// a summary field), and the rest is anything at all. Normalizing here keeps
/// every consumer off the shape-sniffing treadmill.
#[derive(Debug, Clone, PartialEq)]
pub enum TestSuite {
    /// Bare array of test-case objects.
    List(Vec<Value>),
    /// Object carrying a `testCases` array; sibling keys are preserved.
    Wrapped(Map<String, Value>),
    /// Anything else the model produced.
    Raw(Value),
}

impl TestSuite {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => TestSuite::List(items),
            Value::Object(map)
                if map.get(WRAPPER_KEY).is_some_and(Value::is_array) =>
            {
                TestSuite::Wrapped(map)
            }
            other => TestSuite::Raw(other),
        }
    }

    /// The individual test cases, wherever they live. Empty for `Raw`.
    pub fn cases(&self) -> &[Value] {
        match self {
            TestSuite::List(items) => items,
            TestSuite::Wrapped(map) => map
                .get(WRAPPER_KEY)
                .and_then(Value::as_array)
                .map_or(&[], Vec::as_slice),
            TestSuite::Raw(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.cases().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases().is_empty()
    }

    /// Back to the exact JSON the model produced.
    pub fn to_value(&self) -> Value {
        match self {
            TestSuite::List(items) => Value::Array(items.clone()),
            TestSuite::Wrapped(map) => Value::Object(map.clone()),
            TestSuite::Raw(value) => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array_is_list() {
        let suite = TestSuite::from_value(json!([{"name": "a"}, {"name": "b"}]));
        assert!(matches!(suite, TestSuite::List(_)));
        assert_eq!(suite.len(), 2);
    }

    #[test]
    fn test_wrapper_object_is_wrapped() {
        let suite = TestSuite::from_value(json!({
            "testCases": [{"name": "a"}],
            "summary": "one case"
        }));
        assert!(matches!(suite, TestSuite::Wrapped(_)));
        assert_eq!(suite.len(), 1);
        assert_eq!(suite.cases()[0], json!({"name": "a"}));
    }

    #[test]
    fn test_wrapped_preserves_sibling_keys() {
        let original = json!({"testCases": [], "summary": "empty"});
        let suite = TestSuite::from_value(original.clone());
        assert_eq!(suite.to_value(), original);
    }

    #[test]
    fn test_object_without_wrapper_key_is_raw() {
        let suite = TestSuite::from_value(json!({"name": "single case"}));
        assert!(matches!(suite, TestSuite::Raw(_)));
        assert!(suite.is_empty());
    }

    #[test]
    fn test_non_array_wrapper_value_is_raw() {
        let suite = TestSuite::from_value(json!({"testCases": "not a list"}));
        assert!(matches!(suite, TestSuite::Raw(_)));
    }

    #[test]
    fn test_scalar_is_raw() {
        let suite = TestSuite::from_value(json!("just a string"));
        assert!(matches!(suite, TestSuite::Raw(_)));
        assert_eq!(suite.len(), 0);
    }

    #[test]
    fn test_to_value_round_trips_every_shape() {
        for v in [
            json!([{"a": 1}]),
            json!({"testCases": [{"a": 1}], "extra": 2}),
            json!({"other": true}),
            json!(42),
        ] {
            assert_eq!(TestSuite::from_value(v.clone()).to_value(), v);
        }
    }
}
