// src/export.rs — Flatten generated suites into tabular rows

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::Value;

use crate::core::suite::TestSuite;
use crate::infra::errors::CaseforgeError;

/// Turn a suite into spreadsheet-shaped rows. Nested objects and arrays
/// become compact one-line JSON so they survive a single cell; scalars
/// stringify plainly. A suite that is neither a case list nor a wrapper
/// collapses to a single `output` column.
pub fn flatten(suite: &TestSuite) -> Vec<BTreeMap<String, String>> {
    match suite {
        TestSuite::List(items) => items.iter().map(row_from).collect(),
        TestSuite::Wrapped(_) => suite.cases().iter().map(row_from).collect(),
        // A raw string might itself be JSON text one unwrapping away.
        TestSuite::Raw(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items.iter().map(row_from).collect(),
            Ok(obj @ Value::Object(_)) => vec![row_from(&obj)],
            _ => vec![output_row(s.clone())],
        },
        TestSuite::Raw(value @ Value::Object(_)) => vec![row_from(value)],
        TestSuite::Raw(other) => vec![output_row(cell_text(other))],
    }
}

/// Sorted union of keys across all rows.
pub fn columns(rows: &[BTreeMap<String, String>]) -> Vec<String> {
    let set: BTreeSet<&String> = rows.iter().flat_map(|r| r.keys()).collect();
    set.into_iter().cloned().collect()
}

/// Render rows as CSV with a header line. Cells missing a column are empty.
pub fn to_csv(rows: &[BTreeMap<String, String>]) -> String {
    let cols = columns(rows);
    if cols.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let header: Vec<Cow<'_, str>> = cols.iter().map(|c| csv_escape(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in rows {
        let cells: Vec<Cow<'_, str>> = cols
            .iter()
            .map(|c| csv_escape(row.get(c).map(String::as_str).unwrap_or("")))
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Flatten a suite and write it to `path` as CSV.
pub fn write_csv(path: &Path, suite: &TestSuite) -> Result<(), CaseforgeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, to_csv(&flatten(suite)))?;
    Ok(())
}

fn row_from(case: &Value) -> BTreeMap<String, String> {
    match case {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), cell_text(v)))
            .collect(),
        other => output_row(cell_text(other)),
    }
}

fn output_row(text: String) -> BTreeMap<String, String> {
    BTreeMap::from([("output".to_string(), text)])
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Object(_) | Value::Array(_) => serde_json::to_string(value).unwrap_or_default(),
        other => other.to_string(),
    }
}

fn csv_escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn suite(value: Value) -> TestSuite {
        TestSuite::from_value(value)
    }

    // ─── flatten tests ──────────────────────────────────────────

    #[test]
    fn test_flatten_list_of_cases() {
        let rows = flatten(&suite(json!([
            {"name": "a", "priority": 1},
            {"name": "b", "priority": 2}
        ])));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "a");
        assert_eq!(rows[1]["priority"], "2");
    }

    #[test]
    fn test_flatten_nested_values_compact_json() {
        let rows = flatten(&suite(json!([{
            "name": "update",
            "input": {"userId": "u1", "fields": ["name", "email"]},
            "steps": [1, 2]
        }])));
        assert_eq!(rows[0]["input"], r#"{"userId":"u1","fields":["name","email"]}"#);
        assert_eq!(rows[0]["steps"], "[1,2]");
    }

    #[test]
    fn test_flatten_wrapped_suite() {
        let rows = flatten(&suite(json!({
            "testCases": [{"name": "a"}],
            "summary": "ignored"
        })));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "a");
    }

    #[test]
    fn test_flatten_single_object_is_one_row() {
        let rows = flatten(&suite(json!({"name": "only case"})));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "only case");
    }

    #[test]
    fn test_flatten_json_text_is_parsed() {
        let rows = flatten(&TestSuite::Raw(json!(r#"[{"name": "from text"}]"#)));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "from text");
    }

    #[test]
    fn test_flatten_plain_text_becomes_output_column() {
        let rows = flatten(&TestSuite::Raw(json!("not json at all")));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["output"], "not json at all");
    }

    #[test]
    fn test_flatten_null_cell_is_empty() {
        let rows = flatten(&suite(json!([{"name": "a", "gender": null}])));
        assert_eq!(rows[0]["gender"], "");
    }

    #[test]
    fn test_flatten_non_object_list_item() {
        let rows = flatten(&suite(json!(["just a string"])));
        assert_eq!(rows[0]["output"], "just a string");
    }

    // ─── columns tests ──────────────────────────────────────────

    #[test]
    fn test_columns_sorted_union() {
        let rows = flatten(&suite(json!([
            {"b": 1, "a": 2},
            {"c": 3}
        ])));
        assert_eq!(columns(&rows), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_columns_empty() {
        assert!(columns(&[]).is_empty());
    }

    // ─── to_csv tests ───────────────────────────────────────────

    #[test]
    fn test_csv_header_and_missing_cells() {
        let rows = flatten(&suite(json!([
            {"name": "a", "expected": "ok"},
            {"name": "b"}
        ])));
        let csv = to_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "expected,name");
        assert_eq!(lines[1], "ok,a");
        assert_eq!(lines[2], ",b");
    }

    #[test]
    fn test_csv_escapes_commas_and_quotes() {
        let rows = flatten(&suite(json!([{"desc": "a, \"quoted\" value"}])));
        let csv = to_csv(&rows);
        assert!(csv.contains("\"a, \"\"quoted\"\" value\""));
    }

    #[test]
    fn test_csv_escapes_newlines() {
        let rows = flatten(&suite(json!([{"desc": "line1\nline2"}])));
        let csv = to_csv(&rows);
        assert!(csv.contains("\"line1\nline2\""));
    }

    #[test]
    fn test_csv_empty_rows() {
        assert_eq!(to_csv(&[]), "");
    }
}
