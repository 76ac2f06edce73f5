pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Flatten nested objects into dotted keys (`scenarios.neutral.fcf`).
/// Arrays are kept as leaves.
pub(crate) fn flatten(value: &Value) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    if let Value::Object(map) = value {
        flatten_into("", map, &mut out);
    }
    out
}

fn flatten_into(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, Value)>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) if !inner.is_empty() => flatten_into(&path, inner, out),
            _ => out.push((path, val.clone())),
        }
    }
}

/// Scalar rendering shared by the table and CSV writers.
pub(crate) fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested() {
        let v = json!({"year": 2024, "scenarios": {"neutral": {"fcf": "1.5"}}});
        let flat = flatten(&v);
        assert_eq!(
            flat,
            vec![
                ("scenarios.neutral.fcf".to_string(), json!("1.5")),
                ("year".to_string(), json!(2024)),
            ]
        );
    }

    #[test]
    fn test_scalar() {
        assert_eq!(scalar(&json!("0.05")), "0.05");
        assert_eq!(scalar(&Value::Null), "");
        assert_eq!(scalar(&json!([1, 2])), "[1,2]");
    }
}
