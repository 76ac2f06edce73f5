use serde_json::Value;
use std::io;

use super::{flatten, scalar};

/// Write output as CSV to stdout.
///
/// Object results become `field,value` pairs with dotted keys; array results
/// (and the per-year forecast rows) become one record per element.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        Value::Object(_) => {
            if let Some(Value::Array(rows)) = result.get("rows") {
                write_array_csv(&mut wtr, rows);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in flatten(result) {
                    let _ = wtr.write_record([key, scalar(&val)]);
                }
            }
        }
        other => {
            let _ = wtr.write_record([scalar(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let rows: Vec<Vec<(String, Value)>> = arr.iter().map(flatten).collect();
    let Some(first) = rows.first().filter(|r| !r.is_empty()) else {
        for item in arr {
            let _ = wtr.write_record([scalar(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.iter().map(|(k, _)| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for row in &rows {
        let record: Vec<String> = headers
            .iter()
            .map(|h| {
                row.iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| scalar(v))
                    .unwrap_or_default()
            })
            .collect();
        let _ = wtr.write_record(&record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        if let Value::Array(arr) = value {
            write_array_csv(&mut wtr, arr);
        }
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_forecast_rows_flattened() {
        let rows = json!([
            {"year": 2024, "scenarios": {"neutral": {"fcf": "10"}}},
            {"year": 2025, "scenarios": {"neutral": {"fcf": "11"}}}
        ]);
        assert_eq!(render(&rows), "scenarios.neutral.fcf,year\n10,2024\n11,2025\n");
    }

    #[test]
    fn test_scalar_array() {
        assert_eq!(render(&json!(["0.1", "0.2"])), "0.1\n0.2\n");
    }
}
