use serde_json::Value;

use super::scalar;

/// Headline figure per command, tried in order against the `result` object.
const PRIORITY_PATHS: [&[&str]; 7] = [
    &["valuation", "scenarios", "neutral", "estimated_price_per_share"],
    &["scenarios", "neutral", "estimated_price_per_share"],
    &["wacc"],
    &["cost_of_debt"],
    &["expected_return"],
    &["growth_rate"],
    &["rows"],
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(val) = PRIORITY_PATHS
        .iter()
        .filter_map(|path| lookup(result, path))
        .find(|v| !v.is_null() && !v.is_object())
    {
        println!("{}", render(val));
        return;
    }

    match result {
        Value::Object(map) => {
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, render(val));
            }
        }
        Value::Array(arr) => println!("{} rows", arr.len()),
        other => println!("{}", render(other)),
    }
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(*key))
}

fn render(value: &Value) -> String {
    match value {
        // forecast: final-year neutral FCF
        Value::Array(rows) => rows
            .last()
            .and_then(|row| lookup(row, &["scenarios", "neutral", "fcf"]))
            .map(scalar)
            .unwrap_or_else(|| scalar(value)),
        Value::Null => "null".to_string(),
        _ => scalar(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested() {
        let v = json!({"valuation": {"scenarios": {"neutral": {"estimated_price_per_share": "12.5"}}}});
        let found = lookup(&v, PRIORITY_PATHS[0]).unwrap();
        assert_eq!(found, &json!("12.5"));
    }

    #[test]
    fn test_model_wacc_object_is_skipped() {
        let result = json!({"wacc": {"wacc": "0.08"}, "growth_rate": "0.07"});
        let val = PRIORITY_PATHS
            .iter()
            .filter_map(|p| lookup(&result, p))
            .find(|v| !v.is_null() && !v.is_object())
            .unwrap();
        assert_eq!(val, &json!("0.07"));
    }

    #[test]
    fn test_render_forecast_rows() {
        let rows = json!([
            {"year": 2024, "scenarios": {"neutral": {"fcf": "10"}}},
            {"year": 2025, "scenarios": {"neutral": {"fcf": "11"}}}
        ]);
        assert_eq!(render(&rows), "11");
    }
}
