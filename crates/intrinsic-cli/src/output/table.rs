use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten, scalar};

const SCENARIOS: [&str; 3] = ["neutral", "positive", "negative"];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_envelope(result, map),
            None => print_fields(flatten(value)),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_envelope(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Array(rows) => print_array_table(rows),
        Value::Object(_) => {
            // Sections rendered as their own tables are left out of the field list.
            let mut consumed: Vec<&str> = Vec::new();

            if let Some(scenarios) = result
                .get("scenarios")
                .filter(|s| s.get("neutral").map_or(false, Value::is_object))
            {
                print_scenario_table(scenarios);
                consumed.push("scenarios.");
            }
            if let Some(scenarios) = result.pointer("/valuation/scenarios") {
                print_scenario_table(scenarios);
                consumed.push("valuation.scenarios.");
            }
            if let Some(Value::Array(rows)) = result.get("rows") {
                print_forecast_table(rows);
                consumed.push("rows");
            }
            if let Some(Value::Array(rows)) = result.pointer("/forecast/rows") {
                print_forecast_table(rows);
                consumed.push("forecast.rows");
            }

            let fields: Vec<(String, Value)> = flatten(result)
                .into_iter()
                .filter(|(k, _)| !consumed.iter().any(|c| k.starts_with(c)))
                .collect();
            print_fields(fields);
        }
        other => println!("{}", scalar(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// One row per metric, one column per outlook.
fn print_scenario_table(scenarios: &Value) {
    let Some(Value::Object(neutral)) = scenarios.get("neutral") else {
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Metric", "Neutral", "Positive", "Negative"]);
    for metric in neutral.keys() {
        let mut row = vec![metric.clone()];
        for s in SCENARIOS {
            row.push(
                scenarios
                    .get(s)
                    .and_then(|v| v.get(metric))
                    .map(scalar)
                    .unwrap_or_default(),
            );
        }
        builder.push_record(row);
    }
    println!("{}\n", Table::from(builder));
}

/// One row per forecast year with revenue and FCF for every outlook.
fn print_forecast_table(rows: &[Value]) {
    let mut builder = Builder::default();
    let mut header = vec!["Year".to_string()];
    for s in SCENARIOS {
        header.push(format!("{s} revenue"));
        header.push(format!("{s} FCF"));
    }
    builder.push_record(header);

    for row in rows {
        let mut record = vec![row.get("year").map(scalar).unwrap_or_default()];
        for s in SCENARIOS {
            for field in ["revenue", "fcf"] {
                record.push(
                    row.get("scenarios")
                        .and_then(|sc| sc.get(s))
                        .and_then(|p| p.get(field))
                        .map(scalar)
                        .unwrap_or_default(),
                );
            }
        }
        builder.push_record(record);
    }
    println!("{}\n", Table::from(builder));
}

fn print_fields(fields: Vec<(String, Value)>) {
    if fields.is_empty() {
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key, scalar(&val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    let flat_rows: Vec<Vec<(String, Value)>> = arr.iter().map(flatten).collect();
    let Some(first) = flat_rows.first().filter(|r| !r.is_empty()) else {
        for item in arr {
            println!("{}", scalar(item));
        }
        return;
    };

    let headers: Vec<String> = first.iter().map(|(k, _)| k.clone()).collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for row in &flat_rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| {
                row.iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| scalar(v))
                    .unwrap_or_default()
            })
            .collect();
        builder.push_record(cells);
    }
    println!("{}", Table::from(builder));
}
