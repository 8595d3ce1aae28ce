use coach_finance_core::preferences::DisplayPreferences;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{detail_rows, DETAIL_KEYS};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value, prefs: &DisplayPreferences) {
    match value {
        Value::Object(map) => {
            // Headline figures live under "result" for calculator envelopes
            let headline = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            print_fields(headline);

            if let Some(rows) = detail_rows(value, prefs) {
                println!();
                print_array_table(rows);
            }

            print_footer(map, prefs);
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if DETAIL_KEYS.contains(&key.as_str()) || key == "methodology" {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    let table = Table::from(builder);
    println!("{}", table);
}

fn print_footer(envelope: &Map<String, Value>, prefs: &DisplayPreferences) {
    // Print warnings if any
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    // Print methodology
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }

    println!(
        "\nAmounts shown in {}; changing currency does not convert values.",
        prefs.currency.symbol().trim()
    );
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        // Simple array of values
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

/// Decimal strings are shown to cents; other values as-is.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => match s.parse::<Decimal>() {
            Ok(d) => format!("{:.2}", d.round_dp(2)),
            Err(_) => s.clone(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "undefined".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(map) => {
            let items: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}={}", k, format_value(v)))
                .collect();
            items.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_strings_rounded_to_cents() {
        assert_eq!(format_value(&json!("2022.617675177")), "2022.62");
        assert_eq!(format_value(&json!("75")), "75.00");
        assert_eq!(format_value(&json!("healthy")), "healthy");
    }

    #[test]
    fn test_null_ratio_reads_undefined() {
        assert_eq!(format_value(&Value::Null), "undefined");
    }

    #[test]
    fn test_nested_object_inline() {
        let v = json!({"pmi": "0", "total": "650"});
        assert_eq!(format_value(&v), "pmi=0.00, total=650.00");
    }
}
