use coach_finance_core::preferences::DisplayPreferences;
use serde_json::{Map, Value};
use std::io;

use super::{detail_rows, DETAIL_KEYS};

/// Write output as CSV to stdout.
///
/// Row-shaped detail (schedule rows, yearly tables) wins over headline
/// figures, so the file opens straight into a spreadsheet.
pub fn print_csv(value: &Value, prefs: &DisplayPreferences) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(rows) = detail_rows(value, prefs) {
        write_array_csv(&mut wtr, rows);
    } else {
        match value {
            Value::Object(map) => {
                let fields = match map.get("result") {
                    Some(Value::Object(result)) => result,
                    _ => map,
                };
                write_fields_csv(&mut wtr, fields);
            }
            Value::Array(arr) => {
                write_array_csv(&mut wtr, arr);
            }
            _ => {
                let _ = wtr.write_record([&format_csv_value(value)]);
            }
        }
    }

    let _ = wtr.flush();
}

fn write_fields_csv<W: io::Write>(wtr: &mut csv::Writer<W>, map: &Map<String, Value>) {
    // Two-column CSV: field, value
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        if DETAIL_KEYS.contains(&key.as_str()) {
            continue;
        }
        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
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

    fn render(f: impl FnOnce(&mut csv::Writer<Vec<u8>>)) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        f(&mut wtr);
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_rows_use_first_object_headers() {
        let rows = vec![
            json!({"year": 1, "interest": "10.5"}),
            json!({"year": 2, "interest": "9.25"}),
        ];
        let out = render(|w| write_array_csv(w, &rows));
        assert_eq!(out, "interest,year\n10.5,1\n9.25,2\n");
    }

    #[test]
    fn test_fields_skip_detail_keys() {
        let value = json!({"monthly_payment": "506.91", "schedule": {"rows": []}, "dscr": null});
        let out = render(|w| write_fields_csv(w, value.as_object().unwrap()));
        assert_eq!(out, "field,value\ndscr,\nmonthly_payment,506.91\n");
    }
}
