pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use coach_finance_core::preferences::{DisplayPreferences, ScheduleView};
use serde_json::Value;

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value, prefs: &DisplayPreferences) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value, prefs),
        OutputFormat::Csv => csv_out::print_csv(value, prefs),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Keys holding row-shaped detail rather than headline figures.
pub const DETAIL_KEYS: [&str; 3] = ["results", "schedule", "yearly"];

/// Row-shaped detail carried by an output: an explicit `results` array, an
/// attached amortisation schedule in the preferred view, or a growth table.
pub fn detail_rows<'a>(value: &'a Value, prefs: &DisplayPreferences) -> Option<&'a Vec<Value>> {
    if let Some(Value::Array(rows)) = value.get("results") {
        return Some(rows);
    }

    let result = value.get("result")?;
    if let Some(schedule) = result.get("schedule") {
        let key = match prefs.schedule_view {
            ScheduleView::Monthly => "rows",
            ScheduleView::Yearly => "yearly",
        };
        return schedule.get(key).and_then(Value::as_array);
    }
    result.get("yearly").and_then(Value::as_array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schedule_rows_follow_view() {
        let value = json!({
            "result": {
                "monthly_payment": "100",
                "schedule": {"rows": [{"period": 1}, {"period": 2}], "yearly": [{"year": 1}]}
            }
        });
        let mut prefs = DisplayPreferences::default();
        assert_eq!(detail_rows(&value, &prefs).unwrap().len(), 1);
        prefs.schedule_view = ScheduleView::Monthly;
        assert_eq!(detail_rows(&value, &prefs).unwrap().len(), 2);
    }

    #[test]
    fn test_top_level_results_preferred() {
        let value = json!({"monthly_payment": "1", "results": [{"year": 1}]});
        let prefs = DisplayPreferences::default();
        assert_eq!(detail_rows(&value, &prefs).unwrap().len(), 1);
    }

    #[test]
    fn test_no_detail() {
        let value = json!({"result": {"future_value": "1"}});
        assert!(detail_rows(&value, &DisplayPreferences::default()).is_none());
    }
}
