//! Forward migration of persisted period collections.
//!
//! Stored data may predate the current schema or have been written by hand;
//! records are mapped forward field-by-field with safe defaults instead of
//! being rejected. Only entries without a usable id or date range are
//! dropped, with a warning.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;

use crate::dates::parse_date_key;
use crate::period::Period;

/// Decodes a raw slot payload into the current period shape.
pub fn normalize_periods(raw: &str) -> Vec<Period> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(%err, "stored period data unreadable, starting empty");
            return Vec::new();
        }
    };
    let entries = match value {
        Value::Array(entries) => entries,
        // Legacy wrapper shape: {"periods": [...]}.
        Value::Object(mut map) => match map.remove("periods") {
            Some(Value::Array(entries)) => entries,
            _ => {
                tracing::warn!("stored period data has no period array, starting empty");
                return Vec::new();
            }
        },
        _ => {
            tracing::warn!("stored period data is not a collection, starting empty");
            return Vec::new();
        }
    };

    let mut periods: Vec<Period> = entries.into_iter().filter_map(normalize_period).collect();
    enforce_single_pin(&mut periods);
    periods
}

fn normalize_period(value: Value) -> Option<Period> {
    let map = match value {
        Value::Object(map) => map,
        other => {
            tracing::warn!(?other, "dropping non-object period record");
            return None;
        }
    };

    let id = map.get("id").and_then(as_u64)?;
    let start_date = date_field(&map, "start_date", "startDate");
    let end_date = date_field(&map, "end_date", "endDate");
    let (start_date, end_date) = match (start_date, end_date) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            tracing::warn!(id, "dropping period record without a valid date range");
            return None;
        }
    };

    let mut period = Period::new(id, start_date, end_date);
    period.is_pinned = bool_field(&map, "is_pinned", "pinned");
    period.is_closed = bool_field(&map, "is_closed", "closed");
    // The frozen remainder only exists on closed periods; a stray value on
    // an open record is legacy noise.
    period.actual_remaining = if period.is_closed {
        map.get("actual_remaining").and_then(as_i64)
    } else {
        None
    };
    period.unforeseen_allocated = map
        .get("unforeseen_allocated")
        .and_then(as_i64)
        .unwrap_or(0);
    period.daily_expenses = map
        .get("daily_expenses")
        .map(daily_expenses_map)
        .unwrap_or_default();
    period.incomes = item_list(&map, "incomes");
    period.expenses = item_list(&map, "expenses");
    period.external_expenses = item_list(&map, "external_expenses");
    period.unforeseen_expenses = item_list(&map, "unforeseen_expenses");
    Some(period)
}

/// Keeps the first pinned period, unpinning any later ones so the loaded
/// collection always satisfies the single-pin invariant.
fn enforce_single_pin(periods: &mut [Period]) {
    let mut seen = false;
    for period in periods.iter_mut() {
        if period.is_pinned {
            if seen {
                tracing::warn!(id = period.id, "unpinning extra pinned period on load");
                period.is_pinned = false;
            }
            seen = true;
        }
    }
}

fn date_field(
    map: &serde_json::Map<String, Value>,
    key: &str,
    legacy_key: &str,
) -> Option<NaiveDate> {
    map.get(key)
        .or_else(|| map.get(legacy_key))
        .and_then(Value::as_str)
        .and_then(parse_date_key)
}

fn bool_field(map: &serde_json::Map<String, Value>, key: &str, legacy_key: &str) -> bool {
    map.get(key)
        .or_else(|| map.get(legacy_key))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn daily_expenses_map(value: &Value) -> BTreeMap<String, i64> {
    let Value::Object(entries) = value else {
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(|(key, amount)| {
            let date = parse_date_key(key)?;
            Some((crate::dates::date_key(date), as_i64(amount).unwrap_or(0)))
        })
        .collect()
}

fn item_list<T: serde::de::DeserializeOwned>(
    map: &serde_json::Map<String, Value>,
    key: &str,
) -> Vec<T> {
    let Some(Value::Array(entries)) = map.get(key) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .collect()
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_payload_normalizes_to_empty() {
        assert!(normalize_periods("not json").is_empty());
        assert!(normalize_periods("42").is_empty());
        assert!(normalize_periods("{\"other\": true}").is_empty());
    }

    #[test]
    fn legacy_wrapper_and_field_names_migrate_forward() {
        let raw = r#"{"periods": [{
            "id": "3",
            "startDate": "2025-01-01",
            "endDate": "2025-01-31",
            "pinned": true,
            "expenses": [{"id": 1, "name": "Rent", "planned_amount": 500}]
        }]}"#;
        let periods = normalize_periods(raw);
        assert_eq!(periods.len(), 1);
        let period = &periods[0];
        assert_eq!(period.id, 3);
        assert!(period.is_pinned);
        assert!(!period.is_closed);
        assert_eq!(period.expenses[0].actual_amount, 500);
    }

    #[test]
    fn records_without_dates_are_dropped() {
        let raw = r#"[{"id": 1}, {"id": 2, "start_date": "2025-02-01", "end_date": "2025-02-28"}]"#;
        let periods = normalize_periods(raw);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].id, 2);
    }

    #[test]
    fn extra_pinned_records_are_unpinned_on_load() {
        let raw = r#"[
            {"id": 1, "start_date": "2025-01-01", "end_date": "2025-01-31", "is_pinned": true},
            {"id": 2, "start_date": "2025-02-01", "end_date": "2025-02-28", "is_pinned": true}
        ]"#;
        let periods = normalize_periods(raw);
        assert!(periods[0].is_pinned);
        assert!(!periods[1].is_pinned);
    }

    #[test]
    fn stray_remainder_on_open_record_is_cleared() {
        let raw = r#"[
            {"id": 1, "start_date": "2025-01-01", "end_date": "2025-01-31",
             "is_closed": false, "actual_remaining": 12345},
            {"id": 2, "start_date": "2025-02-01", "end_date": "2025-02-28",
             "is_closed": true, "actual_remaining": 4200}
        ]"#;
        let periods = normalize_periods(raw);
        assert_eq!(periods[0].actual_remaining, None);
        assert_eq!(periods[1].actual_remaining, Some(4200));
    }

    #[test]
    fn daily_expense_keys_are_validated() {
        let raw = r#"[{
            "id": 1,
            "start_date": "2025-03-01",
            "end_date": "2025-03-31",
            "daily_expenses": {"2025-03-01": 100, "bogus": 50, "2025-03-02": "25"}
        }]"#;
        let periods = normalize_periods(raw);
        let daily = &periods[0].daily_expenses;
        assert_eq!(daily.len(), 2);
        assert_eq!(daily.get("2025-03-01"), Some(&100));
        assert_eq!(daily.get("2025-03-02"), Some(&25));
    }
}
