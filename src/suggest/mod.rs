//! Autocomplete name derivation for expense line items.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::period::{ExpenseCategory, Period};

/// Upper bound on names returned by [`filter_suggestions`].
pub const MAX_SUGGESTIONS: usize = 8;

/// Name lists for one category: the chronologically previous period and the
/// whole collection. Both deduplicated and alphabetically sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    pub previous: Vec<String>,
    pub all: Vec<String>,
}

/// Derives suggestion lists for the period with `id`. "Previous" means the
/// single preceding period by id ordering; absent neighbours yield an empty
/// list.
pub fn suggestions_for(periods: &[Period], id: u64, category: ExpenseCategory) -> Suggestions {
    let mut by_id: Vec<&Period> = periods.iter().collect();
    by_id.sort_by_key(|period| period.id);

    let previous = by_id
        .iter()
        .position(|period| period.id == id)
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| by_id.get(index))
        .map(|period| sorted_unique(period.category_names(category)))
        .unwrap_or_default();

    let all = sorted_unique(
        by_id
            .iter()
            .flat_map(|period| period.category_names(category))
            .collect(),
    );

    Suggestions { previous, all }
}

/// Filters candidates to those whose lowercase form starts with the
/// lowercase query, dropping names already taken (case-insensitive) and
/// capping at [`MAX_SUGGESTIONS`] while preserving candidate order.
pub fn filter_suggestions(query: &str, candidates: &[String], taken: &[String]) -> Vec<String> {
    let query = query.trim().to_lowercase();
    let taken: BTreeSet<String> = taken.iter().map(|name| name.to_lowercase()).collect();
    candidates
        .iter()
        .filter(|name| {
            let lower = name.to_lowercase();
            lower.starts_with(&query) && !taken.contains(&lower)
        })
        .take(MAX_SUGGESTIONS)
        .cloned()
        .collect()
}

fn sorted_unique(names: Vec<&str>) -> Vec<String> {
    let unique: BTreeSet<&str> = names.into_iter().filter(|name| !name.is_empty()).collect();
    unique.into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::{BudgetedItem, Period};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn period_with_expenses(id: u64, month: u32, names: &[&str]) -> Period {
        let mut period = Period::new(id, d(2025, month, 1), d(2025, month, 28));
        for name in names {
            period.expenses.push(BudgetedItem {
                id: 0,
                name: (*name).into(),
                planned_amount: 100,
                actual_amount: 100,
            });
        }
        period
    }

    #[test]
    fn all_names_deduplicated_and_sorted() {
        let periods = vec![
            period_with_expenses(1, 1, &["Gym", "Gym", "Rent"]),
            period_with_expenses(2, 2, &["Rent", "Food"]),
        ];
        let result = suggestions_for(&periods, 2, ExpenseCategory::Mandatory);
        assert_eq!(result.all, vec!["Food", "Gym", "Rent"]);
        assert_eq!(result.previous, vec!["Gym", "Rent"]);
    }

    #[test]
    fn first_period_has_no_previous_names() {
        let periods = vec![
            period_with_expenses(1, 1, &["Gym"]),
            period_with_expenses(2, 2, &["Rent"]),
        ];
        let result = suggestions_for(&periods, 1, ExpenseCategory::Mandatory);
        assert!(result.previous.is_empty());
        assert_eq!(result.all, vec!["Gym", "Rent"]);
    }

    #[test]
    fn filter_is_prefix_based_and_skips_taken_names() {
        let candidates: Vec<String> = ["Groceries", "Gym", "Gas", "Rent"]
            .into_iter()
            .map(String::from)
            .collect();
        let taken = vec!["GYM".to_string()];
        assert_eq!(
            filter_suggestions("g", &candidates, &taken),
            vec!["Groceries", "Gas"]
        );
        assert!(filter_suggestions("x", &candidates, &[]).is_empty());
    }

    #[test]
    fn filter_caps_result_count() {
        let candidates: Vec<String> = (0..20).map(|i| format!("Item {i}")).collect();
        assert_eq!(
            filter_suggestions("item", &candidates, &[]).len(),
            MAX_SUGGESTIONS
        );
    }
}
