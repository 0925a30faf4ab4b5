//! Pure derivation of every displayed or stored monetary aggregate.
//!
//! Nothing here touches the store; functions take period snapshots or raw
//! line-item slices and return plain values.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::dates::{date_key, days_inclusive};
use crate::period::{BudgetedItem, MoneyItem, Period};

/// Planned/actual totals for a budgeted expense list. A positive
/// `difference` means under budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseTotals {
    pub planned: i64,
    pub actual: i64,
    pub difference: i64,
}

/// All derived figures for one period snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodMetrics {
    /// Income minus planned mandatory expenses.
    pub planned_period_sum: i64,
    pub daily_average: f64,
    /// The live remainder; frozen into the period at close time.
    pub actual_remaining: i64,
    /// Unforeseen spend beyond its allocation, charged like a mandatory
    /// overrun.
    pub unforeseen_overrun: i64,
    pub remaining_days: i64,
    pub remaining_daily_average: f64,
    pub is_daily_complete: bool,
    /// Unspent part of the unforeseen allocation, display only.
    pub unforeseen_remaining: i64,
    /// Final figure shown to the user: remainder plus unspent allocation.
    pub funds_remaining: i64,
}

pub fn sum_amount(items: &[MoneyItem]) -> i64 {
    items.iter().map(|item| item.amount).sum()
}

pub fn expense_totals(items: &[BudgetedItem]) -> ExpenseTotals {
    let planned = items.iter().map(|item| item.planned_amount).sum();
    let actual = items.iter().map(|item| item.actual_amount).sum();
    ExpenseTotals {
        planned,
        actual,
        difference: planned - actual,
    }
}

pub fn daily_expenses_total(daily_expenses: &BTreeMap<String, i64>) -> i64 {
    daily_expenses.values().sum()
}

/// Calendar days in the range with an explicit entry, zero included.
/// Absence of the key, not its value, marks a day unfilled.
pub fn filled_days_count(
    start: NaiveDate,
    end: NaiveDate,
    daily_expenses: &BTreeMap<String, i64>,
) -> i64 {
    let mut day = start;
    let mut filled = 0;
    while day <= end {
        if daily_expenses.contains_key(&date_key(day)) {
            filled += 1;
        }
        day += chrono::Duration::days(1);
    }
    filled
}

pub fn period_metrics(period: &Period) -> PeriodMetrics {
    let days = days_inclusive(period.start_date, period.end_date);
    let total_income = sum_amount(&period.incomes);
    let mandatory = expense_totals(&period.expenses);
    let unforeseen = expense_totals(&period.unforeseen_expenses);
    let total_daily = daily_expenses_total(&period.daily_expenses);
    let filled_days = filled_days_count(period.start_date, period.end_date, &period.daily_expenses);

    let planned_period_sum = total_income - mandatory.planned;
    let daily_average = if days > 0 {
        planned_period_sum as f64 / days as f64
    } else {
        0.0
    };
    let unforeseen_overrun = (unforeseen.actual - period.unforeseen_allocated).max(0);
    let actual_remaining =
        planned_period_sum + mandatory.difference - total_daily - unforeseen_overrun;
    let remaining_days = (days - filled_days).max(0);
    let remaining_daily_average = if remaining_days > 0 {
        actual_remaining as f64 / remaining_days as f64
    } else {
        0.0
    };
    let unforeseen_remaining = (period.unforeseen_allocated - unforeseen.actual).max(0);

    PeriodMetrics {
        planned_period_sum,
        daily_average,
        actual_remaining,
        unforeseen_overrun,
        remaining_days,
        remaining_daily_average,
        is_daily_complete: days > 0 && filled_days >= days,
        unforeseen_remaining,
        funds_remaining: actual_remaining + unforeseen_remaining,
    }
}

const MINUS_SIGN: char = '\u{2212}';

/// Rounds to the nearest integer and renders the unsigned value with
/// space-grouped thousands.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round() as i64;
    group_digits(rounded.unsigned_abs())
}

/// Signed variant: `+` prefix for positive, a minus-sign glyph for
/// negative, bare `0` for zero.
pub fn format_signed_amount(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = group_digits(rounded.unsigned_abs());
    match rounded.signum() {
        1 => format!("+{digits}"),
        -1 => format!("{MINUS_SIGN}{digits}"),
        _ => digits,
    }
}

fn group_digits(value: u64) -> String {
    let raw = value.to_string();
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    let offset = raw.len() % 3;
    for (index, ch) in raw.chars().enumerate() {
        if index > 0 && (index + 3 - offset) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn money(name: &str, amount: i64) -> MoneyItem {
        MoneyItem {
            id: 0,
            name: name.into(),
            amount,
        }
    }

    fn budgeted(name: &str, planned: i64, actual: i64) -> BudgetedItem {
        BudgetedItem {
            id: 0,
            name: name.into(),
            planned_amount: planned,
            actual_amount: actual,
        }
    }

    #[test]
    fn expense_totals_difference_sign() {
        let totals = expense_totals(&[budgeted("Rent", 500, 480), budgeted("Gym", 40, 70)]);
        assert_eq!(totals.planned, 540);
        assert_eq!(totals.actual, 550);
        assert_eq!(totals.difference, -10);
    }

    #[test]
    fn reference_period_metrics() {
        // 30 days, 100000 income, 40000 planned mandatory (2000 underspent),
        // 15000 daily spend, 5000 unforeseen allocation with 7000 spent.
        let mut period = Period::new(1, d(2025, 4, 1), d(2025, 4, 30));
        period.incomes.push(money("Salary", 100_000));
        period.expenses.push(budgeted("Bills", 40_000, 38_000));
        period.unforeseen_allocated = 5_000;
        period
            .unforeseen_expenses
            .push(budgeted("Repairs", 7_000, 7_000));
        for day in 1..=15 {
            period
                .daily_expenses
                .insert(date_key(d(2025, 4, day)), 1_000);
        }

        let metrics = period_metrics(&period);
        assert_eq!(metrics.planned_period_sum, 60_000);
        assert_eq!(metrics.unforeseen_overrun, 2_000);
        assert_eq!(metrics.actual_remaining, 45_000);
        assert_eq!(metrics.daily_average, 2_000.0);
        assert_eq!(metrics.remaining_days, 15);
        assert_eq!(metrics.remaining_daily_average, 3_000.0);
        assert_eq!(metrics.unforeseen_remaining, 0);
        assert_eq!(metrics.funds_remaining, 45_000);
        assert!(!metrics.is_daily_complete);
    }

    #[test]
    fn unforeseen_remaining_when_under_allocation() {
        let mut period = Period::new(1, d(2025, 4, 1), d(2025, 4, 30));
        period.unforeseen_allocated = 5_000;
        period
            .unforeseen_expenses
            .push(budgeted("Gift", 1_500, 1_500));
        let metrics = period_metrics(&period);
        assert_eq!(metrics.unforeseen_overrun, 0);
        assert_eq!(metrics.unforeseen_remaining, 3_500);
        assert_eq!(metrics.funds_remaining, metrics.actual_remaining + 3_500);
    }

    #[test]
    fn filled_days_count_ignores_out_of_range_keys() {
        let mut daily = BTreeMap::new();
        daily.insert("2025-03-01".to_string(), 0);
        daily.insert("2025-02-28".to_string(), 500);
        assert_eq!(filled_days_count(d(2025, 3, 1), d(2025, 3, 3), &daily), 1);
    }

    #[test]
    fn amount_formatting_groups_thousands() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(1_234_567.0), "1 234 567");
        assert_eq!(format_amount(-45_000.0), "45 000");
        assert_eq!(format_amount(1_499.5), "1 500");
    }

    #[test]
    fn signed_formatting_uses_minus_glyph_and_bare_zero() {
        assert_eq!(format_signed_amount(45_000.0), "+45 000");
        assert_eq!(format_signed_amount(-1_200.0), "\u{2212}1 200");
        assert_eq!(format_signed_amount(0.0), "0");
        assert_eq!(format_signed_amount(-0.4), "0");
    }
}
