//! Demo fixture written on first load so the offline/onboarding mode has
//! something to show before the user creates a period of their own.

use chrono::NaiveDate;
use once_cell::sync::Lazy;

use crate::dates::date_key;
use crate::metrics::period_metrics;
use crate::period::{BudgetedItem, MoneyItem, Period};

static DEMO_PERIODS: Lazy<Vec<Period>> = Lazy::new(build_demo_periods);

/// A fixed two-period fixture: one closed historical month and one open,
/// pinned month with partially filled daily data.
pub fn demo_periods() -> Vec<Period> {
    DEMO_PERIODS.clone()
}

fn build_demo_periods() -> Vec<Period> {
    vec![closed_month(), open_month()]
}

fn closed_month() -> Period {
    let mut period = Period::new(1, date(2025, 5, 1), date(2025, 5, 31));
    period.incomes.push(money(1, "Salary", 95_000));
    period.expenses.push(budgeted(2, "Rent", 30_000, 30_000));
    period.expenses.push(budgeted(3, "Utilities", 6_000, 5_400));
    period
        .external_expenses
        .push(money(4, "Vacation fund", 10_000));
    period.unforeseen_allocated = 5_000;
    period
        .unforeseen_expenses
        .push(budgeted(5, "Shoe repair", 1_200, 1_200));
    let mut day = period.start_date;
    let mut spend = 900;
    while day <= period.end_date {
        period.daily_expenses.insert(date_key(day), spend);
        spend = if spend == 900 { 1_400 } else { 900 };
        day += chrono::Duration::days(1);
    }
    period.is_closed = true;
    period.actual_remaining = Some(period_metrics(&period).actual_remaining);
    period
}

fn open_month() -> Period {
    let mut period = Period::new(2, date(2025, 6, 1), date(2025, 6, 30));
    period.is_pinned = true;
    period.incomes.push(money(6, "Salary", 95_000));
    period.incomes.push(money(7, "Freelance", 12_000));
    period.expenses.push(budgeted(8, "Rent", 30_000, 30_000));
    period.expenses.push(budgeted(9, "Utilities", 6_000, 6_000));
    period.unforeseen_allocated = 5_000;
    for (offset, amount) in [(0, 1_100), (1, 0), (2, 2_350)] {
        let day = period.start_date + chrono::Duration::days(offset);
        period.daily_expenses.insert(date_key(day), amount);
    }
    period
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn money(id: u64, name: &str, amount: i64) -> MoneyItem {
    MoneyItem {
        id,
        name: name.into(),
        amount,
    }
}

fn budgeted(id: u64, name: &str, planned: i64, actual: i64) -> BudgetedItem {
    BudgetedItem {
        id,
        name: name.into(),
        planned_amount: planned,
        actual_amount: actual,
    }
}
