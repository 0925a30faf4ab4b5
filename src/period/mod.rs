//! The `Period` aggregate and its validation rules: overlap detection, the
//! close-completeness gate, pin exclusivity, and line-item identity.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dates::date_key;

/// A simple named amount: incomes and external (off-income) expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyItem {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: i64,
}

/// A planned-vs-actual expense line: mandatory and unforeseen expenses.
///
/// `actual_amount` defaults to `planned_amount` until explicitly edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetedItem {
    pub id: u64,
    pub name: String,
    pub planned_amount: i64,
    pub actual_amount: i64,
}

#[derive(Deserialize)]
struct RawBudgetedItem {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    planned_amount: i64,
    #[serde(default)]
    actual_amount: Option<i64>,
}

impl<'de> Deserialize<'de> for BudgetedItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawBudgetedItem::deserialize(deserializer)?;
        Ok(BudgetedItem {
            id: raw.id,
            name: raw.name,
            actual_amount: raw.actual_amount.unwrap_or(raw.planned_amount),
            planned_amount: raw.planned_amount,
        })
    }
}

/// The central aggregate: a user-defined date range with its own ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub actual_remaining: Option<i64>,
    /// ISO date key -> recorded spend. An absent key marks an unfilled day;
    /// an explicit 0 counts as filled.
    #[serde(default)]
    pub daily_expenses: BTreeMap<String, i64>,
    #[serde(default)]
    pub unforeseen_allocated: i64,
    #[serde(default)]
    pub incomes: Vec<MoneyItem>,
    #[serde(default)]
    pub expenses: Vec<BudgetedItem>,
    #[serde(default)]
    pub external_expenses: Vec<MoneyItem>,
    #[serde(default)]
    pub unforeseen_expenses: Vec<BudgetedItem>,
}

impl Period {
    pub fn new(id: u64, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id,
            start_date,
            end_date,
            is_pinned: false,
            is_closed: false,
            actual_remaining: None,
            daily_expenses: BTreeMap::new(),
            unforeseen_allocated: 0,
            incomes: Vec::new(),
            expenses: Vec::new(),
            external_expenses: Vec::new(),
            unforeseen_expenses: Vec::new(),
        }
    }

    /// Days in the range without a daily-expense entry. Empty means the
    /// close precondition is satisfied.
    pub fn missing_days(&self) -> Vec<NaiveDate> {
        let mut missing = Vec::new();
        let mut day = self.start_date;
        while day <= self.end_date {
            if !self.daily_expenses.contains_key(&date_key(day)) {
                missing.push(day);
            }
            day += Duration::days(1);
        }
        missing
    }

    pub fn is_daily_complete(&self) -> bool {
        self.missing_days().is_empty()
    }

    /// Overlap on the half-open serial comparison:
    /// `a.start < b.end && a.end > b.start`. Periods sharing only a boundary
    /// day do not overlap.
    pub fn overlaps(&self, other: &Period) -> bool {
        ranges_overlap(self.start_date, self.end_date, other.start_date, other.end_date)
    }

    fn item_names(items: &[MoneyItem]) -> Vec<&str> {
        items.iter().map(|item| item.name.as_str()).collect()
    }

    fn budgeted_names(items: &[BudgetedItem]) -> Vec<&str> {
        items.iter().map(|item| item.name.as_str()).collect()
    }

    /// Line-item names for one expense category.
    pub fn category_names(&self, category: ExpenseCategory) -> Vec<&str> {
        match category {
            ExpenseCategory::Income => Self::item_names(&self.incomes),
            ExpenseCategory::Mandatory => Self::budgeted_names(&self.expenses),
            ExpenseCategory::External => Self::item_names(&self.external_expenses),
            ExpenseCategory::Unforeseen => Self::budgeted_names(&self.unforeseen_expenses),
        }
    }

    /// Largest line-item id across all four collections.
    pub fn max_item_id(&self) -> u64 {
        let money = self
            .incomes
            .iter()
            .chain(&self.external_expenses)
            .map(|item| item.id);
        let budgeted = self
            .expenses
            .iter()
            .chain(&self.unforeseen_expenses)
            .map(|item| item.id);
        money.chain(budgeted).max().unwrap_or(0)
    }

    /// Assigns the next counter value to every line item lacking a positive
    /// id. Returns the counter after the pass.
    pub fn assign_item_ids(&mut self, mut next_id: u64) -> u64 {
        for item in self.incomes.iter_mut().chain(self.external_expenses.iter_mut()) {
            if item.id == 0 {
                item.id = next_id;
                next_id += 1;
            }
        }
        for item in self.expenses.iter_mut().chain(self.unforeseen_expenses.iter_mut()) {
            if item.id == 0 {
                item.id = next_id;
                next_id += 1;
            }
        }
        next_id
    }
}

/// Overlap predicate on typed dates, same formula as the serial comparison.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Finds a period conflicting with the candidate range, skipping
/// `exclude_id` so edits never collide with themselves.
pub fn find_overlap(
    periods: &[Period],
    start: NaiveDate,
    end: NaiveDate,
    exclude_id: Option<u64>,
) -> Option<&Period> {
    periods.iter().find(|period| {
        Some(period.id) != exclude_id
            && ranges_overlap(start, end, period.start_date, period.end_date)
    })
}

/// The four line-item collections suggestions are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseCategory {
    Income,
    Mandatory,
    External,
    Unforeseen,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Income => "income",
            ExpenseCategory::Mandatory => "mandatory",
            ExpenseCategory::External => "external",
            ExpenseCategory::Unforeseen => "unforeseen",
        }
    }
}

impl FromStr for ExpenseCategory {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "income" => Ok(ExpenseCategory::Income),
            "mandatory" => Ok(ExpenseCategory::Mandatory),
            "external" => Ok(ExpenseCategory::External),
            "unforeseen" => Ok(ExpenseCategory::Unforeseen),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown expense category `{}`", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

/// Partial update payload for the store's `update` operation. Supplied
/// child lists replace the stored ones wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodPatch {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub daily_expenses: Option<BTreeMap<String, i64>>,
    #[serde(default)]
    pub unforeseen_allocated: Option<i64>,
    #[serde(default)]
    pub incomes: Option<Vec<MoneyItem>>,
    #[serde(default)]
    pub expenses: Option<Vec<BudgetedItem>>,
    #[serde(default)]
    pub external_expenses: Option<Vec<MoneyItem>>,
    #[serde(default)]
    pub unforeseen_expenses: Option<Vec<BudgetedItem>>,
    #[serde(default)]
    pub force: bool,
}
