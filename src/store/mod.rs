//! The period lifecycle store: a synchronous, persisted state container
//! with the same success/error contracts as the remote backend, used as a
//! drop-in substitute in offline/demo mode.
//!
//! The store is the sole mutator of the period collection. Callers receive
//! independent copies, and every successful mutation persists the full
//! collection to the slot before returning.

pub mod migrate;
pub mod seed;
pub mod slot;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::errors::{Result, StoreError};
use crate::metrics::period_metrics;
use crate::period::{find_overlap, ExpenseCategory, Period, PeriodPatch};
use crate::suggest::{suggestions_for, Suggestions};

pub use slot::{FileSlot, MemorySlot, StorageSlot};

/// Result of a successful close operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CloseOutcome {
    pub is_closed: bool,
    pub actual_remaining: i64,
}

/// Result of a successful pin/unpin operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PinOutcome {
    pub is_pinned: bool,
}

pub struct PeriodStore {
    slot: Box<dyn StorageSlot>,
    /// Decoded view of the slot contents; refreshed on every successful
    /// write and replaceable wholesale via [`PeriodStore::reload`].
    periods: Vec<Period>,
}

impl PeriodStore {
    /// Opens the store over a slot, seeding the demo fixture when the slot
    /// has never been written.
    pub fn open(slot: Box<dyn StorageSlot>, seed_demo: bool) -> Result<Self> {
        let mut store = Self {
            slot,
            periods: Vec::new(),
        };
        match store.slot.read()? {
            Some(raw) => {
                store.periods = migrate::normalize_periods(&raw);
            }
            None if seed_demo => {
                store.periods = seed::demo_periods();
                store.persist()?;
                tracing::info!(count = store.periods.len(), "seeded demo periods");
            }
            None => {}
        }
        Ok(store)
    }

    /// Opens the configured file-backed store.
    pub fn open_default(config: &Config) -> Result<Self> {
        Self::open(Box::new(FileSlot::new(config.store_path())), config.seed_demo_data)
    }

    /// Re-reads the slot, discarding the in-memory view. Lets a caller
    /// embedded behind an async boundary treat the persisted slot as the
    /// single source of truth before a conflicting write.
    pub fn reload(&mut self) -> Result<()> {
        self.periods = match self.slot.read()? {
            Some(raw) => migrate::normalize_periods(&raw),
            None => Vec::new(),
        };
        Ok(())
    }

    /// All periods, most recent first. Ties keep insertion order.
    pub fn list(&self) -> Vec<Period> {
        let mut periods = self.periods.clone();
        periods.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        periods
    }

    pub fn get(&self, id: u64) -> Result<Period> {
        self.find(id).cloned()
    }

    pub fn create(&mut self, start: NaiveDate, end: NaiveDate, force: bool) -> Result<Period> {
        if start > end {
            return Err(StoreError::InvalidInput(format!(
                "start date {start} is after end date {end}"
            )));
        }
        if !force {
            self.check_overlap(start, end, None)?;
        }
        let id = self
            .periods
            .iter()
            .map(|period| period.id)
            .max()
            .unwrap_or(0)
            + 1;
        let period = Period::new(id, start, end);
        self.periods.push(period.clone());
        self.persist()?;
        tracing::info!(id, %start, %end, "created period");
        Ok(period)
    }

    /// Replaces any supplied fields wholesale. Date changes re-run the
    /// overlap check against all other periods; line items without a
    /// positive id are assigned the next collection-wide id. Closed
    /// periods reject updates outright.
    pub fn update(&mut self, id: u64, patch: PeriodPatch) -> Result<Period> {
        let index = self.index_of(id)?;
        if self.periods[index].is_closed {
            return Err(StoreError::Closed(id));
        }

        let start = patch.start_date.unwrap_or(self.periods[index].start_date);
        let end = patch.end_date.unwrap_or(self.periods[index].end_date);
        if start > end {
            return Err(StoreError::InvalidInput(format!(
                "start date {start} is after end date {end}"
            )));
        }
        if !patch.force {
            self.check_overlap(start, end, Some(id))?;
        }

        let period = &mut self.periods[index];
        period.start_date = start;
        period.end_date = end;
        if let Some(daily_expenses) = patch.daily_expenses {
            period.daily_expenses = daily_expenses;
        }
        if let Some(unforeseen_allocated) = patch.unforeseen_allocated {
            period.unforeseen_allocated = unforeseen_allocated;
        }
        if let Some(incomes) = patch.incomes {
            period.incomes = incomes;
        }
        if let Some(expenses) = patch.expenses {
            period.expenses = expenses;
        }
        if let Some(external_expenses) = patch.external_expenses {
            period.external_expenses = external_expenses;
        }
        if let Some(unforeseen_expenses) = patch.unforeseen_expenses {
            period.unforeseen_expenses = unforeseen_expenses;
        }

        // Collection-wide counter so item ids never collide across periods.
        let next_item_id = 1 + self
            .periods
            .iter()
            .map(Period::max_item_id)
            .max()
            .unwrap_or(0);
        self.periods[index].assign_item_ids(next_item_id);

        self.persist()?;
        tracing::debug!(id, "updated period");
        Ok(self.periods[index].clone())
    }

    /// Deletes the period if present. Absent ids are not an error, and
    /// nothing is written when the collection is unchanged.
    pub fn remove(&mut self, id: u64) -> Result<()> {
        let before = self.periods.len();
        self.periods.retain(|period| period.id != id);
        if self.periods.len() == before {
            return Ok(());
        }
        self.persist()?;
        tracing::info!(id, "removed period");
        Ok(())
    }

    /// One-way close: requires every day in range to carry an entry, then
    /// freezes the computed remainder.
    pub fn close(&mut self, id: u64) -> Result<CloseOutcome> {
        let index = self.index_of(id)?;
        if self.periods[index].is_closed {
            return Err(StoreError::Closed(id));
        }
        let missing = self.periods[index].missing_days();
        if !missing.is_empty() {
            return Err(StoreError::IncompleteDailyData {
                missing: missing.len(),
            });
        }
        let remaining = period_metrics(&self.periods[index]).actual_remaining;
        let period = &mut self.periods[index];
        period.is_closed = true;
        period.actual_remaining = Some(remaining);
        self.persist()?;
        tracing::info!(id, remaining, "closed period");
        Ok(CloseOutcome {
            is_closed: true,
            actual_remaining: remaining,
        })
    }

    /// Pin exclusivity: unpinning always succeeds; pinning fails while
    /// another period is pinned unless forced, in which case the previous
    /// pin is released in the same write.
    pub fn set_pinned(&mut self, id: u64, pinned: bool, force: bool) -> Result<PinOutcome> {
        let index = self.index_of(id)?;
        if pinned {
            let conflict = self
                .periods
                .iter()
                .find(|period| period.is_pinned && period.id != id)
                .cloned();
            if let Some(other) = conflict {
                if !force {
                    return Err(StoreError::AlreadyPinned {
                        id: other.id,
                        start_date: other.start_date,
                        end_date: other.end_date,
                    });
                }
                for period in self.periods.iter_mut() {
                    period.is_pinned = false;
                }
                tracing::info!(unpinned = other.id, "force-released previous pin");
            }
        }
        self.periods[index].is_pinned = pinned;
        self.persist()?;
        tracing::debug!(id, pinned, "pin state changed");
        Ok(PinOutcome { is_pinned: pinned })
    }

    /// Name suggestions for one expense category of the given period.
    pub fn suggestions(&self, id: u64, category: ExpenseCategory) -> Result<Suggestions> {
        self.find(id)?;
        Ok(suggestions_for(&self.periods, id, category))
    }

    fn find(&self, id: u64) -> Result<&Period> {
        self.periods
            .iter()
            .find(|period| period.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn index_of(&self, id: u64) -> Result<usize> {
        self.periods
            .iter()
            .position(|period| period.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn check_overlap(&self, start: NaiveDate, end: NaiveDate, exclude: Option<u64>) -> Result<()> {
        if let Some(other) = find_overlap(&self.periods, start, end, exclude) {
            return Err(StoreError::Overlap {
                id: other.id,
                start_date: other.start_date,
                end_date: other.end_date,
            });
        }
        Ok(())
    }

    /// Serializes the whole collection into the slot. Runs before every
    /// mutating operation returns, so a reload observes committed state.
    /// When the write fails, the in-memory view is restored from the slot
    /// so the failed mutation cannot ride along with a later commit.
    fn persist(&mut self) -> Result<()> {
        let outcome = serde_json::to_string_pretty(&self.periods)
            .map_err(StoreError::from)
            .and_then(|json| self.slot.write(&json));
        if let Err(err) = outcome {
            if let Err(reload_err) = self.reload() {
                tracing::error!(%reload_err, "could not restore committed view after failed write");
            }
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn empty_store() -> PeriodStore {
        PeriodStore::open(Box::new(MemorySlot::new()), false).expect("open store")
    }

    #[test]
    fn ids_are_monotonic_max_plus_one() {
        let mut store = empty_store();
        let first = store.create(d(2025, 1, 1), d(2025, 1, 31), false).unwrap();
        let second = store.create(d(2025, 2, 1), d(2025, 2, 28), false).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        store.remove(1).unwrap();
        let third = store.create(d(2025, 3, 1), d(2025, 3, 31), false).unwrap();
        assert_eq!(third.id, 3);
    }

    #[test]
    fn list_sorts_by_start_date_descending() {
        let mut store = empty_store();
        store.create(d(2025, 1, 1), d(2025, 1, 31), false).unwrap();
        store.create(d(2025, 3, 1), d(2025, 3, 31), false).unwrap();
        store.create(d(2025, 2, 1), d(2025, 2, 28), false).unwrap();
        let ids: Vec<u64> = store.list().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn create_rejects_inverted_range() {
        let mut store = empty_store();
        let err = store
            .create(d(2025, 2, 1), d(2025, 1, 1), false)
            .unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn first_open_seeds_demo_data_once() {
        let slot = MemorySlot::new();
        let raw = {
            let store = PeriodStore::open(Box::new(slot), true).unwrap();
            assert!(!store.list().is_empty());
            store.slot.read().unwrap().unwrap()
        };
        // A second open over the committed payload must not re-seed.
        let reopened = PeriodStore::open(Box::new(MemorySlot::with_contents(raw)), true).unwrap();
        assert_eq!(reopened.list().len(), seed::demo_periods().len());
    }

    #[test]
    fn closed_period_rejects_updates() {
        let mut store = empty_store();
        let period = store.create(d(2025, 3, 1), d(2025, 3, 2), false).unwrap();
        let mut daily = std::collections::BTreeMap::new();
        daily.insert("2025-03-01".to_string(), 10);
        daily.insert("2025-03-02".to_string(), 0);
        store
            .update(
                period.id,
                PeriodPatch {
                    daily_expenses: Some(daily),
                    ..PeriodPatch::default()
                },
            )
            .unwrap();
        store.close(period.id).unwrap();
        let err = store.update(period.id, PeriodPatch::default()).unwrap_err();
        assert_eq!(err.status(), 423);
        let err = store.close(period.id).unwrap_err();
        assert_eq!(err.status(), 423);
    }

    #[test]
    fn item_ids_never_collide_across_periods() {
        let mut store = empty_store();
        let first = store.create(d(2025, 1, 1), d(2025, 1, 31), false).unwrap();
        let second = store.create(d(2025, 2, 1), d(2025, 2, 28), false).unwrap();
        let patch = |name: &str| PeriodPatch {
            incomes: Some(vec![crate::period::MoneyItem {
                id: 0,
                name: name.into(),
                amount: 100,
            }]),
            ..PeriodPatch::default()
        };
        let updated_first = store.update(first.id, patch("Salary")).unwrap();
        let updated_second = store.update(second.id, patch("Salary")).unwrap();
        assert_ne!(updated_first.incomes[0].id, updated_second.incomes[0].id);
        assert!(updated_second.incomes[0].id > updated_first.incomes[0].id);
    }
}
