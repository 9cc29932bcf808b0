use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::models::{Day, Event, Month};
use crate::services::countries::CountryFilter;

/// Leading padding days of the grid's first week, minus one.
///
/// Adding the result to a one-based day number gives the day's index in
/// `month.dates`. A grid that starts on the 1st yields -1.
pub fn offset_of_month(month: &Month) -> isize {
    let leading = month
        .dates
        .iter()
        .take(7)
        .take_while(|d| !d.day_is_in_this_month)
        .count();
    leading as isize - 1
}

/// Month grids, the per-day event index and the current selection.
#[derive(Debug, Clone)]
pub struct CalendarIndex {
    months: Vec<Month>,
    current_month: usize,
    current_day: u8,
}

impl CalendarIndex {
    /// Index over `months`, selecting `today`.
    pub fn new(months: Vec<Month>, today: NaiveDate) -> Self {
        Self {
            months,
            current_month: today.month0() as usize,
            current_day: today.day() as u8,
        }
    }

    /// Grids built locally for `today`'s year.
    pub fn for_year_of(today: NaiveDate) -> Self {
        Self::new(Month::year(today.year()), today)
    }

    pub fn is_loaded(&self) -> bool {
        !self.months.is_empty()
    }

    pub fn months(&self) -> &[Month] {
        &self.months
    }

    pub fn replace_months(&mut self, months: Vec<Month>) {
        self.months = months;
        if self.current_month >= self.months.len() {
            self.current_month = 0;
        }
    }

    pub fn month(&self, month: usize) -> AppResult<&Month> {
        self.months
            .get(month)
            .ok_or_else(|| AppError::NotFound(format!("month {} is not loaded", month)))
    }

    pub fn current_month(&self) -> usize {
        self.current_month
    }

    pub fn current_day(&self) -> u8 {
        self.current_day
    }

    /// Grid index of the selected day, if it exists in the current month.
    pub fn current_day_index(&self) -> Option<usize> {
        self.day_index(self.current_month, self.current_day).ok()
    }

    pub fn set_month(&mut self, month: usize) -> AppResult<()> {
        self.month(month)?;
        self.current_month = month;
        Ok(())
    }

    pub fn next_month(&mut self) {
        if self.is_loaded() {
            self.current_month = (self.current_month + 1) % self.months.len();
        }
    }

    pub fn previous_month(&mut self) {
        if self.is_loaded() {
            let count = self.months.len();
            self.current_month = (self.current_month + count - 1) % count;
        }
    }

    /// Select the day at `index` of the current month. Padding days from the
    /// adjacent months are ignored; returns whether the selection changed.
    pub fn change_day(&mut self, index: usize) -> AppResult<bool> {
        let day = self.day_object(index)?;
        if !day.day_is_in_this_month {
            return Ok(false);
        }
        self.current_day = day.number;
        Ok(true)
    }

    /// Grid index of `day_number` in `month`. Fails when the day does not
    /// exist in that month.
    pub fn day_index(&self, month: usize, day_number: u8) -> AppResult<usize> {
        let grid = self.month(month)?;
        let index = day_number as isize + offset_of_month(grid);
        let missing = || AppError::NotFound(format!("day {} of month {}", day_number, month));

        let index = usize::try_from(index).map_err(|_| missing())?;
        match grid.dates.get(index) {
            Some(day) if day.day_is_in_this_month && day.number == day_number => Ok(index),
            _ => Err(missing()),
        }
    }

    /// Day at `index` of the current month.
    pub fn day_object(&self, index: usize) -> AppResult<&Day> {
        self.day_in(self.current_month, index)
    }

    pub fn day_in(&self, month: usize, index: usize) -> AppResult<&Day> {
        let grid = self.month(month)?;
        grid.dates.get(index).ok_or_else(|| {
            AppError::NotFound(format!(
                "day index {} is out of range for month {} ({} days)",
                index,
                month,
                grid.dates.len()
            ))
        })
    }

    fn day_mut(&mut self, (month, index): (usize, usize)) -> AppResult<&mut Day> {
        let grid = self
            .months
            .get_mut(month)
            .ok_or_else(|| AppError::NotFound(format!("month {} is not loaded", month)))?;
        let len = grid.dates.len();
        grid.dates.get_mut(index).ok_or_else(|| {
            AppError::NotFound(format!(
                "day index {} is out of range for month {} ({} days)",
                index, month, len
            ))
        })
    }

    /// Events listed on the current month's day `index`, skipping ids not in
    /// `events` and countries the filter hides.
    pub fn events_for_day(
        &self,
        index: usize,
        events: &[Event],
        filter: &CountryFilter,
    ) -> AppResult<Vec<Event>> {
        let day = self.day_object(index)?;
        Ok(day
            .events
            .iter()
            .filter_map(|id| events.iter().find(|e| &e.id == id))
            .filter(|e| filter.is_selected(e.country))
            .cloned()
            .collect())
    }

    pub fn attach(&mut self, slot: (usize, usize), id: &str) -> AppResult<()> {
        let day = self.day_mut(slot)?;
        if !day.events.iter().any(|e| e == id) {
            day.events.push(id.to_string());
        }
        Ok(())
    }

    /// Returns whether `id` was listed on that day.
    pub fn detach(&mut self, slot: (usize, usize), id: &str) -> bool {
        match self.day_mut(slot) {
            Ok(day) => {
                let before = day.events.len();
                day.events.retain(|e| e != id);
                day.events.len() != before
            }
            Err(_) => false,
        }
    }

    /// Move `id` between two days. The target is checked before the source
    /// is touched, so a failed move leaves the index unchanged.
    pub fn relocate(&mut self, from: (usize, usize), to: (usize, usize), id: &str) -> AppResult<()> {
        if from == to {
            return Ok(());
        }
        self.day_mut(to)?;
        self.detach(from, id);
        self.attach(to, id)
    }

    /// Remove `id` from every day, returning how many lists referenced it.
    pub fn purge(&mut self, id: &str) -> usize {
        let mut removed = 0;
        for day in self.months.iter_mut().flat_map(|m| m.dates.iter_mut()) {
            let before = day.events.len();
            day.events.retain(|e| e != id);
            removed += before - day.events.len();
        }
        removed
    }

    /// Number of day lists that mention `id`.
    pub fn references(&self, id: &str) -> usize {
        self.months
            .iter()
            .flat_map(|m| m.dates.iter())
            .filter(|d| d.events.iter().any(|e| e == id))
            .count()
    }

    /// Re-derive every day list from `events`, correcting each event's
    /// `day_index` against the grid. Events whose date is not in the grid are
    /// left out of the index.
    pub fn rebuild(&mut self, events: &mut [Event]) {
        for day in self.months.iter_mut().flat_map(|m| m.dates.iter_mut()) {
            day.events.clear();
        }

        for event in events.iter_mut() {
            let index = match self.day_index(event.month as usize, event.day_number) {
                Ok(index) => index,
                Err(e) => {
                    warn!("Event {} has no day in the calendar: {}", event.id, e);
                    continue;
                }
            };
            if event.day_index != index {
                warn!(
                    "Event {} had day index {}, re-derived as {}",
                    event.id, event.day_index, index
                );
                event.day_index = index;
            }
            if let Ok(day) = self.day_mut((event.month as usize, index)) {
                day.events.push(event.id.clone());
            }
        }
    }
}
