use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{Event, EventFields, EventPayload, User};
use crate::services::api::CalendarApi;
use crate::services::calendar::CalendarIndex;
use crate::services::countries::CountryFilter;
use crate::services::validation::validate_event;

/// The fetched event collection together with the calendar index that
/// lists each event under its day. Every mutation updates both.
pub struct EventStore {
    api: Arc<dyn CalendarApi>,
    events: Vec<Event>,
    calendar: CalendarIndex,
}

impl EventStore {
    /// Empty store; no grids are loaded until `fetch_months`.
    pub fn new(api: Arc<dyn CalendarApi>, today: NaiveDate) -> Self {
        Self {
            api,
            events: Vec::new(),
            calendar: CalendarIndex::new(Vec::new(), today),
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn calendar(&self) -> &CalendarIndex {
        &self.calendar
    }

    pub fn calendar_mut(&mut self) -> &mut CalendarIndex {
        &mut self.calendar
    }

    pub fn events_owned_by(&self, user: &User) -> Vec<&Event> {
        if !user.is_logged_in() {
            return Vec::new();
        }
        self.events.iter().filter(|e| e.user_id == user.id).collect()
    }

    /// Visible events on day `index` of the current month.
    pub fn events_for_day(&self, index: usize, filter: &CountryFilter) -> AppResult<Vec<Event>> {
        self.calendar.events_for_day(index, &self.events, filter)
    }

    /// Load the month grids. On failure the loaded grids are kept; if none
    /// were loaded yet, grids for the current year are built locally.
    pub async fn fetch_months(&mut self, today: NaiveDate) -> AppResult<()> {
        match self.api.months().await {
            Ok(months) if !months.is_empty() => {
                self.calendar.replace_months(months);
                self.calendar.rebuild(&mut self.events);
                Ok(())
            }
            Ok(_) => {
                warn!("Server sent no months, using local calendar");
                self.use_local_months(today);
                Ok(())
            }
            Err(e) => {
                error!("Server did not respond for months: {}", e);
                if !self.calendar.is_loaded() {
                    self.use_local_months(today);
                }
                Err(e)
            }
        }
    }

    fn use_local_months(&mut self, today: NaiveDate) {
        self.calendar = CalendarIndex::for_year_of(today);
        self.calendar.rebuild(&mut self.events);
    }

    /// Replace the collection with the server's. A failed fetch is logged and
    /// the previous collection stays in place.
    pub async fn fetch_all(&mut self) -> AppResult<&[Event]> {
        match self.api.events().await {
            Ok(events) => {
                self.events = dedupe_by_id(events);
                self.calendar.rebuild(&mut self.events);
                info!("Loaded {} events", self.events.len());
                Ok(&self.events)
            }
            Err(e) => {
                error!("Server did not respond to events: {}", e);
                Err(e)
            }
        }
    }

    /// Validate, submit and index a new event owned by `owner`.
    pub async fn create(
        &mut self,
        fields: &EventFields,
        owner: &User,
        token: Option<&str>,
    ) -> AppResult<Event> {
        let payload = self.prepare(fields, None, &owner.id)?;

        let id = self.api.add_event(token, &payload).await.map_err(|e| {
            error!("Failed to add event: {}", e);
            e
        })?;

        if self.get(&id).is_some() {
            error!("Server assigned id {} which is already loaded", id);
            return Err(AppError::Internal(anyhow::anyhow!(
                "server assigned duplicate event id {}",
                id
            )));
        }

        let event = payload.into_event(id);
        if let Err(e) = self.calendar.attach(event.slot(), &event.id) {
            warn!("Could not index new event {}: {}", event.id, e);
        }
        self.events.push(event.clone());
        info!("Created event {} on {}/{}", event.id, event.month, event.day_number);
        Ok(event)
    }

    /// Validate and submit new values for `id`. When the date changes the id
    /// moves from the old day's list to the new one.
    pub async fn update(
        &mut self,
        id: &str,
        fields: &EventFields,
        token: Option<&str>,
    ) -> AppResult<Event> {
        let position = self
            .events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| AppError::NotFound(format!("event {}", id)))?;
        let existing = self.events[position].clone();

        let payload = self.prepare(fields, Some(id), &existing.user_id)?;

        self.api.update_event(token, &payload).await.map_err(|e| {
            error!("Failed to update event {}: {}", id, e);
            e
        })?;

        let updated = payload.into_event(id.to_string());
        if updated.slot() != existing.slot() {
            self.calendar.relocate(existing.slot(), updated.slot(), id)?;
            info!(
                "Moved event {} from {:?} to {:?}",
                id,
                existing.slot(),
                updated.slot()
            );
        }
        self.events[position] = updated.clone();
        Ok(updated)
    }

    /// Remove locally, then ask the server to delete. The local removal is
    /// kept even when the server call fails; the error is still returned.
    pub async fn delete(&mut self, id: &str, token: Option<&str>) -> AppResult<Event> {
        let position = self
            .events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| AppError::NotFound(format!("event {}", id)))?;
        let removed = self.events.remove(position);
        if !self.calendar.detach(removed.slot(), id) {
            self.calendar.purge(id);
        }

        if let Err(e) = self.api.remove_event(token, id).await {
            warn!(
                "Event {} removed locally but the server delete failed: {}",
                id, e
            );
            return Err(e);
        }
        info!("Deleted event {}", id);
        Ok(removed)
    }

    /// Check `fields` and resolve the grid slot, producing the wire payload.
    fn prepare(
        &self,
        fields: &EventFields,
        id: Option<&str>,
        user_id: &str,
    ) -> AppResult<EventPayload> {
        let mut errors = validate_event(fields);
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let month = fields.month as usize;
        let day_number = (fields.day + 1) as u8;
        let day_index = match self.calendar.day_index(month, day_number) {
            Ok(index) => index,
            Err(_) => {
                let month_name = self
                    .calendar
                    .month(month)
                    .map(|m| m.name.clone())
                    .unwrap_or_default();
                errors.push(
                    "day",
                    format!("\"day\" {} does not exist in {}", day_number, month_name),
                );
                return Err(errors.into());
            }
        };

        Ok(EventPayload {
            id: id.map(str::to_string),
            name: fields.name.trim().to_string(),
            description: fields.description.clone(),
            country: fields.country as u8,
            month: month as u8,
            day_number,
            day_index,
            holiday: fields.holiday,
            source: fields
                .source
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            user_id: user_id.to_string(),
        })
    }
}

/// Keep one event per id, the last one the server listed.
fn dedupe_by_id(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Event> = events
        .into_iter()
        .rev()
        .filter(|e| {
            let first = seen.insert(e.id.clone());
            if !first {
                warn!("Dropping earlier copy of duplicate event {}", e.id);
            }
            first
        })
        .collect();
    kept.reverse();
    kept
}
