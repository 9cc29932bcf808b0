use std::fmt::Write;

use crate::commands::{country_name, month_arg};
use crate::error::{AppError, AppResult};
use crate::models::Event;
use crate::services::overlay::Viewport;
use crate::AppState;

const WEEKDAYS: &str = " Su  Mo  Tu  We  Th  Fr  Sa";

/// Render the selected (or given) month as a week grid. Days with visible
/// events carry a `*`; padding days from adjacent months are bracketed.
pub fn month(state: &mut AppState, month: Option<u32>) -> AppResult<String> {
    if let Some(month) = month {
        state.store.calendar_mut().set_month(month_arg(month)?)?;
    }

    let calendar = state.store.calendar();
    let current = calendar.current_month();
    let grid = calendar.month(current)?;

    let mut out = String::new();
    let _ = writeln!(out, "{}", grid.name);
    let _ = writeln!(out, "{}", WEEKDAYS);
    for (index, day) in grid.dates.iter().enumerate() {
        let cell = if day.day_is_in_this_month {
            let visible = state.store.events_for_day(index, &state.countries)?;
            let mark = if visible.is_empty() { ' ' } else { '*' };
            format!("{:>3}{}", day.number, mark)
        } else {
            format!("({:>2})", day.number)
        };
        out.push_str(&cell);
        if index % 7 == 6 {
            out.push('\n');
        }
    }
    Ok(out)
}

/// Select a day and list its visible events.
pub fn day(state: &mut AppState, month: Option<u32>, day: Option<u8>) -> AppResult<String> {
    if let Some(month) = month {
        state.store.calendar_mut().set_month(month_arg(month)?)?;
    }
    let calendar = state.store.calendar_mut();
    let day = day.unwrap_or_else(|| calendar.current_day());
    let index = calendar.day_index(calendar.current_month(), day)?;
    calendar.change_day(index)?;

    let name = calendar.month(calendar.current_month())?.name.clone();
    let events = state.store.events_for_day(index, &state.countries)?;

    let mut out = String::new();
    let _ = writeln!(out, "{} {}", name, day);
    if events.is_empty() {
        out.push_str("  No events\n");
    }
    for event in &events {
        out.push_str(&event_line(event));
    }
    Ok(out)
}

pub fn countries(state: &AppState) -> String {
    let mut out = String::new();
    for country in state.countries.list() {
        let mark = if country.selected { 'x' } else { ' ' };
        let _ = writeln!(out, "[{}] {} {}", mark, country.id, country.name);
    }
    out
}

/// Open the details panel for one event as if it had been clicked at
/// `(x, y)` in a window of the given size.
pub fn show(state: &mut AppState, id: &str, x: f64, y: f64, viewport: Viewport) -> AppResult<String> {
    let event = state
        .store
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("event {}", id)))?;
    let position = state.details.show(event.clone(), x, y, viewport);

    let mut out = event_line(&event);
    if !event.description.is_empty() {
        let _ = writeln!(out, "    {}", event.description);
    }
    if let Some(source) = &event.source {
        let _ = writeln!(out, "    Source: {}", source);
    }
    let _ = writeln!(
        out,
        "    Panel at {:.1}% from top, {:.1}% from left",
        position.top_percent, position.left_percent
    );
    if state.details.is_owned_by(state.session.user()) {
        out.push_str("    You created this event and can edit it\n");
    }
    state.details.hide();
    Ok(out)
}

fn event_line(event: &Event) -> String {
    let holiday = if event.holiday { " (holiday)" } else { "" };
    format!(
        "  [{}] {}{} <{}>\n",
        country_name(event.country),
        event.name,
        holiday,
        event.id
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::config::Config;
    use crate::models::Month;
    use crate::services::api::testing::FakeApi;
    use crate::services::countries::CountryFilter;
    use crate::services::token_store::MemoryTokenStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 21).unwrap()
    }

    fn nowruz() -> Event {
        Event {
            id: "e1".to_string(),
            name: "Nowruz".to_string(),
            description: "Persian new year".to_string(),
            country: 0,
            month: 2,
            day_number: 20,
            day_index: 0,
            holiday: true,
            source: Some("https://example.com/nowruz".to_string()),
            user_id: "someone".to_string(),
        }
    }

    async fn state() -> AppState {
        let api = Arc::new(
            FakeApi::new()
                .with_months(Month::year(2024))
                .with_events(vec![nowruz()]),
        );
        let mut state = AppState::new(
            Config::default(),
            api,
            Arc::new(MemoryTokenStore::new()),
            today(),
        );
        state.load(today()).await;
        state
    }

    #[tokio::test]
    async fn month_grid_marks_days_with_events() {
        let mut state = state().await;
        let out = month(&mut state, None).unwrap();
        assert!(out.starts_with("March\n"));
        assert!(out.contains(" 20*"));
        assert!(out.contains(" 21 "));
        // five February days lead the grid
        assert!(out.contains("(25)"));
    }

    #[tokio::test]
    async fn hidden_country_removes_the_mark() {
        let mut state = state().await;
        state.countries = CountryFilter::with_hidden(&[0]);
        let out = month(&mut state, Some(3)).unwrap();
        assert!(!out.contains('*'));
    }

    #[tokio::test]
    async fn day_lists_visible_events() {
        let mut state = state().await;
        let out = day(&mut state, Some(3), Some(20)).unwrap();
        assert!(out.contains("[Iran] Nowruz (holiday) <e1>"));
        assert_eq!(state.store.calendar().current_day(), 20);

        let out = day(&mut state, None, Some(22)).unwrap();
        assert!(out.contains("No events"));
    }

    #[tokio::test]
    async fn day_outside_month_fails() {
        let mut state = state().await;
        assert!(day(&mut state, Some(2), Some(30)).is_err());
        assert!(month(&mut state, Some(13)).is_err());
    }

    #[tokio::test]
    async fn show_reports_position_and_hides_again() {
        let mut state = state().await;
        let viewport = Viewport {
            width: 1000.0,
            height: 1000.0,
        };
        let out = show(&mut state, "e1", 750.0, 100.0, viewport).unwrap();
        assert!(out.contains("10.0% from top, 55.0% from left"));
        assert!(out.contains("Source: https://example.com/nowruz"));
        assert!(!out.contains("can edit"));
        assert!(!state.details.is_visible());
    }

    #[tokio::test]
    async fn countries_lists_selection() {
        let mut state = state().await;
        state.countries.toggle(2).unwrap();
        let out = countries(&state);
        assert!(out.contains("[x] 0 Iran"));
        assert!(out.contains("[ ] 2 Ukraine"));
    }
}
