use crate::commands::country_name;
use crate::error::{AppError, AppResult};
use crate::models::{Event, EventFields};
use crate::AppState;

/// Event values as given on the command line. Month and day are one-based
/// here; `None` keeps the current value when editing.
#[derive(Debug, Clone, Default)]
pub struct EventInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub country: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub holiday: Option<bool>,
    pub source: Option<String>,
}

impl EventInput {
    /// Overlay the given values on `fields`.
    pub fn apply(self, mut fields: EventFields) -> EventFields {
        if let Some(name) = self.name {
            fields.name = name;
        }
        if let Some(description) = self.description {
            fields.description = description;
        }
        if let Some(country) = self.country {
            fields.country = country;
        }
        if let Some(month) = self.month {
            fields.month = month - 1;
        }
        if let Some(day) = self.day {
            fields.day = day - 1;
        }
        if let Some(holiday) = self.holiday {
            fields.holiday = holiday;
        }
        if let Some(source) = self.source {
            fields.source = Some(source);
        }
        fields
    }
}

pub async fn add(state: &mut AppState, input: EventInput) -> AppResult<String> {
    let token = state.session.token();
    let fields = input.apply(EventFields::default());
    let event = state
        .store
        .create(&fields, state.session.user(), token.as_deref())
        .await?;
    state.session.track_event(&event.id);
    Ok(format!(
        "Added {} [{}] on {}/{} <{}>",
        event.name,
        country_name(event.country),
        event.month + 1,
        event.day_number,
        event.id
    ))
}

/// Open the editor for one of the user's own events, apply the changes and
/// submit them.
pub async fn edit(state: &mut AppState, id: &str, input: EventInput) -> AppResult<String> {
    let event = owned_event(state, id)?;
    state.editor.open(event.clone());

    let fields = input.apply(EventFields::from(&event));
    let token = state.session.token();
    let result = state.store.update(id, &fields, token.as_deref()).await;
    state.editor.hide();

    let updated = result?;
    Ok(format!(
        "Updated {} [{}] on {}/{}",
        updated.name,
        country_name(updated.country),
        updated.month + 1,
        updated.day_number
    ))
}

pub async fn remove(state: &mut AppState, id: &str) -> AppResult<String> {
    owned_event(state, id)?;
    let token = state.session.token();
    let removed = state.store.delete(id, token.as_deref()).await;
    // the local copy is gone even if the server call failed
    state.session.forget_event(id);
    let removed = removed?;
    Ok(format!("Removed {}", removed.name))
}

fn owned_event(state: &AppState, id: &str) -> AppResult<Event> {
    if !state.session.is_logged_in() {
        return Err(AppError::Unauthorized);
    }
    let event = state
        .store
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("event {}", id)))?;
    if event.user_id != state.session.user().id {
        return Err(AppError::Unauthorized);
    }
    Ok(event.clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::config::Config;
    use crate::models::Month;
    use crate::services::api::testing::FakeApi;
    use crate::services::token_store::MemoryTokenStore;
    use crate::services::validation::SignupForm;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    fn foreign_event() -> Event {
        Event {
            id: "theirs".to_string(),
            name: "Hangul Day".to_string(),
            description: String::new(),
            country: 4,
            month: 9,
            day_number: 9,
            day_index: 0,
            holiday: true,
            source: None,
            user_id: "someone-else".to_string(),
        }
    }

    async fn logged_in() -> (AppState, Arc<FakeApi>) {
        let api = Arc::new(
            FakeApi::new()
                .with_months(Month::year(2024))
                .with_events(vec![foreign_event()]),
        );
        let mut config = Config::default();
        config.session.bcrypt_cost = 4;
        let mut state = AppState::new(config, api.clone(), Arc::new(MemoryTokenStore::new()), today());
        state.load(today()).await;
        let form = SignupForm {
            email: "mei@example.com".to_string(),
            username: "mei".to_string(),
            password: "lantern88".to_string(),
            confirm_password: "lantern88".to_string(),
        };
        assert_ok!(state.session.signup(&form).await);
        (state, api)
    }

    fn input(name: &str, country: i64, month: i64, day: i64) -> EventInput {
        EventInput {
            name: Some(name.to_string()),
            country: Some(country),
            month: Some(month),
            day: Some(day),
            holiday: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn input_converts_one_based_dates() {
        let fields = input("Qingming", 3, 4, 4).apply(EventFields::default());
        assert_eq!(fields.month, 3);
        assert_eq!(fields.day, 3);
        assert!(fields.holiday);
    }

    #[tokio::test]
    async fn add_sends_the_session_token_and_tracks_the_id() {
        let (mut state, api) = logged_in().await;
        let out = assert_ok!(add(&mut state, input("Mid-Autumn", 3, 9, 17)).await);
        assert!(out.starts_with("Added Mid-Autumn [China] on 9/17"));

        let token = state.session.token();
        assert!(token.is_some());
        assert_eq!(api.bearer_tokens(), vec![token]);
        assert_eq!(state.session.user().events.len(), 1);
    }

    #[tokio::test]
    async fn edit_keeps_unchanged_fields() {
        let (mut state, _api) = logged_in().await;
        assert_ok!(add(&mut state, input("Mid-Autumn", 3, 9, 17)).await);
        let id = state.session.user().events[0].clone();

        let change = EventInput {
            day: Some(18),
            ..Default::default()
        };
        let out = assert_ok!(edit(&mut state, &id, change).await);
        assert_eq!(out, "Updated Mid-Autumn [China] on 9/18");
        assert!(!state.editor.is_visible());
        assert_eq!(state.store.calendar().references(&id), 1);
    }

    #[tokio::test]
    async fn editing_someone_elses_event_is_refused() {
        let (mut state, api) = logged_in().await;
        let err = assert_err!(edit(&mut state, "theirs", input("Mine now", 4, 10, 9)).await);
        assert!(matches!(err, AppError::Unauthorized));
        let err = assert_err!(remove(&mut state, "theirs").await);
        assert!(matches!(err, AppError::Unauthorized));
        assert!(!api.called("updateevent"));
        assert!(!api.called("removeevent"));
    }

    #[tokio::test]
    async fn remove_forgets_the_event_even_when_the_server_fails() {
        let (mut state, api) = logged_in().await;
        assert_ok!(add(&mut state, input("Dano", 4, 6, 10)).await);
        let id = state.session.user().events[0].clone();

        api.fail("removeevent");
        assert_err!(remove(&mut state, &id).await);
        assert!(state.store.get(&id).is_none());
        assert!(state.session.user().events.is_empty());
    }
}
