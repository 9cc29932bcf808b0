use std::sync::Arc;

use chrono::NaiveDate;

pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

use config::Config;
use services::{
    api::CalendarApi,
    countries::CountryFilter,
    events::EventStore,
    overlay::{EditEventOverlay, EventDetailsOverlay},
    session::SessionService,
    token_store::TokenStore,
};

/// Everything one client invocation works on.
pub struct AppState {
    pub config: Config,
    pub session: SessionService,
    pub store: EventStore,
    pub countries: CountryFilter,
    pub details: EventDetailsOverlay,
    pub editor: EditEventOverlay,
}

impl AppState {
    pub fn new(
        config: Config,
        api: Arc<dyn CalendarApi>,
        tokens: Arc<dyn TokenStore>,
        today: NaiveDate,
    ) -> Self {
        let session = SessionService::new(api.clone(), tokens, &config.session);
        Self {
            config,
            session,
            store: EventStore::new(api, today),
            countries: CountryFilter::new(),
            details: EventDetailsOverlay::new(),
            editor: EditEventOverlay::new(),
        }
    }

    /// Restore the session and load months and events. Remote failures are
    /// logged by the services and leave whatever could be loaded in place.
    pub async fn load(&mut self, today: NaiveDate) {
        if self.session.refresh().await {
            tracing::info!("Session restored for {}", self.session.user().username);
        }
        // both fall back on failure
        let _ = self.store.fetch_months(today).await;
        let _ = self.store.fetch_all().await;
    }
}
