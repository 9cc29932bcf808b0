pub mod api;
pub mod calendar;
pub mod countries;
pub mod events;
pub mod overlay;
pub mod session;
pub mod token_store;
pub mod validation;
