//! Records exchanged with the calendar server and held in client state.
//! Each record lives in its own file; everything is re-exported here so
//! callers can `use crate::models::*;`.

pub mod country;
pub mod event;
pub mod month;
pub mod user;

pub use self::country::*;
pub use self::event::*;
pub use self::month::*;
pub use self::user::*;
