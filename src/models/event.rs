use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub country: u8,
    /// Zero-based month, 0 = January.
    pub month: u8,
    /// One-based day of the month.
    pub day_number: u8,
    /// Position of the day inside the month grid; always
    /// `day_number + offset_of_month(month)`.
    #[serde(default)]
    pub day_index: usize,
    #[serde(default)]
    pub holiday: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub user_id: String,
}

impl Event {
    /// Grid slot `(month, day_index)` the event is indexed under.
    pub fn slot(&self) -> (usize, usize) {
        (self.month as usize, self.day_index)
    }
}

/// Raw form input for creating or editing an event. Numeric fields are kept
/// wide so out-of-range input can be reported instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFields {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub country: i64,
    pub month: i64,
    /// Zero-based day of the month (0 = the 1st).
    pub day: i64,
    #[serde(default)]
    pub holiday: bool,
    #[serde(default)]
    pub source: Option<String>,
}

impl From<&Event> for EventFields {
    fn from(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            description: event.description.clone(),
            country: event.country as i64,
            month: event.month as i64,
            day: event.day_number as i64 - 1,
            holiday: event.holiday,
            source: event.source.clone(),
        }
    }
}

/// Body of `/api/addevent` and `/api/updateevent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub country: u8,
    pub month: u8,
    pub day_number: u8,
    #[serde(default)]
    pub day_index: usize,
    pub holiday: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub user_id: String,
}

impl EventPayload {
    pub fn into_event(self, id: String) -> Event {
        Event {
            id,
            name: self.name,
            description: self.description,
            country: self.country,
            month: self.month,
            day_number: self.day_number,
            day_index: self.day_index,
            holiday: self.holiday,
            source: self.source,
            user_id: self.user_id,
        }
    }
}
