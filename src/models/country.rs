use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Ordinal shared with `Event::country`.
    pub id: u8,
    pub name: String,
    pub selected: bool,
}

pub const COUNTRY_NAMES: [&str; 6] = ["Iran", "Canada", "Ukraine", "China", "Korea", "Indigenous"];

/// Highest valid `Event::country` ordinal.
pub const MAX_COUNTRY_ID: u8 = (COUNTRY_NAMES.len() - 1) as u8;

/// The static registry, every country selected.
pub fn default_countries() -> Vec<Country> {
    COUNTRY_NAMES
        .iter()
        .enumerate()
        .map(|(id, name)| Country {
            id: id as u8,
            name: name.to_string(),
            selected: true,
        })
        .collect()
}
