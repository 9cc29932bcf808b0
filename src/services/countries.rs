use crate::error::{AppError, AppResult};
use crate::models::{default_countries, Country};

/// Which countries' events are visible. Lives for one session only.
#[derive(Debug, Clone)]
pub struct CountryFilter {
    countries: Vec<Country>,
}

impl Default for CountryFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl CountryFilter {
    pub fn new() -> Self {
        Self {
            countries: default_countries(),
        }
    }

    /// Registry with the given countries deselected. Unknown ids are ignored.
    pub fn with_hidden(hidden: &[u8]) -> Self {
        let mut filter = Self::new();
        for country in filter.countries.iter_mut() {
            if hidden.contains(&country.id) {
                country.selected = false;
            }
        }
        filter
    }

    /// Flip the selection of one country, returning its new state.
    pub fn toggle(&mut self, id: u8) -> AppResult<bool> {
        let country = self
            .countries
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("country {}", id)))?;
        country.selected = !country.selected;
        tracing::debug!(
            "Country {} is now {}",
            country.name,
            if country.selected { "shown" } else { "hidden" }
        );
        Ok(country.selected)
    }

    /// Unknown ids count as deselected.
    pub fn is_selected(&self, id: u8) -> bool {
        self.countries
            .get(id as usize)
            .map(|c| c.selected)
            .unwrap_or(false)
    }

    pub fn get(&self, id: u8) -> Option<&Country> {
        self.countries.get(id as usize)
    }

    pub fn list(&self) -> &[Country] {
        &self.countries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_countries_start_selected() {
        let filter = CountryFilter::new();
        assert_eq!(filter.list().len(), 6);
        assert!(filter.list().iter().all(|c| c.selected));
        assert_eq!(filter.get(5).map(|c| c.name.as_str()), Some("Indigenous"));
    }

    #[test]
    fn toggle_flips_selection() {
        let mut filter = CountryFilter::new();
        assert_eq!(filter.toggle(1).unwrap(), false);
        assert!(!filter.is_selected(1));
        assert_eq!(filter.toggle(1).unwrap(), true);
        assert!(filter.is_selected(1));
    }

    #[test]
    fn toggle_unknown_country_fails() {
        let mut filter = CountryFilter::new();
        assert!(matches!(filter.toggle(9), Err(AppError::NotFound(_))));
        assert!(!filter.is_selected(9));
    }

    #[test]
    fn with_hidden_deselects_given_ids() {
        let filter = CountryFilter::with_hidden(&[0, 4, 42]);
        assert!(!filter.is_selected(0));
        assert!(!filter.is_selected(4));
        assert!(filter.is_selected(2));
    }
}
