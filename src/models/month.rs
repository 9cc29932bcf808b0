use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub number: u8,
    pub day_is_in_this_month: bool,
    #[serde(default)]
    pub events: Vec<String>,
}

impl Day {
    fn new(number: u32, in_month: bool) -> Self {
        Self {
            number: number as u8,
            day_is_in_this_month: in_month,
            events: Vec::new(),
        }
    }
}

/// A month laid out as whole weeks, padded with days of the adjacent months.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Month {
    #[serde(default)]
    pub name: String,
    pub dates: Vec<Day>,
}

impl Month {
    /// Build the grid for `month0` (0 = January) of `year` with Sunday-first
    /// weeks. Returns `None` for an invalid month.
    pub fn for_month(year: i32, month0: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month0 + 1, 1)?;
        let leading = first.weekday().num_days_from_sunday() as i64;
        let grid_start = first - Duration::days(leading);
        let length = days_in_month(year, month0 + 1)?;

        let mut dates = Vec::with_capacity(42);
        let mut cursor = grid_start;
        while cursor < first {
            dates.push(Day::new(cursor.day(), false));
            cursor += Duration::days(1);
        }
        for number in 1..=length {
            dates.push(Day::new(number, true));
        }
        let mut trailing = 1;
        while dates.len() % 7 != 0 {
            dates.push(Day::new(trailing, false));
            trailing += 1;
        }

        Some(Self {
            name: first.format("%B").to_string(),
            dates,
        })
    }

    /// The twelve grids of `year`.
    pub fn year(year: i32) -> Vec<Self> {
        (0..12).filter_map(|m| Month::for_month(year, m)).collect()
    }

    /// Number of days belonging to the month itself.
    pub fn len_in_month(&self) -> usize {
        self.dates.iter().filter(|d| d.day_is_in_this_month).count()
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_padded_to_whole_weeks() {
        // March 2024 starts on a Friday
        let march = Month::for_month(2024, 2).unwrap();
        assert_eq!(march.name, "March");
        assert_eq!(march.dates.len() % 7, 0);
        assert_eq!(march.len_in_month(), 31);

        let leading: Vec<u8> = march
            .dates
            .iter()
            .take_while(|d| !d.day_is_in_this_month)
            .map(|d| d.number)
            .collect();
        assert_eq!(leading, vec![25, 26, 27, 28, 29]);
        assert_eq!(march.dates[5].number, 1);
    }

    #[test]
    fn month_starting_on_sunday_has_no_padding() {
        // September 2024 starts on a Sunday
        let september = Month::for_month(2024, 8).unwrap();
        assert!(september.dates[0].day_is_in_this_month);
        assert_eq!(september.dates[0].number, 1);
    }

    #[test]
    fn february_respects_leap_years() {
        assert_eq!(Month::for_month(2024, 1).unwrap().len_in_month(), 29);
        assert_eq!(Month::for_month(2023, 1).unwrap().len_in_month(), 28);
        assert!(Month::for_month(2024, 12).is_none());
        assert_eq!(Month::year(2025).len(), 12);
    }

    #[test]
    fn day_decodes_server_field_names() {
        let day: Day =
            serde_json::from_str(r#"{"number": 4, "dayIsInThisMonth": true, "events": ["a"]}"#)
                .unwrap();
        assert!(day.day_is_in_this_month);
        assert_eq!(day.events, vec!["a".to_string()]);
    }
}
