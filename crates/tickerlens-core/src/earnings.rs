//! Earnings-calendar normalization.
//!
//! Providers report upcoming earnings as nothing at all, one date, or a
//! window of candidate dates. [`EarningsCalendar`] folds those shapes into
//! one type and [`next_earnings_date`] collapses it to the nearest future
//! date.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::iso_date;

/// Normalized earnings-calendar response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "dates", rename_all = "snake_case")]
pub enum EarningsCalendar {
    #[default]
    NoEarningsData,
    SingleDate(#[serde(with = "iso_date")] Date),
    MultipleDates(#[serde(with = "iso_date::list")] Vec<Date>),
}

impl EarningsCalendar {
    /// Build the calendar shape matching the number of dates reported.
    pub fn from_dates(mut dates: Vec<Date>) -> Self {
        match dates.len() {
            0 => Self::NoEarningsData,
            1 => Self::SingleDate(dates.remove(0)),
            _ => Self::MultipleDates(dates),
        }
    }

    pub fn dates(&self) -> &[Date] {
        match self {
            Self::NoEarningsData => &[],
            Self::SingleDate(date) => std::slice::from_ref(date),
            Self::MultipleDates(dates) => dates,
        }
    }
}

/// Nearest earnings date strictly after `today`, if any.
pub fn next_earnings_date(calendar: &EarningsCalendar, today: Date) -> Option<Date> {
    calendar
        .dates()
        .iter()
        .copied()
        .filter(|date| *date > today)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn picks_the_only_future_date() {
        let calendar =
            EarningsCalendar::from_dates(vec![date!(2023 - 01 - 01), date!(2030 - 01 - 01)]);
        assert_eq!(
            next_earnings_date(&calendar, date!(2024 - 06 - 01)),
            Some(date!(2030 - 01 - 01))
        );
    }

    #[test]
    fn picks_the_nearest_of_several_future_dates() {
        let calendar = EarningsCalendar::from_dates(vec![
            date!(2024 - 08 - 05),
            date!(2024 - 07 - 29),
            date!(2024 - 05 - 01),
        ]);
        assert_eq!(
            next_earnings_date(&calendar, date!(2024 - 06 - 01)),
            Some(date!(2024 - 07 - 29))
        );
    }

    #[test]
    fn today_is_not_in_the_future() {
        let calendar = EarningsCalendar::SingleDate(date!(2024 - 06 - 01));
        assert_eq!(next_earnings_date(&calendar, date!(2024 - 06 - 01)), None);
    }

    #[test]
    fn past_only_and_empty_calendars_have_no_next_date() {
        let today = date!(2024 - 06 - 01);
        let past = EarningsCalendar::from_dates(vec![date!(2023 - 01 - 01)]);
        assert_eq!(next_earnings_date(&past, today), None);
        assert_eq!(next_earnings_date(&EarningsCalendar::NoEarningsData, today), None);
    }

    #[test]
    fn from_dates_matches_reported_shape() {
        assert_eq!(
            EarningsCalendar::from_dates(Vec::new()),
            EarningsCalendar::NoEarningsData
        );
        assert_eq!(
            EarningsCalendar::from_dates(vec![date!(2030 - 01 - 01)]),
            EarningsCalendar::SingleDate(date!(2030 - 01 - 01))
        );
        assert!(matches!(
            EarningsCalendar::from_dates(vec![date!(2030 - 01 - 01), date!(2030 - 01 - 02)]),
            EarningsCalendar::MultipleDates(ref dates) if dates.len() == 2
        ));
    }

    #[test]
    fn deserializes_fixture_shapes() {
        let single: EarningsCalendar =
            serde_json::from_str(r#"{"kind":"single_date","dates":"2030-01-01"}"#)
                .expect("single date");
        assert_eq!(single, EarningsCalendar::SingleDate(date!(2030 - 01 - 01)));

        let none: EarningsCalendar =
            serde_json::from_str(r#"{"kind":"no_earnings_data"}"#).expect("no data");
        assert_eq!(none, EarningsCalendar::NoEarningsData);
    }
}
