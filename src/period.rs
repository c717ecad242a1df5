//! Named periods (day, week, month, year) and the date ranges they cover.

use std::str::FromStr;

use time::{Date, Duration, Month, util};

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

/// A window of time anchored to "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    /// Monday to Sunday.
    Week,
    Month,
    Year,
}

impl Period {
    /// Every period, in order of increasing size.
    pub const ALL: [Period; 4] = [Period::Day, Period::Week, Period::Month, Period::Year];

    /// Parse an optional period token.
    ///
    /// Returns `None` if the token is absent or not one of "day", "week",
    /// "month" or "year".
    pub fn parse(token: Option<&str>) -> Option<Self> {
        token.and_then(|token| token.parse().ok())
    }

    /// The value used for this period in query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Day => "Today",
            Period::Week => "This week",
            Period::Month => "This month",
            Period::Year => "This year",
        }
    }

    /// The dates covered by this period when the current date is `today`.
    pub fn date_range(self, today: Date) -> DateRange {
        match self {
            Period::Day => DateRange {
                start: today,
                end: today,
            },
            Period::Week => week_bounds(today),
            Period::Month => month_bounds(today),
            Period::Year => year_containing(today),
        }
    }
}

impl FromStr for Period {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            _ => Err(()),
        }
    }
}

/// Resolve a period token to the date range it covers.
///
/// Returns `None`, meaning "no date filter", when the token is absent or
/// unrecognised.
pub fn resolve_period(token: Option<&str>, today: Date) -> Option<DateRange> {
    Period::parse(token).map(|period| period.date_range(today))
}

fn week_bounds(anchor_date: Date) -> DateRange {
    let days_since_monday = anchor_date.weekday().number_days_from_monday() as i64;
    let start = anchor_date - Duration::days(days_since_monday);
    let end = start.checked_add(Duration::days(6)).unwrap_or(Date::MAX);

    DateRange { start, end }
}

fn month_bounds(anchor_date: Date) -> DateRange {
    let start = anchor_date - Duration::days(i64::from(anchor_date.day()) - 1);
    let days_in_month = anchor_date.month().length(anchor_date.year());
    let end = start + Duration::days(i64::from(days_in_month) - 1);

    DateRange { start, end }
}

fn year_containing(anchor_date: Date) -> DateRange {
    let start = anchor_date - Duration::days(i64::from(anchor_date.ordinal()) - 1);
    let end = start + Duration::days(i64::from(util::days_in_year(anchor_date.year())) - 1);

    DateRange { start, end }
}

/// January 1st to December 31st of `year`.
///
/// Returns `None` if `year` is outside the range of dates that can be
/// represented.
pub fn year_bounds(year: i32) -> Option<DateRange> {
    Date::from_calendar_date(year, Month::January, 1)
        .ok()
        .map(year_containing)
}
