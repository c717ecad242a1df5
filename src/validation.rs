//! Structured validation errors for user input.
//!
//! Handlers turn raw form or query data into domain values with explicit
//! validation functions that return `Result<T, ValidationErrors>`. The errors
//! name the offending field so the form can be re-rendered with a message next
//! to the input.

use std::fmt::Display;

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, period::DateRange};

/// The format for dates in forms, query strings and reports, e.g. "2024-01-15".
pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// A problem with a single input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The name of the input field, as used in the HTML form.
    pub field: &'static str,
    /// A message explaining what is wrong, suitable for showing to the user.
    pub message: String,
}

/// All the problems found with a submitted form or query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem with `field`.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first message recorded for `field`.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Ok(value)` if no errors were recorded, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages = self
            .0
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect::<Vec<_>>();

        write!(f, "{}", messages.join("; "))
    }
}

/// Parse a date in the `YYYY-MM-DD` format.
///
/// # Errors
///
/// Returns an [Error::InvalidDate] if `raw` is not a valid calendar date in
/// that format.
pub fn parse_date(raw: &str) -> Result<Date, Error> {
    let raw = raw.trim();
    Date::parse(raw, DATE_FORMAT).map_err(|_| Error::InvalidDate(raw.to_owned()))
}

/// The query parameter holding the first day of a date range.
pub const START_DATE_FIELD: &str = "start-date";
/// The query parameter holding the last day of a date range.
pub const END_DATE_FIELD: &str = "end-date";

/// Validate an explicit, inclusive date range from a query string.
///
/// Both dates are required, must be in the `YYYY-MM-DD` format, and the start
/// may not be after the end.
pub fn validate_date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<DateRange, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let mut parse_required = |raw: Option<&str>, field: &'static str, label: &str| {
        match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => {
                errors.push(field, format!("{label} is required"));
                None
            }
            Some(raw) => match parse_date(raw) {
                Ok(date) => Some(date),
                Err(error) => {
                    errors.push(field, error.to_string());
                    None
                }
            },
        }
    };

    let start = parse_required(start, START_DATE_FIELD, "Start date");
    let end = parse_required(end, END_DATE_FIELD, "End date");

    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            errors.push(END_DATE_FIELD, "End date cannot be before the start date");
            Err(errors)
        }
        (Some(start), Some(end)) => errors.into_result(DateRange { start, end }),
        _ => Err(errors),
    }
}
