//! Money amounts.
//!
//! Amounts are non-negative decimals with two decimal places. They are stored
//! in the database as an integer number of cents so that sums computed by
//! SQLite are exact.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;

use crate::Error;

/// The number of decimal places an amount may have.
pub const DECIMAL_PLACES: u32 = 2;

/// The largest number of digits (including cents) an amount may have.
pub const MAX_DIGITS: u32 = 10;

/// A validated, non-negative money amount with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// The amount zero.
    pub const ZERO: Amount = Amount(Decimal::from_parts(0, 0, 0, false, DECIMAL_PLACES));

    /// Create an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAmount] if `value`:
    /// - is negative,
    /// - has more than two decimal places,
    /// - has more than ten digits.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(Error::InvalidAmount("Amount cannot be negative".to_owned()));
        }

        let value = value.normalize();

        if value.scale() > DECIMAL_PLACES {
            return Err(Error::InvalidAmount(
                "Amount cannot have more than two decimal places".to_owned(),
            ));
        }

        let limit = Decimal::from(10_i64.pow(MAX_DIGITS - DECIMAL_PLACES));
        if value >= limit {
            return Err(Error::InvalidAmount(format!(
                "Amount must be less than {limit}"
            )));
        }

        let mut value = value;
        value.rescale(DECIMAL_PLACES);
        value.set_sign_positive(true);

        Ok(Self(value))
    }

    /// Parse an amount from user input such as "12.50".
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAmount] if `raw` is not a number or the
    /// number is not a valid amount (see [Amount::new]).
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let value = Decimal::from_str(raw.trim())
            .map_err(|_| Error::InvalidAmount(format!("\"{}\" is not a valid amount", raw.trim())))?;

        Self::new(value)
    }

    /// Create an amount from a whole number of cents.
    ///
    /// The caller should ensure that `cents` is non-negative, e.g. because it
    /// was read back from the database.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, DECIMAL_PLACES))
    }

    /// The amount as a whole number of cents.
    pub fn cents(&self) -> i64 {
        // The value always has a scale of two, so the mantissa is the number
        // of cents, and the digit limit keeps it well inside an i64.
        self.0.mantissa() as i64
    }

    /// The amount as a decimal with two decimal places.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

/// Convert a whole number of cents, e.g. the result of `SUM(amount)`, to a decimal.
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Amount::from_cents)
    }
}
