//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, transaction::TransactionKind};

/// The maximum number of characters in a category name.
pub const CATEGORY_NAME_MAX_LENGTH: usize = 100;

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name. Surrounding whitespace is removed.
    ///
    /// # Errors
    ///
    /// Returns an [Error::EmptyCategoryName] if `name` is blank, or an
    /// [Error::CategoryNameTooLong] if it has more than
    /// [CATEGORY_NAME_MAX_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else if name.chars().count() > CATEGORY_NAME_MAX_LENGTH {
            Err(Error::CategoryNameTooLong(CATEGORY_NAME_MAX_LENGTH))
        } else {
            Ok(Self(name.to_owned()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty, e.g. because it
    /// was read back from the database.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// A label for expenses or incomes, e.g. 'Groceries' or 'Paycheck'.
///
/// Categories are shared by all users.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryName,
    pub kind: TransactionKind,
}

#[cfg(test)]
mod category_name_tests {
    use crate::Error;

    use super::{CATEGORY_NAME_MAX_LENGTH, CategoryName};

    #[test]
    fn new_fails_on_empty_string() {
        assert_eq!(CategoryName::new(""), Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        assert_eq!(CategoryName::new("\n\t \r"), Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_trims_name() {
        assert_eq!(
            CategoryName::new("  Groceries ").unwrap().as_ref(),
            "Groceries"
        );
    }

    #[test]
    fn new_fails_on_long_name() {
        let name = "🔥".repeat(CATEGORY_NAME_MAX_LENGTH + 1);

        assert_eq!(
            CategoryName::new(&name),
            Err(Error::CategoryNameTooLong(CATEGORY_NAME_MAX_LENGTH))
        );
        assert!(CategoryName::new(&"🔥".repeat(CATEGORY_NAME_MAX_LENGTH)).is_ok());
    }
}
