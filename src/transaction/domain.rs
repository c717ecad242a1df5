//! Core transaction domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, amount::Amount, auth::UserID, category::CategoryId, endpoints};

/// Database identifier for an expense or income.
pub type TransactionId = i64;

/// Whether money went out (an expense) or came in (an income).
///
/// Categories carry a kind too, and a transaction may only use a category of
/// its own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    /// The value stored in the database and used in forms.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        }
    }

    /// The table holding transactions of this kind.
    pub(crate) fn table_name(self) -> &'static str {
        match self {
            TransactionKind::Expense => "expense",
            TransactionKind::Income => "income",
        }
    }

    /// "Expense" or "Income".
    pub fn label(self) -> &'static str {
        match self {
            TransactionKind::Expense => "Expense",
            TransactionKind::Income => "Income",
        }
    }

    /// "Expenses" or "Incomes".
    pub fn plural_label(self) -> &'static str {
        match self {
            TransactionKind::Expense => "Expenses",
            TransactionKind::Income => "Incomes",
        }
    }

    pub fn list_endpoint(self) -> &'static str {
        match self {
            TransactionKind::Expense => endpoints::EXPENSES_LIST,
            TransactionKind::Income => endpoints::INCOMES_LIST,
        }
    }

    pub fn add_endpoint(self) -> &'static str {
        match self {
            TransactionKind::Expense => endpoints::ADD_EXPENSE,
            TransactionKind::Income => endpoints::ADD_INCOME,
        }
    }

    pub fn fetch_endpoint(self) -> &'static str {
        match self {
            TransactionKind::Expense => endpoints::FETCH_EXPENSES,
            TransactionKind::Income => endpoints::FETCH_INCOMES,
        }
    }

    pub fn period_endpoint(self) -> &'static str {
        match self {
            TransactionKind::Expense => endpoints::EXPENSES_PERIOD,
            TransactionKind::Income => endpoints::INCOMES_PERIOD,
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "expense" => Ok(TransactionKind::Expense),
            "income" => Ok(TransactionKind::Income),
            other => Err(Error::InvalidCategoryKind(other.to_owned())),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: UserID,
    pub category_id: CategoryId,
    pub amount: Amount,
    pub date: Date,
    /// `None` when the user left the comment blank.
    pub comment: Option<String>,
}

impl NewTransaction {
    /// A transaction without a comment.
    pub fn new(user_id: UserID, category_id: CategoryId, amount: Amount, date: Date) -> Self {
        Self {
            user_id,
            category_id,
            amount,
            date,
            comment: None,
        }
    }

    /// Set the comment. Blank comments are stored as `None`.
    pub fn comment(mut self, comment: &str) -> Self {
        let comment = comment.trim();
        self.comment = (!comment.is_empty()).then(|| comment.to_owned());
        self
    }
}

/// A stored expense or income with the name of its category.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserID,
    pub category_id: CategoryId,
    pub category_name: String,
    pub amount: Amount,
    pub date: Date,
    pub comment: Option<String>,
}
