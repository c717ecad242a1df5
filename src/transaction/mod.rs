//! Expenses and incomes.
//!
//! Both kinds of transaction share the same columns, queries and pages and
//! are told apart by [TransactionKind].

mod db;
mod domain;
mod form;
mod list;
mod period_page;

pub use db::{
    create_transaction, create_transaction_tables, get_recent_transactions, get_transactions,
    get_transactions_chronological,
};
pub use domain::{NewTransaction, Transaction, TransactionId, TransactionKind};
pub use form::{
    create_expense_endpoint, create_income_endpoint, get_add_expense_page, get_add_income_page,
};
pub use list::{fetch_expenses, fetch_incomes, get_expenses_page, get_incomes_page};
pub use period_page::{get_expenses_period_page, get_incomes_period_page};
