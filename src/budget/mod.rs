//! Budgets: per-category running amounts that grow with each new expense or
//! income.

mod db;
mod summary;

pub use db::{Budget, BudgetId, add_to_budgets, create_budget, create_budget_table, get_budgets};
pub use summary::{create_budget_endpoint, get_budget_summary_page};

pub(crate) use summary::{budgets_table, totals_view};
