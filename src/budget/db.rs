//! Database operations for budgets.

use rusqlite::{Connection, Row};

use crate::{Error, amount::Amount, auth::UserID, category::CategoryId};

/// Database identifier for a budget.
pub type BudgetId = i64;

/// A running amount that grows with every expense or income recorded in its
/// category.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserID,
    /// `None` once the category has been deleted, or if the budget was
    /// created without one.
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub amount: Amount,
}

/// Initialize the budget table.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            amount INTEGER NOT NULL CHECK (amount >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_budget_user_category ON budget(user_id, category_id);",
    )?;

    Ok(())
}

/// Create a budget for `user_id` starting at `amount`.
pub fn create_budget(
    user_id: UserID,
    category_id: Option<CategoryId>,
    amount: Amount,
    connection: &Connection,
) -> Result<BudgetId, Error> {
    connection.execute(
        "INSERT INTO budget (user_id, category_id, amount) VALUES (?1, ?2, ?3)",
        (user_id, category_id, amount),
    )?;

    Ok(connection.last_insert_rowid())
}

/// Add `amount` to every one of the user's budgets for `category_id`.
///
/// Returns the number of budgets that were updated.
pub fn add_to_budgets(
    user_id: UserID,
    category_id: CategoryId,
    amount: Amount,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE budget SET amount = amount + ?3 WHERE user_id = ?1 AND category_id = ?2",
            (user_id, category_id, amount),
        )
        .map_err(Error::from)
}

/// The user's budgets in the order they were created.
pub fn get_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT b.id, b.user_id, b.category_id, c.name, b.amount
            FROM budget b
            LEFT JOIN category c ON c.id = b.category_id
            WHERE b.user_id = ?1
            ORDER BY b.id ASC",
        )?
        .query_map([user_id], map_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        amount: row.get(4)?,
    })
}
