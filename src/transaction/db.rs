//! Database operations for expenses and incomes.
//!
//! Expenses and incomes have identical columns and live in the tables named
//! by [TransactionKind::table_name].

use rusqlite::{Connection, Row};

use crate::{
    Error,
    auth::UserID,
    budget::add_to_budgets,
    period::DateRange,
    transaction::{NewTransaction, Transaction, TransactionKind},
};

/// Create the expense and income tables.
pub fn create_transaction_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for kind in [TransactionKind::Expense, TransactionKind::Income] {
        let table = kind.table_name();

        connection.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE RESTRICT,
                amount INTEGER NOT NULL CHECK (amount >= 0),
                date TEXT NOT NULL,
                comment TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_{table}_user_date ON {table}(user_id, date);"
        ))?;
    }

    Ok(())
}

/// Store an expense or income and add its amount to the user's budgets for
/// the same category.
///
/// Both writes happen in one SQL transaction.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidCategory] if the category does not exist,
/// - [Error::CategoryKindMismatch] if the category is of the other kind,
/// - [Error::SqlError] for any other SQL error.
pub fn create_transaction(
    kind: TransactionKind,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let (category_kind, category_name): (TransactionKind, String) = sql_transaction
        .query_row(
            "SELECT kind, name FROM category WHERE id = ?1",
            [new_transaction.category_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::InvalidCategory(new_transaction.category_id)
            }
            error => error.into(),
        })?;

    if category_kind != kind {
        return Err(Error::CategoryKindMismatch(kind));
    }

    sql_transaction.execute(
        &format!(
            "INSERT INTO {} (user_id, category_id, amount, date, comment)
            VALUES (?1, ?2, ?3, ?4, ?5)",
            kind.table_name()
        ),
        (
            new_transaction.user_id,
            new_transaction.category_id,
            new_transaction.amount,
            new_transaction.date,
            &new_transaction.comment,
        ),
    )?;
    let id = sql_transaction.last_insert_rowid();

    add_to_budgets(
        new_transaction.user_id,
        new_transaction.category_id,
        new_transaction.amount,
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(Transaction {
        id,
        user_id: new_transaction.user_id,
        category_id: new_transaction.category_id,
        category_name,
        amount: new_transaction.amount,
        date: new_transaction.date,
        comment: new_transaction.comment,
    })
}

fn select_transactions_sql(kind: TransactionKind) -> String {
    format!(
        "SELECT t.id, t.user_id, t.category_id, c.name, t.amount, t.date, t.comment
        FROM {} t
        INNER JOIN category c ON c.id = t.category_id
        WHERE t.user_id = ?1 AND (?2 IS NULL OR t.date BETWEEN ?2 AND ?3)",
        kind.table_name()
    )
}

/// Get the user's transactions of `kind`, newest first.
///
/// `range` limits the results to an inclusive date range, `None` returns all
/// of the user's transactions.
pub fn get_transactions(
    kind: TransactionKind,
    user_id: UserID,
    range: Option<DateRange>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "{} ORDER BY t.date DESC, t.id DESC",
        select_transactions_sql(kind)
    );

    connection
        .prepare(&query)?
        .query_map(
            (
                user_id,
                range.map(|range| range.start),
                range.map(|range| range.end),
            ),
            map_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get at most `limit` of the user's latest transactions of `kind`.
pub fn get_recent_transactions(
    kind: TransactionKind,
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "{} ORDER BY t.date DESC, t.id DESC LIMIT ?4",
        select_transactions_sql(kind)
    );

    connection
        .prepare(&query)?
        .query_map(
            (user_id, None::<time::Date>, None::<time::Date>, limit),
            map_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get all the user's transactions of `kind`, oldest first.
pub fn get_transactions_chronological(
    kind: TransactionKind,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "{} ORDER BY t.date ASC, t.id ASC",
        select_transactions_sql(kind)
    );

    connection
        .prepare(&query)?
        .query_map(
            (user_id, None::<time::Date>, None::<time::Date>),
            map_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

fn map_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        comment: row.get(6)?,
    })
}

#[cfg(test)]
mod transaction_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Amount, Error,
        auth::User,
        category::{Category, CategoryName, create_category},
        period::DateRange,
        test_utils::{get_test_connection, insert_test_user},
        transaction::{NewTransaction, TransactionKind},
    };

    use super::{
        create_transaction, get_recent_transactions, get_transactions,
        get_transactions_chronological,
    };

    struct Fixture {
        connection: Connection,
        user: User,
        food: Category,
        salary: Category,
    }

    fn fixture() -> Fixture {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "alice", "hunter2");
        let food = create_category(
            CategoryName::new_unchecked("Food"),
            TransactionKind::Expense,
            &connection,
        )
        .unwrap();
        let salary = create_category(
            CategoryName::new_unchecked("Salary"),
            TransactionKind::Income,
            &connection,
        )
        .unwrap();

        Fixture {
            connection,
            user,
            food,
            salary,
        }
    }

    fn expense(fixture: &Fixture, amount: &str, date: time::Date) -> NewTransaction {
        NewTransaction::new(
            fixture.user.id,
            fixture.food.id,
            Amount::parse(amount).unwrap(),
            date,
        )
    }

    #[test]
    fn create_transaction_succeeds() {
        let fixture = fixture();

        let transaction = create_transaction(
            TransactionKind::Expense,
            expense(&fixture, "12.30", date!(2024 - 03 - 01)).comment("lunch"),
            &fixture.connection,
        )
        .expect("Could not create expense");

        assert!(transaction.id > 0);
        assert_eq!(transaction.category_name, "Food");
        assert_eq!(transaction.comment.as_deref(), Some("lunch"));
        assert_eq!(
            get_transactions(
                TransactionKind::Expense,
                fixture.user.id,
                None,
                &fixture.connection
            ),
            Ok(vec![transaction])
        );
    }

    #[test]
    fn create_transaction_with_missing_category_fails() {
        let fixture = fixture();
        let mut new_expense = expense(&fixture, "1", date!(2024 - 03 - 01));
        new_expense.category_id = 999;

        let result = create_transaction(TransactionKind::Expense, new_expense, &fixture.connection);

        assert_eq!(result, Err(Error::InvalidCategory(999)));
    }

    #[test]
    fn create_transaction_with_other_kind_of_category_fails() {
        let fixture = fixture();
        let mut new_income = expense(&fixture, "1", date!(2024 - 03 - 01));
        new_income.category_id = fixture.salary.id;

        let result = create_transaction(TransactionKind::Expense, new_income, &fixture.connection);

        assert_eq!(
            result,
            Err(Error::CategoryKindMismatch(TransactionKind::Expense))
        );
        assert_eq!(
            get_transactions(
                TransactionKind::Expense,
                fixture.user.id,
                None,
                &fixture.connection
            ),
            Ok(vec![])
        );
    }

    #[test]
    fn get_transactions_newest_first() {
        let fixture = fixture();
        for (amount, date) in [
            ("1", date!(2024 - 03 - 02)),
            ("2", date!(2024 - 03 - 01)),
            ("3", date!(2024 - 03 - 02)),
        ] {
            create_transaction(
                TransactionKind::Expense,
                expense(&fixture, amount, date),
                &fixture.connection,
            )
            .unwrap();
        }

        let amounts = get_transactions(
            TransactionKind::Expense,
            fixture.user.id,
            None,
            &fixture.connection,
        )
        .unwrap()
        .into_iter()
        .map(|transaction| transaction.amount.to_string())
        .collect::<Vec<_>>();

        assert_eq!(amounts, vec!["3.00", "1.00", "2.00"]);
    }

    #[test]
    fn get_transactions_in_range_is_inclusive() {
        let fixture = fixture();
        for date in [
            date!(2024 - 02 - 29),
            date!(2024 - 03 - 01),
            date!(2024 - 03 - 31),
            date!(2024 - 04 - 01),
        ] {
            create_transaction(
                TransactionKind::Expense,
                expense(&fixture, "1", date),
                &fixture.connection,
            )
            .unwrap();
        }
        let march = DateRange {
            start: date!(2024 - 03 - 01),
            end: date!(2024 - 03 - 31),
        };

        let dates = get_transactions(
            TransactionKind::Expense,
            fixture.user.id,
            Some(march),
            &fixture.connection,
        )
        .unwrap()
        .into_iter()
        .map(|transaction| transaction.date)
        .collect::<Vec<_>>();

        assert_eq!(dates, vec![date!(2024 - 03 - 31), date!(2024 - 03 - 01)]);
    }

    #[test]
    fn other_users_transactions_are_hidden() {
        let fixture = fixture();
        let bob = insert_test_user(&fixture.connection, "bob", "hunter3");
        create_transaction(
            TransactionKind::Expense,
            NewTransaction::new(
                bob.id,
                fixture.food.id,
                Amount::parse("5").unwrap(),
                date!(2024 - 03 - 01),
            ),
            &fixture.connection,
        )
        .unwrap();

        let alices = get_transactions(
            TransactionKind::Expense,
            fixture.user.id,
            None,
            &fixture.connection,
        )
        .unwrap();

        assert!(alices.is_empty());
    }

    #[test]
    fn recent_and_chronological_orders() {
        let fixture = fixture();
        for day in 1..=7 {
            create_transaction(
                TransactionKind::Expense,
                expense(
                    &fixture,
                    &day.to_string(),
                    date!(2024 - 03 - 01).replace_day(day).unwrap(),
                ),
                &fixture.connection,
            )
            .unwrap();
        }

        let recent = get_recent_transactions(
            TransactionKind::Expense,
            fixture.user.id,
            5,
            &fixture.connection,
        )
        .unwrap();
        let chronological = get_transactions_chronological(
            TransactionKind::Expense,
            fixture.user.id,
            &fixture.connection,
        )
        .unwrap();

        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].date, date!(2024 - 03 - 07));
        assert_eq!(chronological.len(), 7);
        assert_eq!(chronological[0].date, date!(2024 - 03 - 01));
    }
}
