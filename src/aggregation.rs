//! Sums of expenses and incomes: by category over a date range, by month
//! over a year, and over all time.

use std::collections::BTreeMap;

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    Error,
    amount::cents_to_decimal,
    auth::UserID,
    period::{DateRange, year_bounds},
    transaction::TransactionKind,
};

/// Sum the user's transactions of `kind` in `range` (inclusive) by category name.
///
/// Categories without any transactions in the range are left out.
pub fn sum_by_category(
    kind: TransactionKind,
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<BTreeMap<String, Decimal>, Error> {
    let query = format!(
        "SELECT c.name, SUM(t.amount)
        FROM {} t
        INNER JOIN category c ON c.id = t.category_id
        WHERE t.user_id = ?1 AND t.date BETWEEN ?2 AND ?3
        GROUP BY c.id, c.name",
        kind.table_name()
    );

    connection
        .prepare(&query)?
        .query_map((user_id, range.start, range.end), |row| {
            let name: String = row.get(0)?;
            let cents: i64 = row.get(1)?;
            Ok((name, cents_to_decimal(cents)))
        })?
        .map(|maybe_sum| maybe_sum.map_err(Error::from))
        .collect()
}

/// The income, expenses and their difference for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MonthlySummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub expense: Decimal,
    /// Income minus expenses.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

/// Summarise each month of `year` for the user.
///
/// Always returns 12 entries, January first. Months without transactions
/// are all zero.
pub fn monthly_summary(
    user_id: UserID,
    year: i32,
    connection: &Connection,
) -> Result<Vec<MonthlySummary>, Error> {
    let mut months = vec![MonthlySummary::default(); 12];
    let range = year_bounds(year).ok_or(Error::InvalidYear(year))?;

    for kind in [TransactionKind::Income, TransactionKind::Expense] {
        let query = format!(
            "SELECT CAST(strftime('%m', date) AS INTEGER), SUM(amount)
            FROM {}
            WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
            GROUP BY 1",
            kind.table_name()
        );
        let mut statement = connection.prepare(&query)?;
        let rows = statement.query_map((user_id, range.start, range.end), |row| {
            Ok((row.get::<_, usize>(0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (month, cents) = row?;
            let Some(summary) = month.checked_sub(1).and_then(|index| months.get_mut(index)) else {
                tracing::warn!("Ignoring sum for unexpected month number {month}");
                continue;
            };

            match kind {
                TransactionKind::Income => summary.income = cents_to_decimal(cents),
                TransactionKind::Expense => summary.expense = cents_to_decimal(cents),
            }
        }
    }

    for summary in &mut months {
        summary.balance = summary.income - summary.expense;
    }

    Ok(months)
}

/// The user's all-time income, expenses and balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

/// Sum all of the user's incomes and expenses.
pub fn totals(user_id: UserID, connection: &Connection) -> Result<Totals, Error> {
    let total = |kind: TransactionKind| -> Result<Decimal, Error> {
        let cents: i64 = connection.query_row(
            &format!(
                "SELECT COALESCE(SUM(amount), 0) FROM {} WHERE user_id = ?1",
                kind.table_name()
            ),
            [user_id],
            |row| row.get(0),
        )?;

        Ok(cents_to_decimal(cents))
    };

    let income = total(TransactionKind::Income)?;
    let expense = total(TransactionKind::Expense)?;

    Ok(Totals {
        income,
        expense,
        balance: income - expense,
    })
}

/// The years in which the user has any expense or income, newest first.
pub fn years_with_transactions(user_id: UserID, connection: &Connection) -> Result<Vec<i32>, Error> {
    connection
        .prepare(
            "SELECT DISTINCT CAST(strftime('%Y', date) AS INTEGER) AS year FROM (
                SELECT date FROM expense WHERE user_id = ?1
                UNION ALL
                SELECT date FROM income WHERE user_id = ?1
            )
            ORDER BY year DESC",
        )?
        .query_map([user_id], |row| row.get(0))?
        .map(|maybe_year| maybe_year.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::{Date, macros::date};

    use crate::{
        Amount, Error,
        auth::{User, UserID},
        category::{CategoryName, get_or_create_category},
        period::DateRange,
        test_utils::{get_test_connection, insert_test_user},
        transaction::{NewTransaction, TransactionKind, create_transaction},
    };

    use super::{
        MonthlySummary, Totals, monthly_summary, sum_by_category, totals, years_with_transactions,
    };

    fn record(
        connection: &Connection,
        user: &User,
        kind: TransactionKind,
        category: &str,
        amount: &str,
        date: Date,
    ) {
        let category =
            get_or_create_category(&CategoryName::new_unchecked(category), kind, connection)
                .unwrap();
        create_transaction(
            kind,
            NewTransaction::new(user.id, category.id, Amount::parse(amount).unwrap(), date),
            connection,
        )
        .unwrap();
    }

    fn dollars(amount: i64) -> Decimal {
        Decimal::from(amount)
    }

    #[test]
    fn january_example() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "alice", "hunter2");
        record(&connection, &user, TransactionKind::Income, "Salary", "100", date!(2024 - 01 - 15));
        record(&connection, &user, TransactionKind::Income, "Salary", "200", date!(2024 - 01 - 20));
        record(&connection, &user, TransactionKind::Expense, "Food", "25", date!(2024 - 01 - 10));
        record(&connection, &user, TransactionKind::Expense, "Rent", "100", date!(2024 - 01 - 25));

        let months = monthly_summary(user.id, 2024, &connection).unwrap();

        assert_eq!(months.len(), 12);
        assert_eq!(
            months[0],
            MonthlySummary {
                income: dollars(300),
                expense: dollars(125),
                balance: dollars(175),
            }
        );
        for month in &months[1..] {
            assert_eq!(*month, MonthlySummary::default());
        }
    }

    #[test]
    fn monthly_summary_ignores_other_years_and_users() {
        let connection = get_test_connection();
        let alice = insert_test_user(&connection, "alice", "hunter2");
        let bob = insert_test_user(&connection, "bob", "hunter3");
        record(&connection, &alice, TransactionKind::Income, "Salary", "100", date!(2023 - 12 - 31));
        record(&connection, &alice, TransactionKind::Income, "Salary", "50", date!(2024 - 12 - 31));
        record(&connection, &alice, TransactionKind::Income, "Salary", "70", date!(2025 - 01 - 01));
        record(&connection, &bob, TransactionKind::Income, "Salary", "999", date!(2024 - 12 - 01));

        let months = monthly_summary(alice.id, 2024, &connection).unwrap();

        assert_eq!(months[11].income, dollars(50));
        let year_income: Decimal = months.iter().map(|month| month.income).sum();
        assert_eq!(year_income, dollars(50));
    }

    #[test]
    fn monthly_summary_without_transactions_is_all_zero() {
        let connection = get_test_connection();

        let months = monthly_summary(UserID::new(1), 2024, &connection).unwrap();

        assert_eq!(months, vec![MonthlySummary::default(); 12]);
    }

    #[test]
    fn monthly_summary_rejects_unrepresentable_year() {
        let connection = get_test_connection();

        let result = monthly_summary(UserID::new(1), 10_000, &connection);

        assert_eq!(result, Err(Error::InvalidYear(10_000)));
    }

    #[test]
    fn monthly_summary_serializes_as_numbers() {
        let summary = MonthlySummary {
            income: Decimal::new(30050, 2),
            expense: dollars(125),
            balance: Decimal::new(17550, 2),
        };

        let json = serde_json::to_string(&summary).unwrap();

        assert_eq!(json, r#"{"income":300.5,"expense":125.0,"balance":175.5}"#);
    }

    #[test]
    fn sums_by_category_in_range() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "alice", "hunter2");
        record(&connection, &user, TransactionKind::Expense, "Food", "10.25", date!(2024 - 03 - 01));
        record(&connection, &user, TransactionKind::Expense, "Food", "4.75", date!(2024 - 03 - 31));
        record(&connection, &user, TransactionKind::Expense, "Rent", "500", date!(2024 - 03 - 15));
        record(&connection, &user, TransactionKind::Expense, "Rent", "500", date!(2024 - 04 - 01));
        record(&connection, &user, TransactionKind::Expense, "Fuel", "60", date!(2024 - 02 - 29));
        record(&connection, &user, TransactionKind::Income, "Food", "1", date!(2024 - 03 - 10));
        let march = DateRange {
            start: date!(2024 - 03 - 01),
            end: date!(2024 - 03 - 31),
        };

        let sums = sum_by_category(TransactionKind::Expense, user.id, march, &connection).unwrap();

        assert_eq!(
            sums,
            BTreeMap::from([
                ("Food".to_owned(), dollars(15)),
                ("Rent".to_owned(), dollars(500)),
            ])
        );
    }

    #[test]
    fn sum_by_category_matches_sum_of_rows() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "alice", "hunter2");
        let amounts = ["0.01", "19.99", "3.50", "100", "0.10"];
        for (day, amount) in (1..).zip(amounts) {
            record(
                &connection,
                &user,
                TransactionKind::Expense,
                "Food",
                amount,
                date!(2024 - 06 - 01).replace_day(day).unwrap(),
            );
        }
        let range = DateRange {
            start: date!(2024 - 06 - 02),
            end: date!(2024 - 06 - 04),
        };

        let sums = sum_by_category(TransactionKind::Expense, user.id, range, &connection).unwrap();

        let want: Decimal = ["19.99", "3.50", "100"]
            .iter()
            .map(|amount| Amount::parse(amount).unwrap().as_decimal())
            .sum();
        assert_eq!(sums.get("Food"), Some(&want));
    }

    #[test]
    fn empty_range_has_no_categories() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "alice", "hunter2");
        record(&connection, &user, TransactionKind::Expense, "Food", "1", date!(2024 - 03 - 01));
        let range = DateRange {
            start: date!(2024 - 04 - 01),
            end: date!(2024 - 04 - 30),
        };

        let sums = sum_by_category(TransactionKind::Expense, user.id, range, &connection).unwrap();

        assert!(sums.is_empty());
    }

    #[test]
    fn totals_over_all_time() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "alice", "hunter2");
        record(&connection, &user, TransactionKind::Income, "Salary", "300", date!(2023 - 01 - 15));
        record(&connection, &user, TransactionKind::Expense, "Food", "125", date!(2024 - 01 - 10));
        record(&connection, &user, TransactionKind::Expense, "Food", "200", date!(2024 - 02 - 10));

        let got = totals(user.id, &connection).unwrap();

        assert_eq!(
            got,
            Totals {
                income: dollars(300),
                expense: dollars(325),
                balance: dollars(-25),
            }
        );
    }

    #[test]
    fn totals_without_transactions_are_zero() {
        let connection = get_test_connection();

        assert_eq!(totals(UserID::new(1), &connection), Ok(Totals::default()));
    }

    #[test]
    fn lists_years_newest_first() {
        let connection = get_test_connection();
        let user = insert_test_user(&connection, "alice", "hunter2");
        record(&connection, &user, TransactionKind::Income, "Salary", "1", date!(2022 - 06 - 01));
        record(&connection, &user, TransactionKind::Expense, "Food", "1", date!(2024 - 06 - 01));
        record(&connection, &user, TransactionKind::Expense, "Food", "1", date!(2024 - 07 - 01));

        assert_eq!(
            years_with_transactions(user.id, &connection),
            Ok(vec![2024, 2022])
        );
    }
}
