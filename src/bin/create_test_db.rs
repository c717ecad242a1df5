use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use budget_tracker::{
    Amount, CategoryName, NewTransaction, PasswordHash, TransactionKind, Username,
    ValidatedPassword, create_budget, create_transaction, create_user, get_or_create_category,
    initialize_db,
};

/// A utility for creating a test database for the budget tracker server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const EXPENSES: [(&str, &str, i64, &str); 6] = [
    ("Groceries", "84.20", 2, "weekly shop"),
    ("Rent", "450.00", 7, ""),
    ("Transport", "12.50", 9, "bus card top up"),
    ("Groceries", "61.35", 16, ""),
    ("Eating out", "38.00", 40, "birthday dinner"),
    ("Rent", "450.00", 37, ""),
];

const INCOMES: [(&str, &str, i64, &str); 3] = [
    ("Salary", "2350.00", 1, ""),
    ("Salary", "2350.00", 31, ""),
    ("Gifts", "50.00", 20, "from grandma"),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user \"test\" with the password \"test\"...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(&Username::new_unchecked("test"), &password_hash, &conn)?;

    println!("Creating budgets...");

    let groceries = get_or_create_category(
        &CategoryName::new("Groceries")?,
        TransactionKind::Expense,
        &conn,
    )?;
    create_budget(user.id, Some(groceries.id), Amount::ZERO, &conn)?;
    create_budget(user.id, None, Amount::ZERO, &conn)?;

    println!("Creating transactions...");

    let today = OffsetDateTime::now_utc().date();

    for (kind, rows) in [
        (TransactionKind::Expense, EXPENSES.as_slice()),
        (TransactionKind::Income, INCOMES.as_slice()),
    ] {
        for (category, amount, days_ago, comment) in rows {
            insert(&conn, user.id, kind, category, amount, today - Duration::days(*days_ago), comment)?;
        }
    }

    println!("Success!");

    Ok(())
}

fn insert(
    conn: &Connection,
    user_id: budget_tracker::UserID,
    kind: TransactionKind,
    category: &str,
    amount: &str,
    date: Date,
    comment: &str,
) -> Result<(), budget_tracker::Error> {
    let category = get_or_create_category(&CategoryName::new(category)?, kind, conn)?;
    let transaction =
        NewTransaction::new(user_id, category.id, Amount::parse(amount)?, date).comment(comment);

    create_transaction(kind, transaction, conn)?;

    Ok(())
}
