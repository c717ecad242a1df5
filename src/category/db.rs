//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName},
    transaction::TransactionKind,
};

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('expense', 'income')),
            UNIQUE(name, kind)
        )",
        (),
    )?;

    Ok(())
}

/// Create a category and return it with its generated ID.
///
/// # Errors
///
/// Returns an [Error::DuplicateCategory] if a category with the same name and
/// kind already exists.
pub fn create_category(
    name: CategoryName,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, kind) VALUES (?1, ?2)",
        (name.as_ref(), kind),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category { id, name, kind })
}

/// Get the category called `name` of `kind`, creating it if needed.
pub fn get_or_create_category(
    name: &CategoryName,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, kind) VALUES (?1, ?2)
        ON CONFLICT(name, kind) DO NOTHING",
        (name.as_ref(), kind),
    )?;

    connection
        .query_row(
            "SELECT id, name, kind FROM category WHERE name = ?1 AND kind = ?2",
            (name.as_ref(), kind),
            map_row,
        )
        .map_err(Error::from)
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, kind FROM category WHERE id = :id")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(Error::from)
}

/// Retrieve all categories, expense categories first, then by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, kind FROM category ORDER BY kind ASC, name ASC")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Retrieve the categories of `kind` ordered by name.
pub fn get_categories_by_kind(
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, kind FROM category WHERE kind = ?1 ORDER BY name ASC")?
        .query_map([kind], map_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Delete a category by ID.
///
/// Budgets for the category are kept with their category cleared.
///
/// # Errors
///
/// Returns:
/// - [Error::CategoryInUse] if an expense or income refers to the category,
/// - [Error::DeleteMissingCategory] if the category doesn't exist.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let is_in_use: bool = connection.query_row(
        "SELECT EXISTS(SELECT 1 FROM expense WHERE category_id = ?1)
            OR EXISTS(SELECT 1 FROM income WHERE category_id = ?1)",
        [category_id],
        |row| row.get(0),
    )?;

    if is_in_use {
        return Err(Error::CategoryInUse);
    }

    let rows_affected = match connection.execute("DELETE FROM category WHERE id = ?1", [category_id])
    {
        Ok(rows_affected) => rows_affected,
        Err(error) if Error::is_foreign_key_violation(&error) => {
            return Err(Error::CategoryInUse);
        }
        Err(error) => return Err(error.into()),
    };

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// The number of categories of every kind.
pub fn count_categories(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM category", [], |row| row.get(0))
        .map_err(Error::from)
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let kind = row.get(2)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        kind,
    })
}
