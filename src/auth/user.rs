//! User accounts and their storage.

use std::fmt::Display;

use rusqlite::{Connection, Row, ToSql, types::ToSqlOutput};
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// The maximum number of characters in a username.
pub const USERNAME_MAX_LENGTH: usize = 150;

/// The database ID of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserID(i64);

impl UserID {
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for UserID {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

/// A validated username: 1 to 150 letters, digits and `@.+-_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    /// Validate a username. Surrounding whitespace is removed first.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidUsername] if the username is empty, too long
    /// or contains a character that is not allowed.
    pub fn new(raw_username: &str) -> Result<Self, Error> {
        let username = raw_username.trim();

        if username.is_empty() {
            return Err(Error::InvalidUsername("Username cannot be empty".to_owned()));
        }

        if username.chars().count() > USERNAME_MAX_LENGTH {
            return Err(Error::InvalidUsername(format!(
                "Username cannot be longer than {USERNAME_MAX_LENGTH} characters"
            )));
        }

        if let Some(invalid) = username
            .chars()
            .find(|c| !(c.is_alphanumeric() || "@.+-_".contains(*c)))
        {
            return Err(Error::InvalidUsername(format!(
                "Username cannot contain {invalid:?}, only letters, digits and @.+-_ are allowed"
            )));
        }

        Ok(Self(username.to_owned()))
    }

    pub fn new_unchecked(username: &str) -> Self {
        Self(username.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserID,
    pub username: Username,
    pub password_hash: PasswordHash,
}

/// Create the user table.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
            )",
        (),
    )?;

    Ok(())
}

/// Add a user to the database.
///
/// # Errors
///
/// Returns an [Error::DuplicateUsername] if the username is taken, or an
/// [Error::SqlError] for any other SQL error.
pub fn create_user(
    username: &Username,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (username, password) VALUES (?1, ?2)",
        (username.as_str(), password_hash.to_string()),
    )?;

    Ok(User {
        id: UserID::new(connection.last_insert_rowid()),
        username: username.clone(),
        password_hash: password_hash.clone(),
    })
}

/// Get the user with `id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if there is no such user.
pub fn get_user_by_id(id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .query_row(
            "SELECT id, username, password FROM user WHERE id = ?1",
            [id],
            map_row,
        )
        .map_err(Error::from)
}

/// Get the user with `username`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if there is no such user.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .query_row(
            "SELECT id, username, password FROM user WHERE username = ?1",
            [username.trim()],
            map_row,
        )
        .map_err(Error::from)
}

/// Replace the password of the user with `id`.
///
/// # Errors
///
/// Returns an [Error::NotFound] if there is no such user.
pub fn update_password(
    id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.to_string(), id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Get the number of registered users.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user", [], |row| row.get(0))
        .map_err(Error::from)
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: Username::new_unchecked(&row.get::<_, String>(1)?),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

#[cfg(test)]
mod username_tests {
    use crate::Error;

    use super::{USERNAME_MAX_LENGTH, Username};

    #[test]
    fn accepts_allowed_characters() {
        let username = Username::new(" jane.doe+budget@home-1_ ").unwrap();

        assert_eq!(username.as_str(), "jane.doe+budget@home-1_");
    }

    #[test]
    fn rejects_empty_username() {
        assert!(matches!(
            Username::new("   "),
            Err(Error::InvalidUsername(_))
        ));
    }

    #[test]
    fn rejects_spaces_and_symbols() {
        for raw in ["jane doe", "jane!", "<script>"] {
            assert!(
                matches!(Username::new(raw), Err(Error::InvalidUsername(_))),
                "want {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn rejects_long_username() {
        let max = "a".repeat(USERNAME_MAX_LENGTH);
        let too_long = "a".repeat(USERNAME_MAX_LENGTH + 1);

        assert!(Username::new(&max).is_ok());
        assert!(matches!(
            Username::new(&too_long),
            Err(Error::InvalidUsername(_))
        ));
    }
}
