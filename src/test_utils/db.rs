use rusqlite::Connection;

use crate::{
    auth::{PasswordHash, User, Username, ValidatedPassword, create_user},
    db::initialize,
};

/// An in-memory database with all of the application tables.
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// Insert a user with a cheap password hash.
pub(crate) fn insert_test_user(connection: &Connection, username: &str, password: &str) -> User {
    let password_hash =
        PasswordHash::new(ValidatedPassword::new_unchecked(password), 4).expect("Could not hash password");

    create_user(&Username::new_unchecked(username), &password_hash, connection)
        .expect("Could not create test user")
}
