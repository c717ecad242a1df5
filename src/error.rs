//! The crate-wide error type and how each error is presented to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert, category::CategoryId, internal_server_error::InternalServerError,
    not_found::get_404_not_found_response, transaction::TransactionKind,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth cookie could not be decoded into a session token.
    #[error("could not parse the auth token: {0}")]
    InvalidToken(String),

    /// The session token in the auth cookie has expired.
    #[error("the auth token has expired")]
    TokenExpired,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The username is empty, too long or contains characters other than
    /// letters, digits and `@.+-_`.
    #[error("{0}")]
    InvalidUsername(String),

    /// The username is already taken by another user.
    #[error("a user with that username already exists")]
    DuplicateUsername,

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A category name longer than the allowed number of characters.
    #[error("Category name cannot be longer than {0} characters")]
    CategoryNameTooLong(usize),

    /// A string that is neither "expense" nor "income" was used as a category kind.
    #[error("\"{0}\" is not a valid category type, expected \"expense\" or \"income\"")]
    InvalidCategoryKind(String),

    /// A category with the same name and kind already exists.
    #[error("a category with that name and type already exists")]
    DuplicateCategory,

    /// The category ID used to create a record did not match a valid category.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// A transaction was recorded against a category of the other kind, e.g.
    /// an expense against an income category.
    #[error("the category is not an {0} category")]
    CategoryKindMismatch(TransactionKind),

    /// Tried to delete a category that is still referenced by transactions.
    #[error("the category is used by existing transactions")]
    CategoryInUse,

    /// Tried to delete a category that does not exist.
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// A money amount could not be parsed or is out of range.
    #[error("{0}")]
    InvalidAmount(String),

    /// A date string was not in the `YYYY-MM-DD` format.
    #[error("\"{0}\" is not a valid date, expected the format YYYY-MM-DD")]
    InvalidDate(String),

    /// A year that has no representable calendar dates.
    #[error("{0} is not a supported year")]
    InvalidYear(i32),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An error occurred while writing the CSV report.
    #[error("could not write the CSV report: {0}")]
    CsvError(String),

    /// An error occurred while rendering the PDF report.
    #[error("could not render the PDF report: {0}")]
    PdfError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

/// Extended result code for a failed UNIQUE constraint.
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;
/// Extended result code for a failed FOREIGN KEY constraint.
const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("category.name") =>
            {
                Error::DuplicateCategory
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// Whether `error` is a failed foreign key constraint.
    pub(crate) fn is_foreign_key_violation(error: &rusqlite::Error) -> bool {
        matches!(
            error,
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == SQLITE_CONSTRAINT_FOREIGNKEY
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as an alert fragment for HTMX requests.
    ///
    /// The status code tells HTMX which response target to swap the alert into.
    pub(crate) fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                        ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: format!("Could not find a category with the ID {category_id}"),
                },
            ),
            Error::CategoryKindMismatch(kind) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: format!("Choose an {kind} category for this {kind}."),
                },
            ),
            Error::DuplicateCategory => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Duplicate category".to_owned(),
                    details: "A category with that name and type already exists.".to_owned(),
                },
            ),
            Error::CategoryInUse => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category is used by existing expenses or incomes. \
                        Categories can only be deleted once nothing refers to them."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                        Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::ErrorSimple {
                    message: "The requested resource could not be found.".to_owned(),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details: "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}
