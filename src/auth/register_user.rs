//! The registration page for creating a new account.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    auth::{PasswordHash, Username, ValidatedPassword, create_user},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, base, field_error, loading_spinner, log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    validation::ValidationErrors,
};

/// The minimum number of characters the password should have to be accepted
/// by the browser. The server checks the strength on top of this.
const PASSWORD_INPUT_MIN_LENGTH: u8 = 12;

const USERNAME_FIELD: &str = "username";
const PASSWORD_FIELD: &str = "password";
const CONFIRM_PASSWORD_FIELD: &str = "confirm_password";

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label for="confirm-password" class=(FORM_LABEL_STYLE) { "Confirm Password" }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()];

            @if let Some(error_message) = error_message
            {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }
        }
    }
}

fn registration_form(username: &str, errors: &ValidationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="username" class=(FORM_LABEL_STYLE) { "Username" }

                input
                    type="text"
                    name="username"
                    id="username"
                    autocomplete="username"
                    maxlength="150"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(username);

                (field_error(errors, USERNAME_FIELD))
            }

            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.message_for(PASSWORD_FIELD)))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.message_for(CONFIRM_PASSWORD_FIELD)))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a href=(endpoints::LOG_IN) tabindex="0" class=(LINK_STYLE) { "Log in here" }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", &ValidationErrors::new());
    let content = log_in_register("Create an account", &registration_form);

    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost for new password hashes.
    pub password_hash_cost: u32,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_hash_cost: PasswordHash::DEFAULT_COST,
        }
    }
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

fn validate_registration(form: &RegisterForm) -> Result<(Username, ValidatedPassword), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let username = Username::new(&form.username)
        .map_err(|error| errors.push(USERNAME_FIELD, error.to_string()))
        .ok();

    let password = ValidatedPassword::new(&form.password, &[form.username.trim()])
        .map_err(|error| errors.push(PASSWORD_FIELD, error.to_string()))
        .ok();

    if form.password != form.confirm_password {
        errors.push(CONFIRM_PASSWORD_FIELD, "Passwords do not match");
    }

    match (username, password) {
        (Some(username), Some(password)) => errors.into_result((username, password)),
        _ => Err(errors),
    }
}

/// Create an account from the registration form and send the user to the
/// log-in page.
///
/// Invalid input, including a taken username, re-renders the form with the
/// problems next to the fields.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let (username, password) = match validate_registration(&form) {
        Ok(validated) => validated,
        Err(errors) => return registration_form(&form.username, &errors).into_response(),
    };

    let password_hash = match PasswordHash::new(password, state.password_hash_cost) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    match create_user(&username, &password_hash, &connection) {
        Ok(user) => {
            tracing::info!("Registered user {} with ID {}", user.username, user.id);
            (
                HxRedirect(endpoints::LOG_IN.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::DuplicateUsername) => {
            let mut errors = ValidationErrors::new();
            errors.push(USERNAME_FIELD, Error::DuplicateUsername.to_string());
            registration_form(&form.username, &errors).into_response()
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            get_internal_server_error_redirect()
        }
    }
}
