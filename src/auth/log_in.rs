//! The log-in page and the handler for log-in form submissions.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        get_user_by_username, invalidate_auth_cookie, redirect::normalize_redirect_url,
        set_auth_cookie,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        loading_spinner, log_in_register, password_input,
    },
};

/// How long the session lasts if the user ticks "remember me".
pub const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect username or password.";

const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

fn log_in_form(username: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            div
            {
                label for="username" class=(FORM_LABEL_STYLE) { "Username" }

                input
                    type="text"
                    name="username"
                    id="username"
                    autocomplete="username"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(username);
            }

            (password_input("", 0, error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a href=(endpoints::REGISTER) tabindex="0" class=(LINK_STYLE) { "Register here" }
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    let redirect_url = raw_url.and_then(normalize_redirect_url);

    if let (None, Some(raw_url)) = (&redirect_url, raw_url) {
        tracing::warn!("Invalid redirect URL from {source}: {raw_url}");
    }

    redirect_url
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &log_in_form);

    base("Log In", &[], &content).into_response()
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a session lasts without "remember me".
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// A checkbox: any value means "remember me", absent means don't.
    pub remember_me: Option<String>,

    /// Where to go after logging in. Only local paths are honoured.
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On success the auth cookie is set and the client is redirected to
/// `redirect_url`, or the home page. Otherwise the form is returned with an
/// error message. The same message is used for an unknown username and a wrong
/// password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();
    let username = user_data.username.trim();

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("Could not acquire database lock: {error}");
                return log_in_form(username, Some(INTERNAL_ERROR_MSG), redirect_url)
                    .into_response();
            }
        };

        match get_user_by_username(username, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                tracing::warn!("Log-in attempt for unknown user {username:?}");
                return log_in_form(username, Some(INVALID_CREDENTIALS_ERROR_MSG), redirect_url)
                    .into_response();
            }
            Err(error) => {
                tracing::error!("Unhandled error while verifying credentials: {error}");
                return log_in_form(username, Some(INTERNAL_ERROR_MSG), redirect_url)
                    .into_response();
            }
        }
    };

    match user.password_hash.verify(&user_data.password) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("Incorrect password for user {username:?}");
            return log_in_form(username, Some(INVALID_CREDENTIALS_ERROR_MSG), redirect_url)
                .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_form(username, Some(INTERNAL_ERROR_MSG), redirect_url).into_response();
        }
    }

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let redirect_url = redirect_url.unwrap_or(endpoints::ROOT);

    match set_auth_cookie(jar.clone(), user.id, cookie_duration) {
        Ok(updated_jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(redirect_url.to_owned()),
            updated_jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
                .into_response()
        }
    }
}


#[cfg(test)]
mod log_in_tests {
    use axum::{
        Form,
        extract::State,
        http::{StatusCode, header::SET_COOKIE},
        response::Response,
    };
    use axum_extra::extract::PrivateCookieJar;

    use crate::{
        app_state::create_cookie_key,
        auth::DEFAULT_COOKIE_DURATION,
        endpoints,
        test_utils::{
            assert_hx_redirect, assert_valid_html, get_test_connection, insert_test_user,
            parse_html_fragment,
        },
    };

    use super::{INVALID_CREDENTIALS_ERROR_MSG, LogInData, LoginState, post_log_in};

    fn get_test_state() -> LoginState {
        let connection = get_test_connection();
        insert_test_user(&connection, "alice", "correct-horse");

        LoginState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: std::sync::Arc::new(std::sync::Mutex::new(connection)),
        }
    }

    async fn log_in(state: LoginState, form: LogInData) -> Response {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        post_log_in(State(state), jar, Form(form)).await
    }

    fn form(username: &str, password: &str, redirect_url: Option<&str>) -> LogInData {
        LogInData {
            username: username.to_owned(),
            password: password.to_owned(),
            remember_me: None,
            redirect_url: redirect_url.map(str::to_owned),
        }
    }

    #[track_caller]
    fn assert_set_cookie(response: &Response) {
        assert!(
            response.headers().get(SET_COOKIE).is_some(),
            "want Set-Cookie header, got headers {:?}",
            response.headers()
        );
    }

    async fn assert_credentials_error(response: Response) {
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());

        let fragment = parse_html_fragment(response).await;
        assert_valid_html(&fragment);
        let selector = scraper::Selector::parse("input#password + p.text-red-500").unwrap();
        let message = fragment
            .select(&selector)
            .next()
            .expect("password error message missing")
            .text()
            .collect::<String>();
        assert_eq!(message.trim(), INVALID_CREDENTIALS_ERROR_MSG);
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let response = log_in(get_test_state(), form("alice", "correct-horse", None)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ROOT);
        assert_set_cookie(&response);
    }

    #[tokio::test]
    async fn log_in_redirects_to_requested_url() {
        let redirect_url = "/charts/?year=2024";

        let response = log_in(
            get_test_state(),
            form("alice", "correct-horse", Some(redirect_url)),
        )
        .await;

        assert_hx_redirect(&response, redirect_url);
    }

    #[tokio::test]
    async fn log_in_falls_back_on_invalid_redirect_url() {
        let response = log_in(
            get_test_state(),
            form("alice", "correct-horse", Some("https://example.com")),
        )
        .await;

        assert_hx_redirect(&response, endpoints::ROOT);
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let response = log_in(get_test_state(), form("alice", "wrong-horse", None)).await;

        assert_credentials_error(response).await;
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_username() {
        let response = log_in(get_test_state(), form("bob", "correct-horse", None)).await;

        assert_credentials_error(response).await;
    }
}
