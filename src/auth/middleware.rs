//! Authentication middleware that validates the session cookie, extends the
//! session and redirects anonymous users to the log-in page.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{
        StatusCode,
        header::{LOCATION, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{
    AppState,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::{
            build_log_in_redirect_url, build_log_in_redirect_url_from_target, is_htmx_request,
        },
    },
    endpoints,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How far ahead each request pushes the session expiry.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    let log_in_redirect_url = build_log_in_redirect_url(&request).unwrap_or_else(|| {
        tracing::warn!("Could not work out the page to return to. Falling back to the home page.");

        build_log_in_redirect_url_from_target(endpoints::ROOT)
            .unwrap_or_else(|| endpoints::LOG_IN.to_owned())
    });

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Error getting cookie jar: {error:?}. Redirecting to log in page.");
            return get_redirect(&log_in_redirect_url);
        }
    };
    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => {
            tracing::debug!("Rejected auth cookie: {error}");
            return get_redirect(&log_in_redirect_url);
        }
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), state.cookie_duration) {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Error extending cookie duration: {error}. Rolling back cookie jar.");
            jar
        }
    };
    for (key, value) in jar.into_response().headers().iter() {
        if key == SET_COOKIE {
            parts.headers.append(key, value.to_owned());
        }
    }

    Response::from_parts(parts, body)
}

/// Only let requests with a valid session through, redirecting everyone else
/// to the log-in page with `302 Found`.
///
/// Handlers receive the logged in user with `Extension(user_id): Extension<UserID>`.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, found_redirect).await
}

/// Like [auth_guard], but redirects htmx requests with the `HX-Redirect`
/// header so htmx navigates the whole page instead of swapping in the log-in
/// page. Requests without the `HX-Request` header get the usual `302 Found`.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let is_htmx = is_htmx_request(&request);

    auth_guard_internal(state, request, next, |redirect_url| {
        if is_htmx {
            (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
        } else {
            found_redirect(redirect_url)
        }
    })
    .await
}

fn found_redirect(redirect_url: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, redirect_url.to_owned())]).into_response()
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router, middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
    use axum_test::TestServer;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error,
        app_state::create_cookie_key,
        auth::{
            AuthState, COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, UserID, auth_guard, auth_guard_hx,
            set_auth_cookie,
        },
        endpoints,
    };

    async fn whoami(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    async fn stub_log_in_route(jar: PrivateCookieJar) -> Result<PrivateCookieJar, Error> {
        set_auth_cookie(jar, UserID::new(42), Duration::seconds(5))
    }

    const TEST_LOG_IN_ROUTE: &str = "/test_log_in";
    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_PARTIAL_ROUTE: &str = "/partial";

    fn get_test_server(cookie_duration: Duration) -> TestServer {
        let state = AuthState {
            cookie_key: create_cookie_key("nafstenoas"),
            cookie_duration,
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .merge(
                Router::new()
                    .route(TEST_PARTIAL_ROUTE, get(whoami))
                    .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
            )
            .route(TEST_LOG_IN_ROUTE, post(stub_log_in_route))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn want_log_in_location(target: &str) -> String {
        let query = serde_urlencoded::to_string([("redirect_url", target)]).unwrap();
        format!("{}?{}", endpoints::LOG_IN, query)
    }

    #[tokio::test]
    async fn valid_cookie_passes_user_id_to_handler() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let token_cookie = server.post(TEST_LOG_IN_ROUTE).await.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status_ok();
        response.assert_text("42");
    }

    #[tokio::test]
    async fn guard_extends_short_session() {
        let server = get_test_server(Duration::minutes(5));
        let token_cookie = server.post(TEST_LOG_IN_ROUTE).await.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status_ok();
        let expires = response
            .cookie(COOKIE_TOKEN)
            .expires_datetime()
            .expect("cookie should have an expiry");
        let want = OffsetDateTime::now_utc() + Duration::minutes(5);
        assert!(
            (expires - want).abs() < Duration::seconds(2),
            "got expiry {expires:?}, want {want:?}"
        );
    }

    #[tokio::test]
    async fn missing_cookie_redirects_to_log_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(axum::http::StatusCode::FOUND);
        assert_eq!(
            response.header("location"),
            want_log_in_location(TEST_PROTECTED_ROUTE)
        );
    }

    #[tokio::test]
    async fn invalid_cookie_redirects_to_log_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::new(COOKIE_TOKEN, "FOOBAR"))
            .await;

        response.assert_status(axum::http::StatusCode::FOUND);
        assert_eq!(
            response.header("location"),
            want_log_in_location(TEST_PROTECTED_ROUTE)
        );
    }

    #[tokio::test]
    async fn htmx_request_gets_hx_redirect_to_current_page() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server
            .get(TEST_PARTIAL_ROUTE)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", "http://localhost:3000/expenses_list/")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header("hx-redirect"),
            want_log_in_location("/expenses_list/")
        );
    }

    #[tokio::test]
    async fn plain_request_to_partial_gets_found_redirect() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let response = server.get(TEST_PARTIAL_ROUTE).await;

        response.assert_status(axum::http::StatusCode::FOUND);
        assert_eq!(
            response.header("location"),
            want_log_in_location(TEST_PARTIAL_ROUTE)
        );
        assert!(response.maybe_header("hx-redirect").is_none());
    }
}
