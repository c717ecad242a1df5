//! Reading and writing the auth cookie.
//!
//! The cookie holds a JSON encoded [Token] and lives in a private cookie jar,
//! so the client can neither read nor forge it.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    auth::{Token, UserID},
};

/// The name of the cookie holding the session token.
pub const COOKIE_TOKEN: &str = "token";

/// How long a session lasts without "remember me".
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Log in `user_id` by adding a token cookie that expires after `duration`.
///
/// # Errors
///
/// Returns an [Error::JSONSerializationError] if the token could not be
/// serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = Token::new(user_id, OffsetDateTime::now_utc(), duration);

    set_token(jar, &token)
}

fn set_token(jar: PrivateCookieJar, token: &Token) -> Result<PrivateCookieJar, Error> {
    let token_json = serde_json::to_string(token)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token_json))
            .path("/")
            .expires(token.expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Read the session token from `jar`.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if there is no token cookie,
/// - [Error::InvalidToken] if the cookie does not hold a token,
/// - [Error::TokenExpired] if the token has expired.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;
    let token: Token = serde_json::from_str(cookie.value_trimmed())
        .map_err(|error| Error::InvalidToken(error.to_string()))?;

    if token.is_expired(OffsetDateTime::now_utc()) {
        return Err(Error::TokenExpired);
    }

    Ok(token)
}

/// Push the token expiry out to `duration` from now, unless it already
/// expires later than that.
///
/// # Errors
///
/// Returns the same errors as [get_token_from_cookies]. The jar is unchanged
/// when an error is returned.
pub fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;
    let extended = Token::new(token.user_id, OffsetDateTime::now_utc(), duration);

    if token.expires_at >= extended.expires_at {
        return Ok(jar);
    }

    set_token(jar, &extended)
}

/// Replace the token cookie with one that has already expired, which makes
/// the client delete it.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}
