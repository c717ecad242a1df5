//! Working out where to send a user after they log in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map_or(redirect_url, |(path, _)| path);

    path != endpoints::LOG_IN && path != endpoints::LOG_OUT
}

/// Reduce `raw_url` to a path and query on this site.
///
/// Returns `None` for absolute URLs, protocol relative URLs and the log-in
/// and log-out pages, so a crafted link cannot send the user elsewhere.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// Whether `request` was sent by htmx.
pub fn is_htmx_request(request: &Request) -> bool {
    request
        .headers()
        .get("hx-request")
        .and_then(|header| header.to_str().ok())
        .is_some_and(|header| header.eq_ignore_ascii_case("true"))
}

/// The log-in URL with the page the user was trying to reach as the
/// `redirect_url` query parameter.
///
/// For htmx requests the target is the page the user is on (`HX-Current-URL`),
/// not the partial being fetched.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let redirect_target = if is_htmx_request(request) {
        redirect_target_from_hx_current_url(request)?
    } else {
        normalize_redirect_url(request.uri().path_and_query()?.as_str())?
    };

    build_log_in_redirect_url_from_target(&redirect_target)
}

pub fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::LOG_IN, param)),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}

fn redirect_target_from_hx_current_url(request: &Request) -> Option<String> {
    let Some(current_url) = request
        .headers()
        .get("hx-current-url")
        .and_then(|header| header.to_str().ok())
    else {
        tracing::warn!("Missing HX-Current-URL header for htmx request.");
        return None;
    };

    // HX-Current-URL is absolute, so only keep the path and query.
    let redirect_url = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_owned()))
        .filter(|path_and_query| is_safe_redirect_url(path_and_query));

    if redirect_url.is_none() {
        tracing::warn!("Invalid HX-Current-URL header value: {current_url}");
    }

    redirect_url
}
