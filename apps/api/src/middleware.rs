//! Request middleware: session authentication and cross-origin write
//! protection.

use axum::extract::{Request, State};
use axum::http::{Method, header};
use axum::middleware::Next;
use axum::response::Response;
use docman_core::AppError;
use tower_sessions::Session;

use crate::auth::optional_principal;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the session principal and stores it in request extensions.
///
/// Only routes that have no anonymous view sit behind this layer; document
/// reads resolve an optional principal in their handlers instead.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let principal = optional_principal(&session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Rejects write requests that do not originate from the configured
/// frontend.
///
/// Sessions ride on cookies, so writes need a cross-site request forgery
/// guard. Browsers with fetch metadata are handled by `Sec-Fetch-Site`;
/// for the rest the `Origin` header must match the frontend origin
/// exactly, or the `Referer` must resolve to it.
pub async fn block_cross_origin_writes(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if !is_write_method(request.method()) {
        return Ok(next.run(request).await);
    }

    let headers = request.headers();

    let fetch_site = headers
        .get("sec-fetch-site")
        .and_then(|value| value.to_str().ok());
    if fetch_site == Some("cross-site") {
        return Err(AppError::Forbidden("cross-origin write rejected".to_owned()).into());
    }

    let origin_matches = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|origin| origin == state.frontend_url);
    let referer_matches = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|referer| referer_is_from_origin(referer, &state.frontend_url));

    if !(origin_matches || referer_matches) {
        return Err(AppError::Forbidden("request origin is not allowed".to_owned()).into());
    }

    Ok(next.run(request).await)
}

fn is_write_method(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Returns whether `referer` is a URL inside `allowed_origin`.
///
/// The referer carries a full URL, so a bare prefix test would also accept
/// hosts that merely extend the allowed one (`http://app.example.evil`
/// against `http://app.example`). The origin must match exactly, up to a
/// path, query, or fragment boundary.
fn referer_is_from_origin(referer: &str, allowed_origin: &str) -> bool {
    match referer.strip_prefix(allowed_origin) {
        Some(rest) => {
            rest.is_empty()
                || rest.starts_with('/')
                || rest.starts_with('?')
                || rest.starts_with('#')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Method;

    use super::{is_write_method, referer_is_from_origin};

    const ORIGIN: &str = "http://localhost:3000";

    #[test]
    fn reads_pass_without_an_origin_check() {
        assert!(!is_write_method(&Method::GET));
        assert!(!is_write_method(&Method::HEAD));
        assert!(!is_write_method(&Method::OPTIONS));
        assert!(is_write_method(&Method::POST));
        assert!(is_write_method(&Method::PUT));
        assert!(is_write_method(&Method::DELETE));
    }

    #[test]
    fn referer_within_the_origin_is_accepted() {
        assert!(referer_is_from_origin(ORIGIN, ORIGIN));
        assert!(referer_is_from_origin("http://localhost:3000/documents/7", ORIGIN));
        assert!(referer_is_from_origin("http://localhost:3000?tab=drafts", ORIGIN));
    }

    #[test]
    fn referer_from_an_extended_host_is_rejected() {
        assert!(!referer_is_from_origin(
            "http://localhost:3000.evil.example/attack",
            ORIGIN
        ));
        assert!(!referer_is_from_origin("http://localhost:30001/", ORIGIN));
    }

    #[test]
    fn referer_from_another_origin_is_rejected() {
        assert!(!referer_is_from_origin("http://evil.example/", ORIGIN));
        assert!(!referer_is_from_origin("https://localhost:3000/", ORIGIN));
    }
}
