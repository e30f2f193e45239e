//! Session and CSRF middleware

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::server::AppState;
use crate::error::Error;
use crate::session::{Session, CSRF_FIELD, CSRF_HEADER};

/// Largest form body the CSRF check will buffer
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Attach a [`Session`] to every request; set the cookie for new sessions
pub(super) async fn session_layer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = state.sessions.load_or_create(request.headers());
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if session.is_new {
        let cookie = state.sessions.set_cookie_header(&session).and_then(|c| {
            HeaderValue::from_str(&c)
                .map_err(|e| Error::session(format!("Invalid cookie header: {e}")))
        });
        match cookie {
            Ok(value) => {
                tracing::debug!(cookie = state.sessions.cookie_name(), "Issued new session");
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "Failed to issue session cookie"),
        }
    }

    response
}

/// Reject state-changing requests without a valid CSRF token for the session
pub(super) async fn csrf_layer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if state.options.skip_csrf || is_safe_method(request.method()) {
        return next.run(request).await;
    }

    let Some(session) = request.extensions().get::<Session>().cloned() else {
        tracing::error!("CSRF check ran without a session");
        return csrf_mismatch();
    };

    let header_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_FORM_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body for CSRF check");
            return (StatusCode::BAD_REQUEST, "Request body too large").into_response();
        }
    };

    let token = header_token.or_else(|| form_field(&bytes, CSRF_FIELD));
    let has_token = token.is_some();
    let verified = token
        .as_deref()
        .is_some_and(|t| state.sessions.verify_csrf(&session, t).is_ok());

    if !verified {
        tracing::warn!(
            uri = %parts.uri,
            has_token,
            new_session = session.is_new,
            "CSRF token mismatch"
        );
        return csrf_mismatch();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn is_safe_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
}

fn csrf_mismatch() -> Response {
    (StatusCode::BAD_REQUEST, Error::CsrfMismatch.to_string()).into_response()
}

/// First value of `name` in a url-encoded body
fn form_field(body: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_field() {
        let body = b"titleInput=a+b&_csrf=tok%2Ben&descriptionInput=x";
        assert_eq!(form_field(body, "_csrf"), Some("tok+en".to_string()));
        assert_eq!(form_field(body, "titleInput"), Some("a b".to_string()));
        assert_eq!(form_field(body, "missing"), None);
    }

    #[test]
    fn test_safe_methods() {
        assert!(is_safe_method(&Method::GET));
        assert!(is_safe_method(&Method::HEAD));
        assert!(!is_safe_method(&Method::POST));
        assert!(!is_safe_method(&Method::DELETE));
    }
}
