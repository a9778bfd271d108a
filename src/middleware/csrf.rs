use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use url::Url;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    session::Session,
};

type HmacSha256 = Hmac<Sha256>;

pub const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");
pub const CSRF_FIELD: &str = "_csrf";
const MAX_FORM_BYTES: usize = 1024 * 1024;
const HANDLER_CHECKED_PREFIX: &str = "/admin/products";

fn mac(secret: &str, session_id: Uuid) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(session_id.to_string().as_bytes());
    Some(mac)
}

pub fn generate_token(secret: &str, session_id: Uuid) -> String {
    mac(secret, session_id)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

pub fn verify_token(secret: &str, session_id: Uuid, submitted: Option<&str>) -> bool {
    let Some(submitted) = submitted.map(str::trim).filter(|t| !t.is_empty()) else {
        return false;
    };
    let Ok(bytes) = hex::decode(submitted) else {
        return false;
    };
    mac(secret, session_id).is_some_and(|mac| mac.verify_slice(&bytes).is_ok())
}

/// Token for the current session, creating the secret if needed.
pub fn session_token(session: &Session) -> String {
    generate_token(&session.csrf_secret(), session.id())
}

/// A session without an issued secret has never been handed a token, so
/// nothing it submits can be valid.
fn verify_session(session: &Session, submitted: Option<&str>) -> bool {
    session
        .issued_csrf_secret()
        .is_some_and(|secret| verify_token(&secret, session.id(), submitted))
}

/// Check a token taken from an already parsed body (multipart forms).
pub fn verify_submitted(session: &Session, headers: &HeaderMap, submitted: Option<&str>) -> AppResult<()> {
    let submitted = header_token(headers).or_else(|| submitted.map(str::to_string));
    if verify_session(session, submitted.as_deref()) {
        Ok(())
    } else {
        Err(AppError::InvalidCsrfToken {
            back: back_target(headers),
        })
    }
}

fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(&CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Where a rejected request is sent back to: the referring page when it is
/// on this host, `/` otherwise.
fn back_target(headers: &HeaderMap) -> String {
    let Some(referer) = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
    else {
        return "/".to_string();
    };

    if referer.starts_with('/') && !referer.starts_with("//") && !referer.contains('\\') {
        return referer.to_string();
    }

    let host = headers.get(header::HOST).and_then(|value| value.to_str().ok());
    match (Url::parse(referer), host) {
        (Ok(url), Some(host)) if matches!(url.scheme(), "http" | "https") && same_host(&url, host) => {
            match url.query() {
                Some(query) => format!("{}?{query}", url.path()),
                None => url.path().to_string(),
            }
        }
        _ => "/".to_string(),
    }
}

fn same_host(url: &Url, host: &str) -> bool {
    let Some(name) = url.host_str() else {
        return false;
    };
    let authority = match url.port() {
        Some(port) => format!("{name}:{port}"),
        None => name.to_string(),
    };
    authority.eq_ignore_ascii_case(host)
}

fn is_exempt(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Multipart routes whose handlers verify the `_csrf` field after parsing:
/// product create (`/admin/products`) and update (`/admin/products/{id}`).
fn checked_by_handler(method: &Method, path: &str) -> bool {
    if *method != Method::POST {
        return false;
    }
    let Some(rest) = path.strip_prefix(HANDLER_CHECKED_PREFIX) else {
        return false;
    };
    match rest.trim_end_matches('/') {
        "" => true,
        rest => rest
            .strip_prefix('/')
            .is_some_and(|id| !id.is_empty() && !id.contains('/')),
    }
}

#[derive(Deserialize)]
struct CsrfField {
    #[serde(rename = "_csrf")]
    csrf: Option<String>,
}

fn token_from_body(content_type: &str, bytes: &[u8]) -> Option<String> {
    if content_type.starts_with("application/json") {
        serde_json::from_slice::<CsrfField>(bytes)
            .ok()
            .and_then(|field| field.csrf)
    } else {
        url::form_urlencoded::parse(bytes)
            .find(|(key, _)| key == CSRF_FIELD)
            .map(|(_, value)| value.into_owned())
    }
}

/// Reject state-changing requests that do not echo the session's token.
/// Product forms are multipart and checked by their handler; any other
/// multipart request must carry the token in the header.
pub async fn csrf_guard(request: Request, next: Next) -> AppResult<Response> {
    let session = request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session layer is not installed")))?;
    let multipart = content_type(request.headers()).starts_with("multipart/form-data");
    let request = if is_exempt(request.method())
        || (multipart && checked_by_handler(request.method(), request.uri().path()))
    {
        request
    } else {
        let (parts, body) = request.into_parts();
        let (submitted, body) = match header_token(&parts.headers) {
            Some(token) => (Some(token), body),
            None if multipart => (None, body),
            None => {
                let bytes = to_bytes(body, MAX_FORM_BYTES)
                    .await
                    .map_err(|_| AppError::BadRequest("Request body is too large".into()))?;
                (token_from_body(content_type(&parts.headers), &bytes), Body::from(bytes))
            }
        };

        if !verify_session(&session, submitted.as_deref()) {
            tracing::warn!(method = %parts.method, uri = %parts.uri, "rejected request with invalid csrf token");
            return Err(AppError::InvalidCsrfToken {
                back: back_target(&parts.headers),
            });
        }
        Request::from_parts(parts, body)
    };

    let mut response = next.run(request).await;
    // login rotates the session id, so sign with the id the session has now
    if let Some(secret) = session.issued_csrf_secret() {
        if let Ok(value) = HeaderValue::from_str(&generate_token(&secret, session.id())) {
            response.headers_mut().insert(CSRF_HEADER, value);
        }
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_for_the_same_session() {
        let id = Uuid::new_v4();
        let token = generate_token("secret", id);
        assert_eq!(token.len(), 64);
        assert!(verify_token("secret", id, Some(&token)));
    }

    #[test]
    fn token_is_bound_to_session_and_secret() {
        let id = Uuid::new_v4();
        let token = generate_token("secret", id);
        assert!(!verify_token("secret", Uuid::new_v4(), Some(&token)));
        assert!(!verify_token("other", id, Some(&token)));
        assert!(!verify_token("secret", id, None));
        assert!(!verify_token("secret", id, Some("not-hex")));
    }

    #[test]
    fn reads_token_from_form_and_json_bodies() {
        assert_eq!(
            token_from_body("application/x-www-form-urlencoded", b"quantity=2&_csrf=abc"),
            Some("abc".to_string())
        );
        assert_eq!(
            token_from_body("application/json", br#"{"_csrf":"abc","quantity":2}"#),
            Some("abc".to_string())
        );
        assert_eq!(token_from_body("application/json", b"{}"), None);
    }

    #[test]
    fn only_product_forms_skip_the_multipart_check() {
        assert!(checked_by_handler(&Method::POST, "/admin/products"));
        assert!(checked_by_handler(&Method::POST, "/admin/products/"));
        assert!(checked_by_handler(
            &Method::POST,
            "/admin/products/1b4e28ba-2fa1-11d2-883f-0016d3cca427"
        ));
        assert!(!checked_by_handler(
            &Method::POST,
            "/admin/products/1b4e28ba-2fa1-11d2-883f-0016d3cca427/delete"
        ));
        assert!(!checked_by_handler(&Method::POST, "/admin/productsx"));
        assert!(!checked_by_handler(&Method::POST, "/cart/1/remove"));
        assert!(!checked_by_handler(&Method::DELETE, "/admin/products"));
    }

    fn referer_headers(referer: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("shop.example:3000"));
        headers.insert(header::REFERER, HeaderValue::from_str(referer).unwrap());
        headers
    }

    #[test]
    fn back_target_stays_on_this_site() {
        assert_eq!(back_target(&referer_headers("/cart")), "/cart");
        assert_eq!(
            back_target(&referer_headers("http://shop.example:3000/products/abc?tab=reviews")),
            "/products/abc?tab=reviews"
        );
        assert_eq!(back_target(&referer_headers("https://evil.example/phish")), "/");
        assert_eq!(back_target(&referer_headers("//evil.example/phish")), "/");
        assert_eq!(back_target(&referer_headers("javascript:alert(1)")), "/");
        assert_eq!(back_target(&HeaderMap::new()), "/");
    }

    #[test]
    fn fresh_session_has_no_valid_token() {
        let session = Session::fresh();
        let forged = generate_token("guess", session.id());
        assert!(!verify_session(&session, Some(&forged)));

        let token = session_token(&session);
        assert!(verify_session(&session, Some(&token)));
    }
}
