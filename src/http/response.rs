//! HTTP response building module
//!
//! Provides builders for the fixed set of responses the server emits.
//! Error bodies are constant plain-text strings; nothing about the request or
//! the filesystem ends up in them.

use hyper::header::{ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use hyper::{Response, StatusCode};
use tokio::fs::File;

use super::body::{self, ResponseBody};

/// Sent with every file response
pub const NO_CACHE: &str = "no-store, no-cache, must-revalidate";

pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Build a plain-text status response
fn build_text_response(status: StatusCode, text: &'static str) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_PLAIN)
        .header(CONTENT_LENGTH, text.len())
        .body(body::full(text))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback(status)
        })
}

/// Build 400 Bad Request response
pub fn build_400_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::BAD_REQUEST, "400 Bad Request")
}

/// Build 403 Forbidden response
pub fn build_403_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::FORBIDDEN, "403 Forbidden")
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    let mut response =
        build_text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, hyper::header::HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ALLOW, ALLOWED_METHODS)
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            fallback(StatusCode::NO_CONTENT)
        })
}

/// Build a redirect with an explicit status (301 or 302)
pub fn build_redirect_response_with_code(target: &str, code: StatusCode) -> Response<ResponseBody> {
    Response::builder()
        .status(code)
        .header(LOCATION, target)
        .header(CONTENT_LENGTH, 0)
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error(code.as_str(), &e);
            build_500_response()
        })
}

/// Build 200 response streaming an already opened file.
///
/// For HEAD the handle is dropped right away and only the headers go out.
pub fn build_file_response(
    file: File,
    content_length: u64,
    content_type: &'static str,
    is_head: bool,
) -> Response<ResponseBody> {
    let body = if is_head {
        drop(file);
        body::empty()
    } else {
        body::file_stream(file)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length)
        .header(CACHE_CONTROL, NO_CACHE)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            build_500_response()
        })
}

fn fallback(status: StatusCode) -> Response<ResponseBody> {
    let mut response = Response::new(body::empty());
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
