//! HTTP response handlers.
//!
//! Every responder returns the status code it sent so the request loop can
//! emit its log line after the response goes out.

use anyhow::{Context, Result};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::error::YokeError;
use crate::preprocess::Transformed;
use crate::utils::mime;

/// Respond with rendered page markup.
pub fn respond_html(request: Request, html: String) -> Result<u16> {
    send_body(request, 200, mime::types::HTML, html.into_bytes())
}

/// Respond with preprocessor output.
pub fn respond_transformed(request: Request, transformed: Transformed) -> Result<u16> {
    send_body(
        request,
        200,
        transformed.content_type,
        transformed.content.into_bytes(),
    )
}

/// Respond with a static file from the base directory.
pub fn respond_file(request: Request, path: &Path) -> Result<u16> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    send_body(request, 200, content_type, body)
}

/// Respond with 404.
pub fn respond_not_found(request: Request) -> Result<u16> {
    if is_head_request(&request) {
        return send_head(request, 404, mime::types::PLAIN);
    }
    send_body(request, 404, mime::types::PLAIN, b"Not Found".to_vec())
}

/// Respond with a per-request failure: HTTP 500, the underlying message as
/// body. Rendering and preprocessing errors are recovered here; they never
/// terminate the server.
pub fn respond_error(request: Request, error: &YokeError) -> Result<u16> {
    let error_string = error.to_string();
    let msg = crate::utils::html::escape(&error_string);
    let body = format!("<html><body><h1>Error</h1><pre>{msg}</pre></body></html>");
    send_body(request, 500, mime::types::HTML, body.into_bytes())
}

/// Respond with a redirect to the remote simulator host.
pub fn respond_redirect(request: Request, location: &str) -> Result<u16> {
    let response = Response::empty(StatusCode(302))
        .with_header(Header::from_bytes("Location", location.as_bytes()).unwrap());
    request.respond(response)?;
    Ok(302)
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<u16> {
    send_body(
        request,
        503,
        mime::types::PLAIN,
        b"503 Service Unavailable".to_vec(),
    )
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<u16> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(status)
}

fn send_body(request: Request, status: u16, content_type: &'static str, body: Vec<u8>) -> Result<u16> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(status)
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
