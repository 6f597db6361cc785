//! Hardening headers added to every response.
//!
//! Endpoint responses are HTML fragments and JSON that the editor page fetches
//! and inserts itself; none is ever loaded as a document. No
//! Content-Security-Policy is set here because the page embedding the editor
//! owns that policy, and a policy on a fragment response has no effect.

use axum::http::HeaderValue;
use axum::http::header::{self, HeaderName};
use tower_http::set_header::SetResponseHeaderLayer;

/// Forbid MIME sniffing, so a rendered fragment is never run as script.
pub(crate) fn nosniff_layer() -> SetResponseHeaderLayer<HeaderValue> {
    overriding(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
}

/// Forbid framing any endpoint response.
pub(crate) fn deny_framing_layer() -> SetResponseHeaderLayer<HeaderValue> {
    overriding(header::X_FRAME_OPTIONS, "DENY")
}

fn overriding(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
}
