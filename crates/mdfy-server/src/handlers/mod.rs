//! HTTP request handlers.

pub(crate) mod config;
pub(crate) mod markdownify;
pub(crate) mod search;
pub(crate) mod upload;

/// Body returned for requests the editor endpoints do not accept.
pub(crate) const INVALID_REQUEST: &str = "Invalid request!";

/// Fallback for unsupported methods on the editor endpoints.
pub(crate) async fn invalid_request() -> &'static str {
    INVALID_REQUEST
}
