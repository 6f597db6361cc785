//! Server error types.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mdfy_renderer::{LookupError, RenderError};

/// Error returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    #[error("failed to render markdown: {0}")]
    Render(#[from] RenderError),

    #[error("user search failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Multipart(e) => e.status(),
            Self::Render(_) | Self::Lookup(_) | Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Rejected request");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_is_internal() {
        let err = ServerError::from(RenderError::Lookup(LookupError::Unavailable(
            "down".to_owned(),
        )));

        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_message_includes_cause() {
        let err = ServerError::from(LookupError::Unavailable("down".to_owned()));

        assert_eq!(
            err.to_string(),
            "user search failed: user directory unavailable: down"
        );
    }
}
