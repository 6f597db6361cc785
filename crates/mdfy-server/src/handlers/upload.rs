//! Image upload endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};

use crate::error::ServerError;
use crate::handlers::INVALID_REQUEST;
use crate::state::AppState;

/// Multipart field carrying the image.
const UPLOAD_FIELD: &str = "markdown-image-upload";

/// Handle POST {upload}: relay the image to Imgur.
pub(crate) async fn upload_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ServerError> {
    let Some(uploader) = state.uploader.clone() else {
        return Ok(INVALID_REQUEST.into_response());
    };

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_owned();
        let image = field.bytes().await?;
        tracing::info!(name = %name, size = image.len(), "Relaying image upload");

        let reply = tokio::task::spawn_blocking(move || uploader.upload(&name, &image)).await?;
        return Ok(Json(reply).into_response());
    }

    Ok(INVALID_REQUEST.into_response())
}
