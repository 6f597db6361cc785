//! Markdown preview endpoint.

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::response::Html;
use serde::Deserialize;

use crate::error::ServerError;
use crate::state::AppState;

/// Form body for the preview endpoint.
#[derive(Deserialize)]
pub(crate) struct MarkdownifyForm {
    #[serde(default)]
    content: String,
}

/// Handle POST {markdownify}: render `content` to sanitized HTML.
pub(crate) async fn markdownify(
    State(state): State<Arc<AppState>>,
    Form(form): Form<MarkdownifyForm>,
) -> Result<Html<String>, ServerError> {
    let markdownify = Arc::clone(&state.markdownify);
    let html = tokio::task::spawn_blocking(move || markdownify.render(&form.content)).await??;
    Ok(Html(html))
}
