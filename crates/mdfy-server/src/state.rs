//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use mdfy_renderer::{Markdownify, UserDirectory};

use crate::ServerConfig;
use crate::upload::ImgurUploader;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Markdown to sanitized HTML pipeline.
    pub(crate) markdownify: Arc<Markdownify>,
    /// User directory backing the search endpoint.
    pub(crate) directory: Arc<dyn UserDirectory>,
    /// Imgur relay (if credentials are configured).
    pub(crate) uploader: Option<ImgurUploader>,
    /// Endpoint paths and front-end settings.
    pub(crate) config: ServerConfig,
}

impl AppState {
    pub(crate) fn new(
        config: ServerConfig,
        markdownify: Arc<Markdownify>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let uploader = config.imgur.clone().map(ImgurUploader::new);
        Self {
            markdownify,
            directory,
            uploader,
            config,
        }
    }

    /// Check if the upload endpoint is served.
    #[must_use]
    pub(crate) fn upload_enabled(&self) -> bool {
        self.uploader.is_some() && !self.config.upload_path.is_empty()
    }
}
