//! HTTP server for the mdfy markdown editor.
//!
//! Serves the three endpoints an editor widget talks to:
//! - markdown preview (`POST`, form field `content`, returns HTML)
//! - user search for mention autocomplete (`GET ?username=`)
//! - image upload relayed to Imgur (`POST`, multipart)
//!
//! plus `GET /api/config` with the feature flags and endpoint URLs the
//! front-end needs. Endpoint paths come from configuration; an empty path
//! disables that endpoint.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use mdfy_config::Config;
//! use mdfy_server::{build_pipeline, load_directory, run_server, server_config_from_mdfy_config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load(None, None).unwrap();
//!     let directory = load_directory(&config).unwrap();
//!     let markdownify = build_pipeline(&config, Arc::clone(&directory)).unwrap();
//!
//!     run_server(
//!         server_config_from_mdfy_config(&config),
//!         Arc::new(markdownify),
//!         directory,
//!     )
//!     .await
//!     .unwrap();
//! }
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod setup;
mod state;
mod upload;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use mdfy_renderer::{Markdownify, UserDirectory};
use serde::Serialize;

pub use setup::{allow_list_from_config, build_pipeline, load_directory};

use state::AppState;

/// Imgur API credentials used by the upload relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImgurCredentials {
    pub client_id: String,
    pub api_key: String,
}

/// Editor feature toggles reported to the front-end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeatureFlags {
    pub emoji: bool,
    pub imgur: bool,
    pub mention: bool,
    pub jquery: bool,
    pub living: bool,
    pub spellcheck: bool,
    pub hljs: bool,
}

impl From<&mdfy_config::FeaturesConfig> for FeatureFlags {
    fn from(features: &mdfy_config::FeaturesConfig) -> Self {
        Self {
            emoji: features.emoji,
            imgur: features.imgur,
            mention: features.mention,
            jquery: features.jquery,
            living: features.living,
            spellcheck: features.spellcheck,
            hljs: features.hljs,
        }
    }
}

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Markdown preview endpoint.
    pub markdownify_path: String,
    /// Image upload endpoint (empty disables).
    pub upload_path: String,
    /// User search endpoint (empty disables).
    pub search_users_path: String,
    /// Imgur credentials (`None` disables the upload endpoint).
    pub imgur: Option<ImgurCredentials>,
    /// Feature toggles for the front-end.
    pub features: FeatureFlags,
    /// Editor theme identifier.
    pub theme: String,
    /// Prefix for mention profile links.
    pub mention_base_url: String,
    /// Prefix for emoji images.
    pub emoji_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let config = mdfy_config::Config::default();
        Self {
            host: config.server.host,
            port: config.server.port,
            markdownify_path: config.urls.markdownify,
            upload_path: config.urls.upload,
            search_users_path: config.urls.search_users,
            imgur: None,
            features: FeatureFlags::from(&config.features),
            theme: config.theme.as_str().to_owned(),
            mention_base_url: config.urls.mention_base,
            emoji_base_url: config.urls.emoji_base,
        }
    }
}

/// Run the server.
///
/// # Errors
///
/// Returns an error if the address is invalid or the listener cannot bind.
pub async fn run_server(
    config: ServerConfig,
    markdownify: Arc<Markdownify>,
    directory: Arc<dyn UserDirectory>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;

    let state = Arc::new(AppState::new(config, markdownify, directory));
    let app = app::create_router(state);

    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from mdfy config.
///
/// Uploads stay disabled when the Imgur credentials are incomplete.
#[must_use]
pub fn server_config_from_mdfy_config(config: &mdfy_config::Config) -> ServerConfig {
    let imgur = match config.require_imgur() {
        Ok(imgur) => Some(ImgurCredentials {
            client_id: imgur.client_id.clone(),
            api_key: imgur.api_key.clone(),
        }),
        Err(e) => {
            if config.features.imgur && !config.urls.upload.is_empty() {
                tracing::warn!(error = %e, "Image upload endpoint disabled");
            }
            None
        }
    };

    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        markdownify_path: config.urls.markdownify.clone(),
        upload_path: config.urls.upload.clone(),
        search_users_path: config.urls.search_users.clone(),
        imgur,
        features: FeatureFlags::from(&config.features),
        theme: config.theme.as_str().to_owned(),
        mention_base_url: config.urls.mention_base.clone(),
        emoji_base_url: config.urls.emoji_base.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.markdownify_path, "/martor/markdownify/");
        assert_eq!(config.upload_path, "/martor/uploader/");
        assert_eq!(config.search_users_path, "/martor/search-user/");
        assert_eq!(config.theme, "bootstrap");
        assert!(config.imgur.is_none());
    }

    #[test]
    fn test_server_config_with_imgur() {
        let mut config = mdfy_config::Config::default();
        config.imgur.client_id = "client".to_owned();
        config.imgur.api_key = "key".to_owned();
        config.server.port = 9000;

        let server_config = server_config_from_mdfy_config(&config);

        assert_eq!(server_config.port, 9000);
        assert_eq!(
            server_config.imgur,
            Some(ImgurCredentials {
                client_id: "client".to_owned(),
                api_key: "key".to_owned(),
            })
        );
    }

    #[test]
    fn test_server_config_imgur_feature_off() {
        let mut config = mdfy_config::Config::default();
        config.imgur.client_id = "client".to_owned();
        config.features.imgur = false;

        assert!(server_config_from_mdfy_config(&config).imgur.is_none());
    }
}
