//! Front-end configuration endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::FeatureFlags;
use crate::state::AppState;

/// Response for GET /api/config.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigResponse {
    theme: String,
    features: FeatureFlags,
    urls: UrlsResponse,
}

/// Endpoint URLs. Disabled endpoints are `None`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UrlsResponse {
    markdownify: Option<String>,
    upload: Option<String>,
    search_users: Option<String>,
    mention_base: String,
    emoji_base: String,
}

fn enabled(path: &str) -> Option<String> {
    (!path.is_empty()).then(|| path.to_owned())
}

/// Handle GET /api/config.
pub(crate) async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let config = &state.config;
    let mut features = config.features;
    features.imgur = state.upload_enabled();

    Json(ConfigResponse {
        theme: config.theme.clone(),
        features,
        urls: UrlsResponse {
            markdownify: enabled(&config.markdownify_path),
            upload: state
                .upload_enabled()
                .then(|| config.upload_path.clone()),
            search_users: enabled(&config.search_users_path),
            mention_base: config.mention_base_url.clone(),
            emoji_base: config.emoji_base_url.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled() {
        assert_eq!(enabled("/x/"), Some("/x/".to_owned()));
        assert_eq!(enabled(""), None);
    }
}
