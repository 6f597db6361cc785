//! User search endpoint for mention autocomplete.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::state::AppState;

/// Query string for GET {search_users}.
#[derive(Deserialize)]
pub(crate) struct SearchQuery {
    username: Option<String>,
}

/// Response for GET {search_users}.
///
/// The HTTP status is always 200. `status` is 200 with matches and 204
/// otherwise.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub(crate) enum SearchResponse {
    Found { status: u16, data: Vec<UsernameEntry> },
    Empty { status: u16, error: String },
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub(crate) struct UsernameEntry {
    username: String,
}

impl SearchResponse {
    fn empty(error: String) -> Self {
        Self::Empty { status: 204, error }
    }
}

/// Handle GET {search_users}?username=...
pub(crate) async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ServerError> {
    let Some(username) = query.username.filter(|u| is_valid_query(u)) else {
        return Ok(Json(SearchResponse::empty(
            "Validation Failed for field `username`".to_owned(),
        )));
    };

    let directory = Arc::clone(&state.directory);
    let users = {
        let username = username.clone();
        tokio::task::spawn_blocking(move || directory.search_active_users(&username)).await??
    };

    if users.is_empty() {
        return Ok(Json(SearchResponse::empty(format!(
            "No users registered as `{username}` or user is unactived."
        ))));
    }

    Ok(Json(SearchResponse::Found {
        status: 200,
        data: users
            .into_iter()
            .map(|user| UsernameEntry {
                username: user.username,
            })
            .collect(),
    }))
}

fn is_valid_query(username: &str) -> bool {
    !username.is_empty() && !username.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_is_valid_query() {
        assert!(is_valid_query("alice"));
        assert!(!is_valid_query(""));
        assert!(!is_valid_query("al ice"));
        assert!(!is_valid_query("alice\t"));
    }

    #[test]
    fn test_found_serialization() {
        let response = SearchResponse::Found {
            status: 200,
            data: vec![UsernameEntry {
                username: "alice".to_owned(),
            }],
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": 200, "data": [{"username": "alice"}]})
        );
    }

    #[test]
    fn test_empty_serialization() {
        let response = SearchResponse::empty("nope".to_owned());

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": 204, "error": "nope"})
        );
    }
}
