//! Image upload relay to the Imgur API.
//!
//! The editor posts an image; the server forwards it base64-encoded to Imgur
//! and hands back a small JSON payload. The HTTP status of the relay response
//! is always 200: failures are described by the `status` field.

use std::time::Duration;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use ureq::Agent;
use ureq::http::StatusCode;

use crate::ImgurCredentials;

/// Imgur upload endpoint.
const IMGUR_UPLOAD_URL: &str = "https://api.imgur.com/3/upload.json";

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Upload relay error.
#[derive(Debug, thiserror::Error)]
pub(crate) enum UploadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("unexpected Imgur response: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON payload returned to the editor.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub(crate) enum UploadReply {
    Uploaded {
        status: u16,
        link: String,
        name: String,
    },
    Failed {
        status: u16,
        error: String,
    },
}

#[derive(Deserialize)]
struct ImgurResponse {
    status: u16,
    data: ImgurImage,
}

#[derive(Deserialize)]
struct ImgurImage {
    link: String,
    #[serde(default)]
    name: Option<String>,
}

/// Blocking Imgur client.
#[derive(Clone)]
pub(crate) struct ImgurUploader {
    agent: Agent,
    endpoint: String,
    credentials: ImgurCredentials,
}

impl ImgurUploader {
    pub(crate) fn new(credentials: ImgurCredentials) -> Self {
        Self::with_endpoint(IMGUR_UPLOAD_URL, credentials)
    }

    pub(crate) fn with_endpoint(endpoint: impl Into<String>, credentials: ImgurCredentials) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            endpoint: endpoint.into(),
            credentials,
        }
    }

    /// Upload an image. Transport failures become a 502 reply.
    pub(crate) fn upload(&self, name: &str, image: &[u8]) -> UploadReply {
        match self.send(name, image) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, name, "Image upload failed");
                UploadReply::Failed {
                    status: StatusCode::BAD_GATEWAY.as_u16(),
                    error: e.to_string(),
                }
            }
        }
    }

    fn send(&self, name: &str, image: &[u8]) -> Result<UploadReply, UploadError> {
        let encoded = BASE64_STANDARD.encode(image);
        let authorization = format!("Client-ID {}", self.credentials.client_id);

        let response = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", &authorization)
            .send_form([
                ("key", self.credentials.api_key.as_str()),
                ("image", encoded.as_str()),
                ("type", "base64"),
                ("name", name),
            ])?;

        let status = response.status();
        let body = response.into_body().read_to_string()?;
        tracing::debug!(status = status.as_u16(), name, "Imgur responded");

        translate(status, &body, name)
    }
}

/// Turn an Imgur response into the reply sent to the editor.
///
/// `name` is used when Imgur does not echo the file name back.
pub(crate) fn translate(
    status: StatusCode,
    body: &str,
    name: &str,
) -> Result<UploadReply, UploadError> {
    if status == StatusCode::OK {
        let response: ImgurResponse = serde_json::from_str(body)?;
        return Ok(UploadReply::Uploaded {
            status: response.status,
            link: response.data.link,
            name: response.data.name.unwrap_or_else(|| name.to_owned()),
        });
    }

    let error = if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
        status.canonical_reason().unwrap_or_default().to_owned()
    } else {
        body.to_owned()
    };
    Ok(UploadReply::Failed {
        status: status.as_u16(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Form;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn credentials() -> ImgurCredentials {
        ImgurCredentials {
            client_id: "client-123".to_owned(),
            api_key: "key-456".to_owned(),
        }
    }

    #[test]
    fn test_translate_success() {
        let body = r#"{"status": 200, "success": true, "data": {"link": "https://i.imgur.com/abc.png", "name": "cat.png"}}"#;

        let reply = translate(StatusCode::OK, body, "ignored.png").unwrap();

        assert_eq!(
            reply,
            UploadReply::Uploaded {
                status: 200,
                link: "https://i.imgur.com/abc.png".to_owned(),
                name: "cat.png".to_owned(),
            }
        );
    }

    #[test]
    fn test_translate_success_without_name() {
        let body = r#"{"status": 200, "data": {"link": "https://i.imgur.com/abc.png", "name": null}}"#;

        let reply = translate(StatusCode::OK, body, "cat.png").unwrap();

        assert!(matches!(reply, UploadReply::Uploaded { ref name, .. } if name == "cat.png"));
    }

    #[test]
    fn test_translate_unsupported_media_type() {
        let reply = translate(StatusCode::UNSUPPORTED_MEDIA_TYPE, "ignored", "x.txt").unwrap();

        assert_eq!(
            reply,
            UploadReply::Failed {
                status: 415,
                error: "Unsupported Media Type".to_owned(),
            }
        );
    }

    #[test]
    fn test_translate_other_error_keeps_body() {
        let body = r#"{"data": {"error": "Invalid client"}, "status": 403}"#;

        let reply = translate(StatusCode::FORBIDDEN, body, "x.png").unwrap();

        assert_eq!(
            reply,
            UploadReply::Failed {
                status: 403,
                error: body.to_owned(),
            }
        );
    }

    #[test]
    fn test_translate_malformed_success_body() {
        assert!(matches!(
            translate(StatusCode::OK, "not json", "x.png"),
            Err(UploadError::Json(_))
        ));
    }

    #[test]
    fn test_reply_serialization() {
        let uploaded = serde_json::to_value(UploadReply::Uploaded {
            status: 200,
            link: "https://i.imgur.com/a.png".to_owned(),
            name: "a.png".to_owned(),
        })
        .unwrap();
        let failed = serde_json::to_value(UploadReply::Failed {
            status: 502,
            error: "boom".to_owned(),
        })
        .unwrap();

        assert_eq!(
            uploaded,
            json!({"status": 200, "link": "https://i.imgur.com/a.png", "name": "a.png"})
        );
        assert_eq!(failed, json!({"status": 502, "error": "boom"}));
    }

    async fn fake_imgur(headers: HeaderMap, Form(form): Form<HashMap<String, String>>) -> Json<serde_json::Value> {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Client-ID client-123");
        Json(json!({
            "status": 200,
            "data": {
                "link": format!("https://i.imgur.com/{}", form["name"]),
                "name": format!(
                    "{}|{}|{}|{}",
                    authorized, form["key"], form["type"], form["image"]
                ),
            }
        }))
    }

    #[tokio::test]
    async fn test_upload_posts_base64_form() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let app = Router::new().route("/3/upload.json", post(fake_imgur));
            axum::serve(listener, app).await.unwrap();
        });

        let uploader =
            ImgurUploader::with_endpoint(format!("http://{addr}/3/upload.json"), credentials());
        let reply = tokio::task::spawn_blocking(move || uploader.upload("cat.png", b"png"))
            .await
            .unwrap();

        assert_eq!(
            reply,
            UploadReply::Uploaded {
                status: 200,
                link: "https://i.imgur.com/cat.png".to_owned(),
                name: "true|key-456|base64|cG5n".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn test_upload_transport_failure_is_bad_gateway() {
        // Bind and drop to get a port nobody listens on.
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let uploader =
            ImgurUploader::with_endpoint(format!("http://{addr}/3/upload.json"), credentials());
        let reply = tokio::task::spawn_blocking(move || uploader.upload("cat.png", b"png"))
            .await
            .unwrap();

        assert!(matches!(reply, UploadReply::Failed { status: 502, .. }));
    }
}
