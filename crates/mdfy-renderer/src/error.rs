//! Error types for pipeline construction, rendering and user lookups.

use std::io;

/// Error raised while building a [`Markdownify`](crate::Markdownify) pipeline.
///
/// Every variant is a startup-time failure. Nothing here is ever produced by
/// [`Markdownify::render`](crate::Markdownify::render).
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The extension list names an identifier the registry does not know.
    #[error("unknown markdown extension `{0}`")]
    UnknownExtension(String),

    /// The same identifier appears twice, in the extension list or in the registry.
    #[error("markdown extension `{0}` is configured more than once")]
    DuplicateExtension(String),

    /// The extension was written against a different extension API, or it
    /// registered something the pipeline cannot accept.
    #[error("markdown extension `{name}` is not compatible with this pipeline: {reason}")]
    IncompatibleExtension { name: String, reason: String },

    /// A per-extension option is unknown or cannot be parsed.
    #[error("invalid option `{option}` for markdown extension `{extension}`: {message}")]
    InvalidOption {
        extension: String,
        option: String,
        message: String,
    },

    /// The `mention` feature is on but no user directory was supplied.
    #[error("the `mention` extension is enabled but no user directory is configured")]
    MissingUserDirectory,
}

/// Error raised while rendering a document.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A user directory lookup failed. The lookup error is kept as is.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Error raised by a [`UserDirectory`](crate::UserDirectory).
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The backing store could not answer.
    #[error("user directory unavailable: {0}")]
    Unavailable(String),

    /// The user file could not be read.
    #[error("failed to read user directory: {0}")]
    Io(#[from] io::Error),

    /// The user file is not a valid JSON user list.
    #[error("invalid user directory file: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_message_names_extension() {
        let err = ConfigurationError::IncompatibleExtension {
            name: "legacy".to_owned(),
            reason: "extension API version 0, pipeline expects 1".to_owned(),
        };

        assert_eq!(
            err.to_string(),
            "markdown extension `legacy` is not compatible with this pipeline: \
             extension API version 0, pipeline expects 1"
        );
    }

    #[test]
    fn test_render_error_is_transparent() {
        let err = RenderError::from(LookupError::Unavailable("connection refused".to_owned()));

        assert_eq!(
            err.to_string(),
            "user directory unavailable: connection refused"
        );
        assert!(matches!(err, RenderError::Lookup(LookupError::Unavailable(_))));
    }
}
