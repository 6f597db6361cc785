//! CLI error types.

use mdfy_config::ConfigError;
use mdfy_renderer::{ConfigurationError, LookupError, RenderError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Pipeline(#[from] ConfigurationError),

    #[error("{0}")]
    Users(#[from] LookupError),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    Server(String),
}
