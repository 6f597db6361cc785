//! `mdfy serve` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use mdfy_config::{CliSettings, Config};
use mdfy_server::{build_pipeline, load_directory, run_server, server_config_from_mdfy_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover mdfy.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// JSON user list for mentions and user search (overrides config).
    #[arg(short, long, env = "MDFY_USERS")]
    users: Option<PathBuf>,

    /// Enable verbose output (request and pipeline logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            users_file: self.users,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let directory = load_directory(&config)?;
        let markdownify = build_pipeline(&config, Arc::clone(&directory))?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));
        output.info(&format!(
            "Extensions: {}",
            markdownify.extension_names().join(", ")
        ));

        match &config.users_resolved.file {
            Some(path) => output.info(&format!("User directory: {}", path.display())),
            None if config.features.mention => {
                output.warning("Mentions are enabled but no [users] file is configured");
            }
            None => {}
        }

        let server_config = server_config_from_mdfy_config(&config);
        if server_config.imgur.is_some() {
            output.info(&format!("Image upload: {}", server_config.upload_path));
        } else {
            output.info("Image upload: disabled");
        }

        run_server(server_config, Arc::new(markdownify), directory)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
