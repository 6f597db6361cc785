//! `mdfy render` command implementation.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use mdfy_config::{CliSettings, Config};
use mdfy_server::{build_pipeline, load_directory};

use crate::error::CliError;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Markdown file to render (default: read from stdin).
    file: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover mdfy.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON user list for mentions (overrides config).
    #[arg(short, long, env = "MDFY_USERS")]
    users: Option<PathBuf>,
}

impl RenderArgs {
    /// Execute the render command, writing sanitized HTML to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, input or rendering fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            users_file: self.users,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let markdown = read_input(self.file.as_deref())?;
        let html = render(&config, &markdown)?;

        let mut stdout = io::stdout().lock();
        stdout.write_all(html.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Read markdown from `file`, or stdin when no file is given.
fn read_input(file: Option<&Path>) -> io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut markdown = String::new();
            io::stdin().read_to_string(&mut markdown)?;
            Ok(markdown)
        }
    }
}

fn render(config: &Config, markdown: &str) -> Result<String, CliError> {
    let directory = load_directory(config)?;
    let markdownify = build_pipeline(config, directory)?;
    Ok(markdownify.render(markdown)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_render_with_default_config() {
        let html = render(&Config::default(), "# Hello world!").unwrap();

        assert_eq!(html, "<h1>Hello world!</h1>");
    }

    #[test]
    fn test_render_with_config_file() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("users.json"), r#"[{"username": "alice"}]"#).unwrap();
        let config_path = temp.path().join("mdfy.toml");
        std::fs::write(
            &config_path,
            r#"
[markdown]
extensions = ["mention"]

[features]
mention = true

[urls]
mention_base = "/people/"

[users]
file = "users.json"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&config_path), None).unwrap();
        let html = render(&config, "@[alice]").unwrap();

        assert_eq!(
            html,
            r#"<p><a class="direct-mention-link" href="/people/alice/">@alice</a></p>"#
        );
    }

    #[test]
    fn test_read_input_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("doc.md");
        std::fs::write(&path, "~~old~~").unwrap();

        assert_eq!(read_input(Some(&path)).unwrap(), "~~old~~");
    }

    #[test]
    fn test_read_input_missing_file() {
        assert!(read_input(Some(Path::new("/nonexistent/doc.md"))).is_err());
    }
}
