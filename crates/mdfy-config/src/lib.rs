//! Configuration management for mdfy.
//!
//! Parses `mdfy.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `urls.mention_base`
//! - `urls.emoji_base`
//! - `imgur.client_id`
//! - `imgur.api_key`

mod expand;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override the user directory file.
    pub users_file: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdfy.toml";

/// Extensions enabled when `[markdown] extensions` is not set.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "extra",
    "nl2br",
    "smarty",
    "urlize",
    "del_ins",
    "mention",
    "emoji",
    "video",
    "escape_html",
];

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Markdown extension list and per-extension options.
    pub markdown: MarkdownConfig,
    /// Editor feature toggles.
    pub features: FeaturesConfig,
    /// Base URLs and endpoint paths.
    pub urls: UrlsConfig,
    /// Allow-list overrides for the HTML sanitizer.
    pub sanitizer: SanitizerConfig,
    /// Imgur upload credentials.
    pub imgur: ImgurConfig,
    /// Editor theme.
    pub theme: Theme,
    /// User directory configuration (paths are relative strings from TOML).
    users: UsersConfigRaw,

    /// Resolved user directory configuration (set after loading).
    #[serde(skip)]
    pub users_resolved: UsersConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            markdown: MarkdownConfig::default(),
            features: FeaturesConfig::default(),
            urls: UrlsConfig::default(),
            sanitizer: SanitizerConfig::default(),
            imgur: ImgurConfig::default(),
            theme: Theme::default(),
            users: UsersConfigRaw::default(),
            users_resolved: UsersConfig::default(),
            config_path: None,
        }
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
        }
    }
}

/// A single extension option value.
///
/// TOML numbers and booleans are accepted and converted to their string form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// String value.
    Str(String),
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Markdown extension configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Ordered extension identifiers.
    pub extensions: Vec<String>,
    /// Per-extension options, keyed by extension identifier.
    pub options: BTreeMap<String, BTreeMap<String, OptionValue>>,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|&s| s.to_owned()).collect(),
            options: BTreeMap::new(),
        }
    }
}

impl MarkdownConfig {
    /// Extension options with every value converted to a string.
    #[must_use]
    pub fn string_options(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.options
            .iter()
            .map(|(ext, opts)| {
                let opts = opts
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_string()))
                    .collect();
                (ext.clone(), opts)
            })
            .collect()
    }
}

/// Editor feature toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeaturesConfig {
    /// Render `:emoji:` shortcodes.
    pub emoji: bool,
    /// Enable the image upload endpoint.
    pub imgur: bool,
    /// Render `@[username]` mentions.
    pub mention: bool,
    /// Include jQuery in the editor assets.
    pub jquery: bool,
    /// Live preview while typing.
    pub living: bool,
    /// Spellcheck in editor textareas.
    pub spellcheck: bool,
    /// Syntax highlighting in the preview.
    pub hljs: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            emoji: true,
            imgur: true,
            mention: false,
            jquery: true,
            living: false,
            spellcheck: false,
            hljs: true,
        }
    }
}

/// Base URLs and endpoint paths.
///
/// An empty endpoint path disables that endpoint.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UrlsConfig {
    /// Prefix for mention profile links (`{mention_base}{username}/`).
    pub mention_base: String,
    /// Prefix for emoji images (`{emoji_base}{name}.png`).
    pub emoji_base: String,
    /// Markdown preview endpoint.
    pub markdownify: String,
    /// Image upload endpoint.
    pub upload: String,
    /// User search endpoint.
    pub search_users: String,
}

impl Default for UrlsConfig {
    fn default() -> Self {
        Self {
            mention_base: String::new(),
            emoji_base: "https://github.githubassets.com/images/icons/emoji/".to_owned(),
            markdownify: "/martor/markdownify/".to_owned(),
            upload: "/martor/uploader/".to_owned(),
            search_users: "/martor/search-user/".to_owned(),
        }
    }
}

/// Sanitizer allow-list overrides.
///
/// Each `None` field keeps the renderer's built-in default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Allowed HTML tags.
    pub tags: Option<Vec<String>>,
    /// Allowed attributes per tag.
    pub attributes: Option<BTreeMap<String, Vec<String>>>,
    /// Attributes allowed on every tag (`data-` style entries are prefixes).
    pub global_attributes: Option<Vec<String>>,
    /// Allowed URL schemes.
    pub schemes: Option<Vec<String>>,
}

/// Imgur API credentials.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ImgurConfig {
    /// Imgur client ID (sent as `Authorization: Client-ID ...`).
    pub client_id: String,
    /// Imgur API key.
    pub api_key: String,
}

impl ImgurConfig {
    /// Validate that the credentials needed for uploads are set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the client ID is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.client_id, "imgur.client_id")
    }
}

/// Editor theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Bootstrap theme.
    #[default]
    Bootstrap,
    /// Semantic UI theme.
    Semantic,
    /// Tailwind theme.
    Tailwind,
}

impl Theme {
    /// Theme identifier as used by the editor front-end.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::Semantic => "semantic",
            Self::Tailwind => "tailwind",
        }
    }
}

/// Raw user directory configuration as parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UsersConfigRaw {
    file: Option<String>,
}

/// Resolved user directory configuration with absolute paths.
#[derive(Debug, Default)]
pub struct UsersConfig {
    /// JSON file listing known users (`None` means an empty directory).
    pub file: Option<PathBuf>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`imgur.client_id`").
        field: String,
        /// Error message (e.g., "${`IMGUR_CLIENT_ID`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require an endpoint path to be empty (disabled) or absolute.
fn require_endpoint_path(path: &str, field: &str) -> Result<(), ConfigError> {
    if !path.is_empty() && !path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{field} must start with /"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mdfy.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(users_file) = &settings.users_file {
            self.users_resolved.file = Some(users_file.clone());
        }
    }

    /// Get validated Imgur configuration.
    ///
    /// Use this instead of accessing the `imgur` field directly when the
    /// upload endpoint is about to be served.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if uploads are disabled or the
    /// credentials are incomplete.
    pub fn require_imgur(&self) -> Result<&ImgurConfig, ConfigError> {
        if !self.features.imgur {
            return Err(ConfigError::Validation(
                "features.imgur is disabled".to_owned(),
            ));
        }
        self.imgur.validate()?;
        Ok(&self.imgur)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_urls()?;
        self.validate_markdown()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate base URLs and endpoint paths.
    fn validate_urls(&self) -> Result<(), ConfigError> {
        if self.features.emoji {
            require_non_empty(&self.urls.emoji_base, "urls.emoji_base")?;
            require_http_url(&self.urls.emoji_base, "urls.emoji_base")?;
        }
        require_non_empty(&self.urls.markdownify, "urls.markdownify")?;
        require_endpoint_path(&self.urls.markdownify, "urls.markdownify")?;
        require_endpoint_path(&self.urls.upload, "urls.upload")?;
        require_endpoint_path(&self.urls.search_users, "urls.search_users")?;
        Ok(())
    }

    /// Validate the extension list.
    ///
    /// Unknown identifiers are reported by the renderer; this only catches
    /// shape problems visible without it.
    fn validate_markdown(&self) -> Result<(), ConfigError> {
        for (index, name) in self.markdown.extensions.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "markdown.extensions[{index}] cannot be empty"
                )));
            }
        }
        for ext in self.markdown.options.keys() {
            if !self.markdown.extensions.contains(ext) {
                return Err(ConfigError::Validation(format!(
                    "markdown.options.{ext} configures an extension that is not enabled"
                )));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        self.urls.mention_base = expand::expand_env(&self.urls.mention_base, "urls.mention_base")?;
        self.urls.emoji_base = expand::expand_env(&self.urls.emoji_base, "urls.emoji_base")?;
        self.imgur.client_id = expand::expand_env(&self.imgur.client_id, "imgur.client_id")?;
        self.imgur.api_key = expand::expand_env(&self.imgur.api_key, "imgur.api_key")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.users_resolved = UsersConfig {
            file: self.users.file.as_deref().map(|f| config_dir.join(f)),
        };
    }
}
