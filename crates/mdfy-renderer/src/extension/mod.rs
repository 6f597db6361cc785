//! Markdown extensions and the hooks they plug into.
//!
//! An extension is resolved by name through the [`ExtensionRegistry`] when a
//! pipeline is built. Its [`MarkdownExtension::extend`] hook then registers
//! whatever it needs on the [`PipelineBuilder`]:
//!
//! - parser options (tables, footnotes, smart punctuation);
//! - a [`Preprocessor`] over raw markdown;
//! - an [`EventFilter`] over the parsed event stream;
//! - an [`InlinePattern`] for the line-scoped pattern pass.

mod add_id;
mod del_ins;
mod emoji;
mod escape_html;
mod extra;
mod mention;
mod nl2br;
mod registry;
mod smarty;
mod urlize;
mod video;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use pulldown_cmark::{Event, Options};

pub use registry::{ExtensionFactory, ExtensionRegistry};

use crate::directory::UserDirectory;
use crate::error::ConfigurationError;
use crate::inline::InlinePattern;

/// Version of the extension API implemented by this pipeline.
pub const EXTENSION_API_VERSION: u32 = 1;

/// Extensions enabled when nothing else is configured.
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

pub(crate) const DEFAULT_EMOJI_BASE_URL: &str = "https://github.githubassets.com/images/icons/emoji/";

/// Rewrites raw markdown before it is parsed.
pub trait Preprocessor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return the rewritten document, or `None` to keep it unchanged.
    fn process(&self, markdown: &str) -> Option<String>;
}

/// Transforms the parsed event stream before the inline pattern pass.
pub trait EventFilter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Filters with a higher priority run first. Ties keep registration order.
    fn priority(&self) -> i32 {
        0
    }

    fn filter<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>>;
}

/// A pluggable markdown extension.
pub trait MarkdownExtension: Send + Sync {
    fn name(&self) -> &str;

    /// Extension API version this extension was written against.
    fn api_version(&self) -> u32 {
        EXTENSION_API_VERSION
    }

    /// Register the extension's hooks.
    fn extend(&self, pipeline: &mut PipelineBuilder) -> Result<(), ConfigurationError>;
}

/// Ordered extension identifiers plus per-extension string options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionConfig {
    extensions: Vec<String>,
    options: BTreeMap<String, BTreeMap<String, String>>,
}

impl ExtensionConfig {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            options: BTreeMap::new(),
        }
    }

    /// Set one option of one extension.
    #[must_use]
    pub fn with_option(
        mut self,
        extension: impl Into<String>,
        option: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.options
            .entry(extension.into())
            .or_default()
            .insert(option.into(), value.into());
        self
    }

    /// Replace all options of one extension.
    #[must_use]
    pub fn with_options(
        mut self,
        extension: impl Into<String>,
        options: BTreeMap<String, String>,
    ) -> Self {
        self.options.insert(extension.into(), options);
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Extensions with options set, paired with their first option key.
    pub(crate) fn configured_options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().filter_map(|(extension, values)| {
            values
                .keys()
                .next()
                .map(|option| (extension.as_str(), option.as_str()))
        })
    }

    pub(crate) fn options_for(&self, extension: &str) -> ExtensionOptions {
        ExtensionOptions {
            extension: extension.to_owned(),
            values: self.options.get(extension).cloned().unwrap_or_default(),
        }
    }
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied())
    }
}

/// Options handed to one extension factory.
///
/// Factories take the options they understand and call [`finish`](Self::finish),
/// which rejects anything left over.
#[derive(Debug)]
pub struct ExtensionOptions {
    extension: String,
    values: BTreeMap<String, String>,
}

impl ExtensionOptions {
    pub fn take_string(&mut self, option: &str) -> Option<String> {
        self.values.remove(option)
    }

    pub fn take_parsed<T>(&mut self, option: &str) -> Result<Option<T>, ConfigurationError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let Some(raw) = self.values.remove(option) else {
            return Ok(None);
        };
        raw.trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| self.invalid(option, format!("cannot parse `{raw}`: {e}")))
    }

    pub fn finish(self) -> Result<(), ConfigurationError> {
        match self.values.keys().next() {
            Some(option) => Err(self.invalid(option, "unknown option".to_owned())),
            None => Ok(()),
        }
    }

    fn invalid(&self, option: &str, message: String) -> ConfigurationError {
        ConfigurationError::InvalidOption {
            extension: self.extension.clone(),
            option: option.to_owned(),
            message,
        }
    }
}

/// Shared inputs for extension factories.
#[derive(Clone)]
pub struct ExtensionContext {
    pub mention_enabled: bool,
    pub emoji_enabled: bool,
    pub mention_base_url: String,
    pub emoji_base_url: String,
    pub directory: Option<Arc<dyn UserDirectory>>,
}

impl Default for ExtensionContext {
    fn default() -> Self {
        Self {
            mention_enabled: false,
            emoji_enabled: true,
            mention_base_url: String::new(),
            emoji_base_url: DEFAULT_EMOJI_BASE_URL.to_owned(),
            directory: None,
        }
    }
}

impl ExtensionContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mention(mut self, enabled: bool) -> Self {
        self.mention_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_emoji(mut self, enabled: bool) -> Self {
        self.emoji_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_mention_base_url(mut self, url: impl Into<String>) -> Self {
        self.mention_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_emoji_base_url(mut self, url: impl Into<String>) -> Self {
        self.emoji_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }
}

impl fmt::Debug for ExtensionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionContext")
            .field("mention_enabled", &self.mention_enabled)
            .field("emoji_enabled", &self.emoji_enabled)
            .field("mention_base_url", &self.mention_base_url)
            .field("emoji_base_url", &self.emoji_base_url)
            .field("directory", &self.directory.is_some())
            .finish()
    }
}

/// Collects the hooks registered by extensions.
pub struct PipelineBuilder {
    current: String,
    pub(crate) options: Options,
    pub(crate) preprocessors: Vec<Box<dyn Preprocessor>>,
    pub(crate) filters: Vec<Box<dyn EventFilter>>,
    pub(crate) patterns: Vec<Box<dyn InlinePattern>>,
}

impl PipelineBuilder {
    pub(crate) fn new() -> Self {
        Self {
            current: String::new(),
            options: Options::empty(),
            preprocessors: Vec::new(),
            filters: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Attribute subsequent registrations to `extension` in error messages.
    pub(crate) fn begin(&mut self, extension: &str) {
        extension.clone_into(&mut self.current);
    }

    /// Enable pulldown-cmark parser options.
    pub fn enable(&mut self, options: Options) {
        self.options |= options;
    }

    pub fn add_preprocessor(&mut self, preprocessor: impl Preprocessor + 'static) {
        self.preprocessors.push(Box::new(preprocessor));
    }

    pub fn add_event_filter(&mut self, filter: impl EventFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    /// Register an inline pattern. Pattern names are unique per pipeline.
    pub fn add_inline_pattern(
        &mut self,
        pattern: impl InlinePattern + 'static,
    ) -> Result<(), ConfigurationError> {
        if self.patterns.iter().any(|p| p.name() == pattern.name()) {
            return Err(ConfigurationError::IncompatibleExtension {
                name: self.current.clone(),
                reason: format!("inline pattern `{}` is already registered", pattern.name()),
            });
        }
        self.patterns.push(Box::new(pattern));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_lists_default_extensions() {
        let config = ExtensionConfig::default();

        assert_eq!(config.extensions(), DEFAULT_EXTENSIONS);
    }

    #[test]
    fn test_options_take_and_finish() {
        let config = ExtensionConfig::new(["video"])
            .with_option("video", "width", "640")
            .with_option("video", "height", "360");
        let mut options = config.options_for("video");

        assert_eq!(options.take_parsed::<u32>("width").unwrap(), Some(640));
        assert_eq!(options.take_parsed::<u32>("height").unwrap(), Some(360));
        assert_eq!(options.take_parsed::<u32>("missing").unwrap(), None);
        options.finish().unwrap();
    }

    #[test]
    fn test_options_reject_malformed_value() {
        let mut options = ExtensionConfig::new(["video"])
            .with_option("video", "width", "wide")
            .options_for("video");

        let err = options.take_parsed::<u32>("width").unwrap_err();

        assert!(matches!(
            err,
            ConfigurationError::InvalidOption { ref extension, ref option, .. }
                if extension == "video" && option == "width"
        ));
    }

    #[test]
    fn test_options_reject_leftovers() {
        let options = ExtensionConfig::new(["emoji"])
            .with_option("emoji", "colour", "yes")
            .options_for("emoji");

        let err = options.finish().unwrap_err();

        assert_eq!(
            err.to_string(),
            "invalid option `colour` for markdown extension `emoji`: unknown option"
        );
    }

    #[test]
    fn test_context_defaults() {
        let context = ExtensionContext::new();

        assert!(!context.mention_enabled);
        assert!(context.emoji_enabled);
        assert_eq!(context.emoji_base_url, DEFAULT_EMOJI_BASE_URL);
        assert_eq!(context.mention_base_url, "");
        assert!(context.directory.is_none());
    }
}
