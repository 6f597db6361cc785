//! Name-to-factory registry for markdown extensions.

use std::collections::{BTreeMap, HashSet};

use super::{
    EXTENSION_API_VERSION, ExtensionConfig, ExtensionContext, ExtensionOptions,
    MarkdownExtension, add_id, del_ins, emoji, escape_html, extra, mention, nl2br, smarty,
    urlize, video,
};
use crate::error::ConfigurationError;

/// Builds an extension from its options.
pub type ExtensionFactory = Box<
    dyn Fn(ExtensionOptions, &ExtensionContext) -> Result<Box<dyn MarkdownExtension>, ConfigurationError>
        + Send
        + Sync,
>;

type BuiltinFactory =
    fn(ExtensionOptions, &ExtensionContext) -> Result<Box<dyn MarkdownExtension>, ConfigurationError>;

const BUILTINS: &[(&str, BuiltinFactory)] = &[
    ("add_id", add_id::factory),
    ("del_ins", del_ins::factory),
    ("emoji", emoji::factory),
    ("escape_html", escape_html::factory),
    ("extra", extra::factory),
    ("mention", mention::factory),
    ("nl2br", nl2br::factory),
    ("smarty", smarty::factory),
    ("urlize", urlize::factory),
    ("video", video::factory),
];

/// Maps extension identifiers to factories.
///
/// Resolution happens once, when a pipeline is built.
pub struct ExtensionRegistry {
    factories: BTreeMap<String, ExtensionFactory>,
}

impl ExtensionRegistry {
    /// A registry with no extensions.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry holding every built-in extension.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (name, factory) in BUILTINS {
            registry
                .factories
                .insert((*name).to_owned(), Box::new(*factory));
        }
        registry
    }

    /// Register an extension under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), ConfigurationError>
    where
        F: Fn(ExtensionOptions, &ExtensionContext) -> Result<Box<dyn MarkdownExtension>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(ConfigurationError::DuplicateExtension(name));
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiate the configured extensions, in configured order.
    pub fn resolve(
        &self,
        config: &ExtensionConfig,
        context: &ExtensionContext,
    ) -> Result<Vec<Box<dyn MarkdownExtension>>, ConfigurationError> {
        let mut seen = HashSet::new();
        let mut extensions = Vec::with_capacity(config.extensions().len());

        for name in config.extensions() {
            if !seen.insert(name.as_str()) {
                return Err(ConfigurationError::DuplicateExtension(name.clone()));
            }
            let factory = self
                .factories
                .get(name)
                .ok_or_else(|| ConfigurationError::UnknownExtension(name.clone()))?;
            let extension = factory(config.options_for(name), context)?;

            let version = extension.api_version();
            if version != EXTENSION_API_VERSION {
                return Err(ConfigurationError::IncompatibleExtension {
                    name: name.clone(),
                    reason: format!(
                        "extension API version {version}, pipeline expects {EXTENSION_API_VERSION}"
                    ),
                });
            }
            extensions.push(extension);
        }

        for (extension, option) in config.configured_options() {
            if !seen.contains(extension) {
                return Err(ConfigurationError::InvalidOption {
                    extension: extension.to_owned(),
                    option: option.to_owned(),
                    message: "the extension is not enabled".to_owned(),
                });
            }
        }

        Ok(extensions)
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
