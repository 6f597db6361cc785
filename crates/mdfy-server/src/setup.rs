//! Building the renderer and user directory from configuration.

use std::sync::Arc;

use mdfy_config::{Config, SanitizerConfig};
use mdfy_renderer::{
    AllowList, ConfigurationError, ExtensionConfig, ExtensionContext, LookupError, Markdownify,
    StaticDirectory, UserDirectory,
};

/// Load the user directory named by `[users] file`.
///
/// Without a file the directory is empty: mentions never resolve and user
/// search finds nobody.
pub fn load_directory(config: &Config) -> Result<Arc<dyn UserDirectory>, LookupError> {
    let directory = match &config.users_resolved.file {
        Some(path) => StaticDirectory::load(path)?,
        None => StaticDirectory::default(),
    };
    Ok(Arc::new(directory))
}

/// Sanitizer allow-list with the configured overrides applied.
pub fn allow_list_from_config(config: &SanitizerConfig) -> AllowList {
    let mut allow = AllowList::default();
    if let Some(tags) = &config.tags {
        allow = allow.with_tags(tags);
    }
    if let Some(attributes) = &config.attributes {
        allow = allow.with_attributes(
            attributes
                .iter()
                .map(|(tag, attrs)| (tag.clone(), attrs.iter().cloned().collect()))
                .collect(),
        );
    }
    if let Some(global) = &config.global_attributes {
        allow = allow.with_global_attributes(global);
    }
    if let Some(schemes) = &config.schemes {
        allow = allow.with_schemes(schemes);
    }
    allow
}

/// Build the markdownify pipeline described by `config`.
pub fn build_pipeline(
    config: &Config,
    directory: Arc<dyn UserDirectory>,
) -> Result<Markdownify, ConfigurationError> {
    let extensions = config.markdown.string_options().into_iter().fold(
        ExtensionConfig::new(&config.markdown.extensions),
        |extensions, (name, options)| extensions.with_options(name, options),
    );

    let context = ExtensionContext::new()
        .with_mention(config.features.mention)
        .with_emoji(config.features.emoji)
        .with_mention_base_url(&config.urls.mention_base)
        .with_emoji_base_url(&config.urls.emoji_base)
        .with_directory(directory);

    Markdownify::new(
        &extensions,
        allow_list_from_config(&config.sanitizer),
        context,
    )
}
