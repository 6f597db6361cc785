//! The markdownify pipeline.

use std::cmp::Reverse;

use pulldown_cmark::{Event, Parser};

use crate::error::{ConfigurationError, RenderError};
use crate::extension::{
    EventFilter, ExtensionConfig, ExtensionContext, ExtensionRegistry, PipelineBuilder,
    Preprocessor,
};
use crate::inline::InlineEngine;
use crate::link_guard::LinkGuard;
use crate::renderer::render_html;
use crate::sanitizer::{AllowList, Sanitizer};

/// Converts untrusted markdown into sanitized HTML.
///
/// Built once from an [`ExtensionConfig`] and an [`AllowList`], then shared.
/// Rendering takes `&self` and keeps no state between calls.
///
/// # Example
///
/// ```
/// use mdfy_renderer::{AllowList, ExtensionConfig, ExtensionContext, Markdownify};
///
/// let markdownify = Markdownify::new(
///     &ExtensionConfig::default(),
///     AllowList::default(),
///     ExtensionContext::new(),
/// )
/// .unwrap();
///
/// assert_eq!(markdownify.render("# Hello world!").unwrap(), "<h1>Hello world!</h1>");
/// ```
pub struct Markdownify {
    preprocessors: Vec<Box<dyn Preprocessor>>,
    options: pulldown_cmark::Options,
    filters: Vec<Box<dyn EventFilter>>,
    inline: InlineEngine,
    sanitizer: Sanitizer,
    extensions: Vec<String>,
}

impl Markdownify {
    /// Build a pipeline from the built-in extensions.
    pub fn new(
        config: &ExtensionConfig,
        allow_list: AllowList,
        context: ExtensionContext,
    ) -> Result<Self, ConfigurationError> {
        Self::with_registry(&ExtensionRegistry::builtin(), config, allow_list, &context)
    }

    /// Build a pipeline resolving extensions through `registry`.
    pub fn with_registry(
        registry: &ExtensionRegistry,
        config: &ExtensionConfig,
        allow_list: AllowList,
        context: &ExtensionContext,
    ) -> Result<Self, ConfigurationError> {
        let extensions = registry.resolve(config, context)?;

        let mut builder = PipelineBuilder::new();
        builder.add_preprocessor(LinkGuard::new(&allow_list.schemes));
        for extension in &extensions {
            builder.begin(extension.name());
            extension.extend(&mut builder)?;
        }

        builder.filters.sort_by_key(|f| Reverse(f.priority()));
        let inline = InlineEngine::new(builder.patterns);
        tracing::debug!(
            extensions = ?config.extensions(),
            preprocessors = ?builder.preprocessors.iter().map(|p| p.name()).collect::<Vec<_>>(),
            filters = ?builder.filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            patterns = ?inline.pattern_names(),
            "Built markdown pipeline"
        );

        Ok(Self {
            preprocessors: builder.preprocessors,
            options: builder.options,
            filters: builder.filters,
            inline,
            sanitizer: Sanitizer::new(allow_list),
            extensions: config.extensions().to_vec(),
        })
    }

    /// Render markdown to sanitized HTML.
    pub fn render(&self, markdown: &str) -> Result<String, RenderError> {
        let mut source = markdown.to_owned();
        for preprocessor in &self.preprocessors {
            if let Some(rewritten) = preprocessor.process(&source) {
                source = rewritten;
            }
        }

        let mut events: Vec<Event<'_>> = Parser::new_ext(&source, self.options).collect();
        for filter in &self.filters {
            events = filter.filter(events);
        }
        let events = self.inline.apply(events)?;

        let html = render_html(events);
        Ok(self.sanitizer.clean(&html))
    }

    /// Sanitize an HTML fragment with this pipeline's allow-list.
    pub fn sanitize(&self, html: &str) -> String {
        self.sanitizer.clean(html)
    }

    /// Configured extension identifiers, in order.
    pub fn extension_names(&self) -> &[String] {
        &self.extensions
    }

    /// Allow-list the sanitizer enforces.
    pub fn allow_list(&self) -> &AllowList {
        self.sanitizer.allow_list()
    }
}
