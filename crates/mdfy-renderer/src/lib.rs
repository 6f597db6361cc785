//! Markdown to sanitized HTML for untrusted, user-authored content.
//!
//! [`Markdownify`] runs a fixed pipeline:
//!
//! 1. [`LinkGuard`] rewrites link and image targets with disallowed schemes.
//! 2. pulldown-cmark parses the guarded source with the options the enabled
//!    extensions asked for.
//! 3. Event filters registered by extensions run in configured order.
//! 4. Inline patterns (mentions, emoji, `~~del~~`, video embeds) run line by
//!    line over the remaining text.
//! 5. The HTML is rendered and cleaned by the allow-list [`Sanitizer`].
//!
//! Extensions are resolved by name through an [`ExtensionRegistry`], so
//! callers can plug in their own [`MarkdownExtension`] implementations.
//!
//! # Example
//!
//! ```
//! use mdfy_renderer::{AllowList, ExtensionConfig, ExtensionContext, Markdownify};
//!
//! let markdownify = Markdownify::new(
//!     &ExtensionConfig::new(["extra", "del_ins"]),
//!     AllowList::default(),
//!     ExtensionContext::new(),
//! )
//! .unwrap();
//!
//! let html = markdownify.render("~~old~~ ++new++").unwrap();
//! assert_eq!(html, "<p><del>old</del> <ins>new</ins></p>");
//! ```

mod directory;
mod error;
mod extension;
mod fence;
mod inline;
mod link_guard;
mod pipeline;
mod renderer;
mod sanitizer;
mod state;
mod util;

pub use directory::{StaticDirectory, User, UserDirectory};
pub use error::{ConfigurationError, LookupError, RenderError};
pub use extension::{
    DEFAULT_EXTENSIONS, EXTENSION_API_VERSION, EventFilter, ExtensionConfig, ExtensionContext,
    ExtensionFactory, ExtensionOptions, ExtensionRegistry, MarkdownExtension, PipelineBuilder,
    Preprocessor,
};
pub use inline::{Content, Element, InlineMatch, InlinePattern};
pub use link_guard::LinkGuard;
pub use pipeline::Markdownify;
pub use sanitizer::{AllowList, Sanitizer};
