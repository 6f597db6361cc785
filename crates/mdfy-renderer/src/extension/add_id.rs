//! `add_id`: a line ending in `{#some-id}` is wrapped in `<span id="some-id">`.

use std::sync::LazyLock;

use regex::Regex;

use super::{ExtensionContext, ExtensionOptions, MarkdownExtension, PipelineBuilder};
use crate::error::{ConfigurationError, RenderError};
use crate::inline::{Element, InlineMatch, InlinePattern};

static ADD_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s+\{#([A-Za-z0-9_-]+)\}\s*$").unwrap());

pub(crate) struct AddId;

impl MarkdownExtension for AddId {
    fn name(&self) -> &str {
        "add_id"
    }

    fn extend(&self, pipeline: &mut PipelineBuilder) -> Result<(), ConfigurationError> {
        pipeline.add_inline_pattern(IdPattern)
    }
}

/// Runs last so it wraps whatever the other patterns produced.
struct IdPattern;

impl InlinePattern for IdPattern {
    fn name(&self) -> &str {
        "add_id"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn regex(&self) -> &Regex {
        &ADD_ID_RE
    }

    fn handle(&self, found: &InlineMatch<'_>) -> Result<Option<Element>, RenderError> {
        let (Some(content), Some(id)) = (found.group(1), found.plain_group(2)) else {
            return Ok(None);
        };
        Ok(Some(Element::new("span").attr("id", id).inline(content)))
    }
}

pub(crate) fn factory(
    options: ExtensionOptions,
    _context: &ExtensionContext,
) -> Result<Box<dyn MarkdownExtension>, ConfigurationError> {
    options.finish()?;
    Ok(Box::new(AddId))
}
