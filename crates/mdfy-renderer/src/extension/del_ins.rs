//! `del_ins`: `~~text~~` renders as `<del>`, `++text++` as `<ins>`.

use std::sync::LazyLock;

use regex::Regex;

use super::{ExtensionContext, ExtensionOptions, MarkdownExtension, PipelineBuilder};
use crate::error::ConfigurationError;
use crate::inline::SimpleTagPattern;

static DEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~(.+?)~~").unwrap());
static INS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\+\+(.+?)\+\+").unwrap());

const PRIORITY: i32 = 75;

pub(crate) struct DelIns;

impl MarkdownExtension for DelIns {
    fn name(&self) -> &str {
        "del_ins"
    }

    fn extend(&self, pipeline: &mut PipelineBuilder) -> Result<(), ConfigurationError> {
        pipeline.add_inline_pattern(SimpleTagPattern::new(
            "del",
            "del",
            PRIORITY,
            DEL_RE.clone(),
        ))?;
        pipeline.add_inline_pattern(SimpleTagPattern::new(
            "ins",
            "ins",
            PRIORITY,
            INS_RE.clone(),
        ))
    }
}

pub(crate) fn factory(
    options: ExtensionOptions,
    _context: &ExtensionContext,
) -> Result<Box<dyn MarkdownExtension>, ConfigurationError> {
    options.finish()?;
    Ok(Box::new(DelIns))
}
