//! `smarty`: curly quotes, dashes and ellipses.

use pulldown_cmark::Options;

use super::{ExtensionContext, ExtensionOptions, MarkdownExtension, PipelineBuilder};
use crate::error::ConfigurationError;

pub(crate) struct Smarty;

impl MarkdownExtension for Smarty {
    fn name(&self) -> &str {
        "smarty"
    }

    fn extend(&self, pipeline: &mut PipelineBuilder) -> Result<(), ConfigurationError> {
        pipeline.enable(Options::ENABLE_SMART_PUNCTUATION);
        Ok(())
    }
}

pub(crate) fn factory(
    options: ExtensionOptions,
    _context: &ExtensionContext,
) -> Result<Box<dyn MarkdownExtension>, ConfigurationError> {
    options.finish()?;
    Ok(Box::new(Smarty))
}
