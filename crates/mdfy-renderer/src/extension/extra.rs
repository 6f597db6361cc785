//! `extra`: tables, footnotes and definition lists.

use pulldown_cmark::Options;

use super::{ExtensionContext, ExtensionOptions, MarkdownExtension, PipelineBuilder};
use crate::error::ConfigurationError;

pub(crate) struct Extra;

impl MarkdownExtension for Extra {
    fn name(&self) -> &str {
        "extra"
    }

    fn extend(&self, pipeline: &mut PipelineBuilder) -> Result<(), ConfigurationError> {
        pipeline.enable(
            Options::ENABLE_TABLES | Options::ENABLE_FOOTNOTES | Options::ENABLE_DEFINITION_LIST,
        );
        Ok(())
    }
}

pub(crate) fn factory(
    options: ExtensionOptions,
    _context: &ExtensionContext,
) -> Result<Box<dyn MarkdownExtension>, ConfigurationError> {
    options.finish()?;
    Ok(Box::new(Extra))
}
