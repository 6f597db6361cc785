//! `nl2br`: every newline inside a paragraph becomes a line break.

use pulldown_cmark::Event;

use super::{
    EventFilter, ExtensionContext, ExtensionOptions, MarkdownExtension, PipelineBuilder,
};
use crate::error::ConfigurationError;

pub(crate) struct Nl2Br;

impl MarkdownExtension for Nl2Br {
    fn name(&self) -> &str {
        "nl2br"
    }

    fn extend(&self, pipeline: &mut PipelineBuilder) -> Result<(), ConfigurationError> {
        pipeline.add_event_filter(HardBreaks);
        Ok(())
    }
}

struct HardBreaks;

impl EventFilter for HardBreaks {
    fn name(&self) -> &'static str {
        "nl2br"
    }

    fn filter<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        events
            .into_iter()
            .map(|event| match event {
                Event::SoftBreak => Event::HardBreak,
                other => other,
            })
            .collect()
    }
}

pub(crate) fn factory(
    options: ExtensionOptions,
    _context: &ExtensionContext,
) -> Result<Box<dyn MarkdownExtension>, ConfigurationError> {
    options.finish()?;
    Ok(Box::new(Nl2Br))
}
