//! `escape_html`: raw HTML typed by the user is shown as text.
//!
//! HTML blocks turn into paragraphs of literal text and inline HTML turns
//! into literal text. Elements generated by inline patterns are added after
//! this filter runs and are not affected.

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

use super::{
    EventFilter, ExtensionContext, ExtensionOptions, MarkdownExtension, PipelineBuilder,
};
use crate::error::ConfigurationError;

pub(crate) struct EscapeHtml;

impl MarkdownExtension for EscapeHtml {
    fn name(&self) -> &str {
        "escape_html"
    }

    fn extend(&self, pipeline: &mut PipelineBuilder) -> Result<(), ConfigurationError> {
        pipeline.add_event_filter(LiteralHtml);
        Ok(())
    }
}

struct LiteralHtml;

impl EventFilter for LiteralHtml {
    fn name(&self) -> &'static str {
        "escape_html"
    }

    /// Runs before filters that rewrite breaks, so they see the line
    /// breaks of escaped HTML blocks.
    fn priority(&self) -> i32 {
        100
    }

    fn filter<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut out = Vec::with_capacity(events.len());

        for event in events {
            match event {
                Event::Start(Tag::HtmlBlock) => out.push(Event::Start(Tag::Paragraph)),
                Event::End(TagEnd::HtmlBlock) => {
                    if out.last() == Some(&Event::SoftBreak) {
                        out.pop();
                    }
                    out.push(Event::End(TagEnd::Paragraph));
                }
                Event::Html(html) => {
                    let (line, newline) = match html.strip_suffix('\n') {
                        Some(line) => (line.trim_end_matches('\r'), true),
                        None => (&*html, false),
                    };
                    out.push(Event::Text(CowStr::from(line.to_owned())));
                    if newline {
                        out.push(Event::SoftBreak);
                    }
                }
                Event::InlineHtml(html) => out.push(Event::Text(html)),
                other => out.push(other),
            }
        }

        out
    }
}

pub(crate) fn factory(
    options: ExtensionOptions,
    _context: &ExtensionContext,
) -> Result<Box<dyn MarkdownExtension>, ConfigurationError> {
    options.finish()?;
    Ok(Box::new(EscapeHtml))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use pulldown_cmark::Parser;

    use super::*;

    fn text(s: &str) -> Event<'static> {
        Event::Text(CowStr::from(s.to_owned()))
    }

    #[test]
    fn test_html_block_becomes_paragraph() {
        let events = LiteralHtml.filter(Parser::new("<div>\nhi\n</div>\n").collect());

        assert_eq!(
            events,
            vec![
                Event::Start(Tag::Paragraph),
                text("<div>"),
                Event::SoftBreak,
                text("hi"),
                Event::SoftBreak,
                text("</div>"),
                Event::End(TagEnd::Paragraph),
            ]
        );
    }

    #[test]
    fn test_inline_html_becomes_text() {
        let events = LiteralHtml.filter(Parser::new("a <b>bold</b> c").collect());

        assert!(events.contains(&text("<b>")));
        assert!(!events.iter().any(|e| matches!(e, Event::InlineHtml(_))));
    }
}
