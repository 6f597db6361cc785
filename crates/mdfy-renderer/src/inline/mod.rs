//! Line-scoped inline patterns.
//!
//! After parsing, each run of inline events between line breaks is flattened
//! into a string in which non-text events are replaced by placeholder tokens.
//! Patterns run over that string in priority order. A match becomes an
//! [`Element`], which is itself replaced by a token, so later patterns see
//! the whole line and can wrap earlier results.

mod engine;

use regex::{Captures, Regex};

pub(crate) use engine::InlineEngine;

use crate::error::RenderError;
use crate::util::escape_html;

/// Marks the start of a placeholder token in a flattened line.
pub(crate) const TOKEN_START: char = '\u{2}';
/// Marks the end of a placeholder token in a flattened line.
pub(crate) const TOKEN_END: char = '\u{3}';

/// A regex rule that turns a match into an HTML element.
pub trait InlinePattern: Send + Sync {
    /// Unique name within a pipeline.
    fn name(&self) -> &str;

    /// Higher priorities run first. Ties keep registration order.
    fn priority(&self) -> i32;

    fn regex(&self) -> &Regex;

    /// Whether the pattern may match inside link text.
    fn allowed_in_links(&self) -> bool {
        true
    }

    /// Build the element for a match, or `None` to leave the text as is.
    fn handle(&self, found: &InlineMatch<'_>) -> Result<Option<Element>, RenderError>;
}

/// One regex match within a flattened line.
pub struct InlineMatch<'t> {
    captures: Captures<'t>,
    preceding: Option<char>,
}

impl<'t> InlineMatch<'t> {
    pub(crate) fn new(captures: Captures<'t>, preceding: Option<char>) -> Self {
        Self {
            captures,
            preceding,
        }
    }

    /// The whole match.
    pub fn as_str(&self) -> &'t str {
        self.group(0).unwrap_or_default()
    }

    /// A capture group, possibly containing placeholder tokens.
    ///
    /// Pass it to [`Element::inline`] to keep the formatting it covers.
    pub fn group(&self, index: usize) -> Option<&'t str> {
        self.captures.get(index).map(|m| m.as_str())
    }

    pub fn named(&self, name: &str) -> Option<&'t str> {
        self.captures.name(name).map(|m| m.as_str())
    }

    /// A capture group that covers plain text only.
    pub fn plain_group(&self, index: usize) -> Option<&'t str> {
        self.group(index)
            .filter(|text| !text.contains([TOKEN_START, TOKEN_END]))
    }

    /// The character right before the match in the flattened line.
    pub fn preceding_char(&self) -> Option<char> {
        self.preceding
    }
}

/// What an [`Element`] wraps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Empty,
    /// Literal text, escaped on output.
    Text(String),
    /// Part of the flattened line, handed to the remaining patterns.
    Inline(String),
}

/// An HTML element produced by an inline pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    content: Content,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            content: Content::Empty,
        }
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content = Content::Text(text.into());
        self
    }

    #[must_use]
    pub fn inline(mut self, markup: impl Into<String>) -> Self {
        self.content = Content::Inline(markup.into());
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub(crate) fn open_tag(&self) -> String {
        let mut html = format!("<{}", self.tag);
        for (name, value) in &self.attributes {
            html.push(' ');
            html.push_str(name);
            html.push_str("=\"");
            html.push_str(&escape_html(value));
            html.push('"');
        }
        html.push('>');
        html
    }

    /// Closing tag, or `None` for void elements.
    pub(crate) fn close_tag(&self) -> Option<String> {
        let void = matches!(self.tag.as_str(), "br" | "hr" | "img" | "input");
        (!void).then(|| format!("</{}>", self.tag))
    }
}

/// Wraps the first capture group in a fixed tag.
pub(crate) struct SimpleTagPattern {
    name: &'static str,
    tag: &'static str,
    priority: i32,
    regex: Regex,
}

impl SimpleTagPattern {
    pub(crate) fn new(name: &'static str, tag: &'static str, priority: i32, regex: Regex) -> Self {
        Self {
            name,
            tag,
            priority,
            regex,
        }
    }
}

impl InlinePattern for SimpleTagPattern {
    fn name(&self) -> &str {
        self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn regex(&self) -> &Regex {
        &self.regex
    }

    fn handle(&self, found: &InlineMatch<'_>) -> Result<Option<Element>, RenderError> {
        Ok(found
            .group(1)
            .map(|inner| Element::new(self.tag).inline(inner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_tag_escapes_attributes() {
        let element = Element::new("a").attr("href", "/u/\"x\"&y/");

        assert_eq!(element.open_tag(), r#"<a href="/u/&quot;x&quot;&amp;y/">"#);
    }

    #[test]
    fn test_void_elements_have_no_close_tag() {
        assert_eq!(Element::new("img").close_tag(), None);
        assert_eq!(Element::new("span").close_tag(), Some("</span>".to_owned()));
    }

    #[test]
    fn test_plain_group_rejects_tokens() {
        let regex = Regex::new(r"@\[([^\]]+)\]").unwrap();
        let line = "@[a\u{2}0\u{3}b]";
        let found = InlineMatch::new(regex.captures(line).unwrap(), None);

        assert_eq!(found.group(1), Some("a\u{2}0\u{3}b"));
        assert_eq!(found.plain_group(1), None);
    }
}
