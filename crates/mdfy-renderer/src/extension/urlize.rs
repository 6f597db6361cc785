//! `urlize`: bare `http(s)://` and `www.` addresses become links.

use std::sync::LazyLock;

use regex::Regex;

use super::{ExtensionContext, ExtensionOptions, MarkdownExtension, PipelineBuilder};
use crate::error::{ConfigurationError, RenderError};
use crate::inline::{Element, InlineMatch, InlinePattern};

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(?:https?://|www\.)[^\s<>"'\x02\x03]*[^\s<>"'.,;:!?)\x02\x03]"#,
    )
    .unwrap()
});

pub(crate) struct Urlize;

impl MarkdownExtension for Urlize {
    fn name(&self) -> &str {
        "urlize"
    }

    fn extend(&self, pipeline: &mut PipelineBuilder) -> Result<(), ConfigurationError> {
        pipeline.add_inline_pattern(UrlPattern)
    }
}

struct UrlPattern;

impl InlinePattern for UrlPattern {
    fn name(&self) -> &str {
        "urlize"
    }

    fn priority(&self) -> i32 {
        120
    }

    fn regex(&self) -> &Regex {
        &URL_RE
    }

    fn allowed_in_links(&self) -> bool {
        false
    }

    fn handle(&self, found: &InlineMatch<'_>) -> Result<Option<Element>, RenderError> {
        let url = found.as_str();
        let href = if url.len() > 4 && url[..4].eq_ignore_ascii_case("www.") {
            format!("http://{url}")
        } else {
            url.to_owned()
        };
        Ok(Some(Element::new("a").attr("href", href).text(url)))
    }
}

pub(crate) fn factory(
    options: ExtensionOptions,
    _context: &ExtensionContext,
) -> Result<Box<dyn MarkdownExtension>, ConfigurationError> {
    options.finish()?;
    Ok(Box::new(Urlize))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(text: &str) -> Vec<&str> {
        URL_RE.find_iter(text).map(|m| m.as_str()).collect()
    }

    #[test]
    fn test_trailing_punctuation_is_not_part_of_url() {
        assert_eq!(
            urls("see https://example.com/a?b=c. and (www.rust-lang.org)"),
            vec!["https://example.com/a?b=c", "www.rust-lang.org"]
        );
    }

    #[test]
    fn test_requires_word_boundary() {
        assert!(urls("foohttps://example.com").is_empty());
    }
}
