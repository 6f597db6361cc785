//! `emoji`: `:name:` shortcodes render as GitHub emoji images.

use std::sync::LazyLock;

use regex::Regex;

use super::{ExtensionContext, ExtensionOptions, MarkdownExtension, PipelineBuilder};
use crate::error::{ConfigurationError, RenderError};
use crate::inline::{Element, InlineMatch, InlinePattern};

static EMOJI_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":([a-z0-9_+-]+):").unwrap());

/// GitHub shortcodes with no Unicode counterpart, sorted for binary search.
const GITHUB_CUSTOM: &[&str] = &[
    "atom", "basecamp", "basecampy", "bowtie", "dependabot", "electron", "feelsgood",
    "finnadie", "fishsticks", "goberserk", "godmode", "hurtrealbad", "neckbeard", "octocat",
    "rage1", "rage2", "rage3", "rage4", "shipit", "suspect", "trollface",
];

/// Whether GitHub serves an emoji image for `name`.
fn is_known(name: &str) -> bool {
    emojis::get_by_shortcode(name).is_some() || GITHUB_CUSTOM.binary_search(&name).is_ok()
}

pub(crate) struct Emoji {
    base_url: String,
    enabled: bool,
}

impl MarkdownExtension for Emoji {
    fn name(&self) -> &str {
        "emoji"
    }

    fn extend(&self, pipeline: &mut PipelineBuilder) -> Result<(), ConfigurationError> {
        if !self.enabled {
            return Ok(());
        }
        pipeline.add_inline_pattern(EmojiPattern {
            base_url: self.base_url.clone(),
        })
    }
}

struct EmojiPattern {
    base_url: String,
}

impl InlinePattern for EmojiPattern {
    fn name(&self) -> &str {
        "emoji"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn regex(&self) -> &Regex {
        &EMOJI_RE
    }

    fn handle(&self, found: &InlineMatch<'_>) -> Result<Option<Element>, RenderError> {
        Ok(found.plain_group(1).filter(|name| is_known(name)).map(|name| {
            Element::new("img")
                .attr("class", "marked-emoji")
                .attr("src", format!("{}{name}.png", self.base_url))
                .attr("alt", format!(":{name}:"))
        }))
    }
}

pub(crate) fn factory(
    mut options: ExtensionOptions,
    context: &ExtensionContext,
) -> Result<Box<dyn MarkdownExtension>, ConfigurationError> {
    let base_url = options
        .take_string("base_url")
        .unwrap_or_else(|| context.emoji_base_url.clone());
    options.finish()?;
    Ok(Box::new(Emoji {
        base_url,
        enabled: context.emoji_enabled,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_names_are_sorted() {
        assert!(GITHUB_CUSTOM.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_known_names() {
        for name in [
            "smile", "+1", "-1", "smile_cat", "rainbow", "apple", "red_circle", "kissing", "ok",
            "thumbsup", "hankey", "octocat", "shipit",
        ] {
            assert!(is_known(name), "{name}");
        }
        assert!(!is_known("not_an_emoji"));
    }
}
