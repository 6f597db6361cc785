//! `video`: bare YouTube, Vimeo and Dailymotion links become embedded players.

use std::sync::LazyLock;

use regex::Regex;

use super::{ExtensionContext, ExtensionOptions, MarkdownExtension, PipelineBuilder};
use crate::error::{ConfigurationError, RenderError};
use crate::inline::{Element, InlineMatch, InlinePattern};

static VIDEO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \bhttps?://(?:www\.|m\.)?(?:
            youtube\.com/watch\?(?:[^\s\x02\x03]*?&)?v=(?P<youtube>[\w-]{11})
          | youtu\.be/(?P<youtu_be>[\w-]{11})
          | vimeo\.com/(?P<vimeo>\d+)
          | dailymotion\.com/video/(?P<dailymotion>[A-Za-z0-9]+)
        )
        [^\s<\x02\x03]*",
    )
    .unwrap()
});

const DEFAULT_WIDTH: u32 = 560;
const DEFAULT_HEIGHT: u32 = 315;

pub(crate) struct Video {
    width: u32,
    height: u32,
}

impl MarkdownExtension for Video {
    fn name(&self) -> &str {
        "video"
    }

    fn extend(&self, pipeline: &mut PipelineBuilder) -> Result<(), ConfigurationError> {
        pipeline.add_inline_pattern(VideoPattern {
            width: self.width.to_string(),
            height: self.height.to_string(),
        })
    }
}

struct VideoPattern {
    width: String,
    height: String,
}

impl VideoPattern {
    fn embed_url(found: &InlineMatch<'_>) -> Option<String> {
        if let Some(id) = found.named("youtube").or_else(|| found.named("youtu_be")) {
            Some(format!("https://www.youtube.com/embed/{id}"))
        } else if let Some(id) = found.named("vimeo") {
            Some(format!("https://player.vimeo.com/video/{id}"))
        } else {
            found
                .named("dailymotion")
                .map(|id| format!("https://www.dailymotion.com/embed/video/{id}"))
        }
    }
}

impl InlinePattern for VideoPattern {
    fn name(&self) -> &str {
        "video"
    }

    fn priority(&self) -> i32 {
        140
    }

    fn regex(&self) -> &Regex {
        &VIDEO_RE
    }

    fn allowed_in_links(&self) -> bool {
        false
    }

    fn handle(&self, found: &InlineMatch<'_>) -> Result<Option<Element>, RenderError> {
        Ok(Self::embed_url(found).map(|src| {
            Element::new("iframe")
                .attr("src", src)
                .attr("width", self.width.as_str())
                .attr("height", self.height.as_str())
                .attr("frameborder", "0")
                .attr("allowfullscreen", "true")
        }))
    }
}

pub(crate) fn factory(
    mut options: ExtensionOptions,
    _context: &ExtensionContext,
) -> Result<Box<dyn MarkdownExtension>, ConfigurationError> {
    let width = options.take_parsed("width")?.unwrap_or(DEFAULT_WIDTH);
    let height = options.take_parsed("height")?.unwrap_or(DEFAULT_HEIGHT);
    options.finish()?;
    Ok(Box::new(Video { width, height }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionConfig;

    fn embed(text: &str) -> Option<String> {
        let captures = VIDEO_RE.captures(text)?;
        VideoPattern::embed_url(&InlineMatch::new(captures, None))
    }

    #[test]
    fn test_youtube_watch_url() {
        assert_eq!(
            embed("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_youtube_watch_url_with_leading_params() {
        assert_eq!(
            embed("https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_youtu_be_url() {
        assert_eq!(
            embed("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_vimeo_url() {
        assert_eq!(
            embed("http://vimeo.com/76979871").as_deref(),
            Some("https://player.vimeo.com/video/76979871")
        );
    }

    #[test]
    fn test_dailymotion_url() {
        assert_eq!(
            embed("https://www.dailymotion.com/video/x7tgad0").as_deref(),
            Some("https://www.dailymotion.com/embed/video/x7tgad0")
        );
    }

    #[test]
    fn test_other_urls_do_not_match() {
        assert_eq!(embed("https://example.com/watch?v=dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_options_override_size() {
        let config = ExtensionConfig::new(["video"])
            .with_option("video", "width", "640")
            .with_option("video", "height", "360");
        let video = factory(config.options_for("video"), &ExtensionContext::new()).unwrap();
        let mut pipeline = PipelineBuilder::new();
        video.extend(&mut pipeline).unwrap();

        let captures = VIDEO_RE.captures("https://youtu.be/dQw4w9WgXcQ").unwrap();
        let element = pipeline.patterns[0]
            .handle(&InlineMatch::new(captures, None))
            .unwrap();

        assert_eq!(
            element,
            Some(
                Element::new("iframe")
                    .attr("src", "https://www.youtube.com/embed/dQw4w9WgXcQ")
                    .attr("width", "640")
                    .attr("height", "360")
                    .attr("frameborder", "0")
                    .attr("allowfullscreen", "true")
            )
        );
    }
}
