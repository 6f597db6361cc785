//! `mention`: `@[username]` links to an active user's page.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::{ExtensionContext, ExtensionOptions, MarkdownExtension, PipelineBuilder};
use crate::directory::UserDirectory;
use crate::error::{ConfigurationError, RenderError};
use crate::inline::{Element, InlineMatch, InlinePattern};

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\[([^\]]+)\]").unwrap());

pub(crate) struct Mention {
    base_url: String,
    /// `None` when the mention feature is off.
    directory: Option<Arc<dyn UserDirectory>>,
}

impl MarkdownExtension for Mention {
    fn name(&self) -> &str {
        "mention"
    }

    fn extend(&self, pipeline: &mut PipelineBuilder) -> Result<(), ConfigurationError> {
        match &self.directory {
            Some(directory) => pipeline.add_inline_pattern(MentionPattern {
                base_url: self.base_url.clone(),
                directory: Arc::clone(directory),
            }),
            None => Ok(()),
        }
    }
}

struct MentionPattern {
    base_url: String,
    directory: Arc<dyn UserDirectory>,
}

impl InlinePattern for MentionPattern {
    fn name(&self) -> &str {
        "mention"
    }

    fn priority(&self) -> i32 {
        110
    }

    fn regex(&self) -> &Regex {
        &MENTION_RE
    }

    fn allowed_in_links(&self) -> bool {
        false
    }

    fn handle(&self, found: &InlineMatch<'_>) -> Result<Option<Element>, RenderError> {
        if found.preceding_char() == Some('!') {
            return Ok(None);
        }
        let Some(username) = found.plain_group(1) else {
            return Ok(None);
        };
        let Some(user) = self.directory.find_active_user(username)? else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }

        Ok(Some(
            Element::new("a")
                .attr("class", "direct-mention-link")
                .attr("href", format!("{}{}/", self.base_url, user.username))
                .text(format!("@{}", user.username)),
        ))
    }
}

pub(crate) fn factory(
    mut options: ExtensionOptions,
    context: &ExtensionContext,
) -> Result<Box<dyn MarkdownExtension>, ConfigurationError> {
    let base_url = options
        .take_string("base_url")
        .unwrap_or_else(|| context.mention_base_url.clone());
    options.finish()?;

    let directory = if context.mention_enabled {
        let directory = context
            .directory
            .as_ref()
            .ok_or(ConfigurationError::MissingUserDirectory)?;
        Some(Arc::clone(directory))
    } else {
        None
    };

    Ok(Box::new(Mention {
        base_url,
        directory,
    }))
}
