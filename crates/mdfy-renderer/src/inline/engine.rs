//! Runs inline patterns over the parsed event stream.

use std::cmp::Reverse;
use std::fmt::Write;

use pulldown_cmark::{Event, Tag, TagEnd};

use super::{Content, Element, InlineMatch, InlinePattern, TOKEN_END, TOKEN_START};
use crate::error::RenderError;

/// Priority-ordered set of inline patterns.
pub(crate) struct InlineEngine {
    patterns: Vec<Box<dyn InlinePattern>>,
}

/// What a placeholder token stands for.
enum Slot<'a> {
    Open(Event<'a>),
    Close(Event<'a>),
    /// Events that patterns never look into (code spans, images, raw HTML).
    Atom(Vec<Event<'a>>),
    Element(Element),
    Taken,
}

impl Slot<'_> {
    fn opens_link(&self) -> bool {
        matches!(self, Slot::Open(Event::Start(Tag::Link { .. })))
    }

    fn closes_link(&self) -> bool {
        matches!(self, Slot::Close(Event::End(TagEnd::Link)))
    }
}

impl InlineEngine {
    pub(crate) fn new(mut patterns: Vec<Box<dyn InlinePattern>>) -> Self {
        patterns.sort_by_key(|p| Reverse(p.priority()));
        Self { patterns }
    }

    pub(crate) fn pattern_names(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.name()).collect()
    }

    /// Apply every pattern to every line of inline content.
    ///
    /// Code blocks pass through untouched. A line ends at a soft or hard
    /// break or at any block boundary.
    pub(crate) fn apply<'a>(&self, events: Vec<Event<'a>>) -> Result<Vec<Event<'a>>, RenderError> {
        if self.patterns.is_empty() {
            return Ok(events);
        }

        let mut out = Vec::with_capacity(events.len());
        let mut line = Vec::new();
        let mut in_code_block = false;
        let mut image_depth = 0usize;
        let mut link_depth = 0usize;

        for event in events {
            if in_code_block {
                in_code_block = !matches!(event, Event::End(TagEnd::CodeBlock));
                out.push(event);
                continue;
            }

            match event {
                Event::Start(Tag::Image { .. }) => image_depth += 1,
                Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
                _ => {}
            }
            if image_depth > 0 || is_inline(&event) {
                line.push(event);
                continue;
            }

            self.flush(&mut line, &mut link_depth, &mut out)?;
            in_code_block = matches!(event, Event::Start(Tag::CodeBlock(_)));
            out.push(event);
        }
        self.flush(&mut line, &mut link_depth, &mut out)?;

        Ok(out)
    }

    fn flush<'a>(
        &self,
        line: &mut Vec<Event<'a>>,
        link_depth: &mut usize,
        out: &mut Vec<Event<'a>>,
    ) -> Result<(), RenderError> {
        let events = std::mem::take(line);
        let in_link = *link_depth > 0;
        for event in &events {
            match event {
                Event::Start(Tag::Link { .. }) => *link_depth += 1,
                Event::End(TagEnd::Link) => *link_depth = link_depth.saturating_sub(1),
                _ => {}
            }
        }

        if !events.iter().any(|e| matches!(e, Event::Text(_))) {
            out.extend(events);
            return Ok(());
        }

        let (text, mut slots) = flatten(events);
        let text = self.run(text, 0, in_link, &mut slots)?;
        expand(&text, &mut slots, out);
        Ok(())
    }

    /// Run the patterns from `first` onwards over `text`.
    fn run(
        &self,
        mut text: String,
        first: usize,
        in_link: bool,
        slots: &mut Vec<Slot<'_>>,
    ) -> Result<String, RenderError> {
        for index in first..self.patterns.len() {
            text = self.apply_pattern(index, &text, in_link, slots)?;
        }
        Ok(text)
    }

    fn apply_pattern(
        &self,
        index: usize,
        text: &str,
        in_link: bool,
        slots: &mut Vec<Slot<'_>>,
    ) -> Result<String, RenderError> {
        let pattern = &self.patterns[index];
        let mut out = String::with_capacity(text.len());
        let mut copied = 0;
        let mut cursor = TokenCursor::default();

        for captures in pattern.regex().captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let range = whole.range();
            if range.is_empty() || range.start < copied {
                continue;
            }
            if cursor.advance(text, range.start, slots) {
                continue;
            }
            let link_open = cursor.link_depth > 0;
            if cursor.advance(text, range.end, slots) || !balanced(whole.as_str(), slots) {
                continue;
            }
            if !pattern.allowed_in_links()
                && (in_link || link_open || touches_link(whole.as_str(), slots))
            {
                continue;
            }

            let preceding = text[..range.start].chars().next_back();
            let found = InlineMatch::new(captures, preceding);
            let Some(mut element) = pattern.handle(&found)? else {
                continue;
            };

            if let Content::Inline(inner) = &element.content {
                if !well_formed(inner) || !balanced(inner, slots) {
                    continue;
                }
                let nested_in_link = in_link || element.tag == "a";
                let processed = self.run(inner.clone(), index + 1, nested_in_link, slots)?;
                element.content = Content::Inline(processed);
            }

            out.push_str(&text[copied..range.start]);
            push_token(&mut out, slots.len());
            slots.push(Slot::Element(element));
            copied = range.end;
        }

        out.push_str(&text[copied..]);
        Ok(out)
    }
}

fn is_inline(event: &Event<'_>) -> bool {
    match event {
        Event::Text(_)
        | Event::Code(_)
        | Event::InlineHtml(_)
        | Event::InlineMath(_)
        | Event::FootnoteReference(_) => true,
        Event::Start(tag) => matches!(
            tag,
            Tag::Emphasis
                | Tag::Strong
                | Tag::Strikethrough
                | Tag::Superscript
                | Tag::Subscript
                | Tag::Link { .. }
                | Tag::Image { .. }
        ),
        Event::End(tag) => matches!(
            tag,
            TagEnd::Emphasis
                | TagEnd::Strong
                | TagEnd::Strikethrough
                | TagEnd::Superscript
                | TagEnd::Subscript
                | TagEnd::Link
                | TagEnd::Image
        ),
        _ => false,
    }
}

/// Turn one line of events into a string with placeholder tokens.
fn flatten(events: Vec<Event<'_>>) -> (String, Vec<Slot<'_>>) {
    let mut text = String::new();
    let mut slots = Vec::new();
    let mut image: Vec<Event<'_>> = Vec::new();
    let mut image_depth = 0usize;

    for event in events {
        if image_depth > 0 || matches!(event, Event::Start(Tag::Image { .. })) {
            match event {
                Event::Start(Tag::Image { .. }) => image_depth += 1,
                Event::End(TagEnd::Image) => image_depth -= 1,
                _ => {}
            }
            image.push(event);
            if image_depth == 0 {
                push_token(&mut text, slots.len());
                slots.push(Slot::Atom(std::mem::take(&mut image)));
            }
            continue;
        }

        match event {
            Event::Text(t) => text.extend(t.chars().map(|c| {
                if c == TOKEN_START || c == TOKEN_END {
                    char::REPLACEMENT_CHARACTER
                } else {
                    c
                }
            })),
            Event::Start(_) => {
                push_token(&mut text, slots.len());
                slots.push(Slot::Open(event));
            }
            Event::End(_) => {
                push_token(&mut text, slots.len());
                slots.push(Slot::Close(event));
            }
            other => {
                push_token(&mut text, slots.len());
                slots.push(Slot::Atom(vec![other]));
            }
        }
    }

    if !image.is_empty() {
        push_token(&mut text, slots.len());
        slots.push(Slot::Atom(image));
    }

    (text, slots)
}

/// Turn a processed line back into events.
fn expand<'a>(text: &str, slots: &mut [Slot<'a>], out: &mut Vec<Event<'a>>) {
    let mut rest = text;

    while let Some(start) = rest.find(TOKEN_START) {
        if start > 0 {
            out.push(Event::Text(rest[..start].to_owned().into()));
        }
        let after = &rest[start + TOKEN_START.len_utf8()..];
        let Some(end) = after.find(TOKEN_END) else {
            rest = after;
            break;
        };
        if let Ok(id) = after[..end].parse::<usize>() {
            expand_slot(id, slots, out);
        }
        rest = &after[end + TOKEN_END.len_utf8()..];
    }

    if !rest.is_empty() {
        out.push(Event::Text(rest.to_owned().into()));
    }
}

fn expand_slot<'a>(id: usize, slots: &mut [Slot<'a>], out: &mut Vec<Event<'a>>) {
    let Some(slot) = slots.get_mut(id) else {
        return;
    };

    match std::mem::replace(slot, Slot::Taken) {
        Slot::Open(event) | Slot::Close(event) => out.push(event),
        Slot::Atom(events) => out.extend(events),
        Slot::Element(element) => {
            out.push(Event::InlineHtml(element.open_tag().into()));
            let close = element.close_tag();
            match element.content {
                Content::Empty => {}
                Content::Text(text) => out.push(Event::Text(text.into())),
                Content::Inline(markup) => expand(&markup, slots, out),
            }
            if let Some(close) = close {
                out.push(Event::InlineHtml(close.into()));
            }
        }
        Slot::Taken => {}
    }
}

fn push_token(text: &mut String, id: usize) {
    write!(text, "{TOKEN_START}{id}{TOKEN_END}").unwrap();
}

/// Token ids in order of appearance.
fn token_ids(text: &str) -> impl Iterator<Item = usize> + '_ {
    text.split(TOKEN_START)
        .skip(1)
        .filter_map(|piece| piece.split_once(TOKEN_END))
        .filter_map(|(id, _)| id.parse().ok())
}

/// Token state of a line at a byte offset.
///
/// Matches arrive in increasing order, so the cursor only moves forward and a
/// whole pattern pass reads each byte of the line once.
#[derive(Default)]
struct TokenCursor {
    pos: usize,
    /// Byte offset of the id of the token being read, if inside one.
    token: Option<usize>,
    link_depth: usize,
}

impl TokenCursor {
    /// Move to byte offset `target` and report whether it falls inside a
    /// placeholder token.
    fn advance(&mut self, text: &str, target: usize, slots: &[Slot<'_>]) -> bool {
        if target > self.pos {
            for (offset, c) in text[self.pos..target].char_indices() {
                let at = self.pos + offset;
                match c {
                    TOKEN_START => self.token = Some(at + TOKEN_START.len_utf8()),
                    TOKEN_END => {
                        let Some(start) = self.token.take() else {
                            continue;
                        };
                        match text[start..at].parse::<usize>().ok().and_then(|id| slots.get(id)) {
                            Some(slot) if slot.opens_link() => self.link_depth += 1,
                            Some(slot) if slot.closes_link() => {
                                self.link_depth = self.link_depth.saturating_sub(1);
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }
            self.pos = target;
        }
        self.token.is_some()
    }
}

/// Token markers alternate and every token is closed.
fn well_formed(text: &str) -> bool {
    let mut in_token = false;
    for c in text.chars() {
        match c {
            TOKEN_START if in_token => return false,
            TOKEN_END if !in_token => return false,
            TOKEN_START | TOKEN_END => in_token = !in_token,
            _ => {}
        }
    }
    !in_token
}

/// Every container opened in `text` is also closed in it, and vice versa.
fn balanced(text: &str, slots: &[Slot<'_>]) -> bool {
    let mut depth = 0usize;
    for id in token_ids(text) {
        match slots.get(id) {
            Some(Slot::Open(_)) => depth += 1,
            Some(Slot::Close(_)) => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}

fn touches_link(text: &str, slots: &[Slot<'_>]) -> bool {
    token_ids(text).any(|id| {
        slots
            .get(id)
            .is_some_and(|slot| slot.opens_link() || slot.closes_link())
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{CowStr, LinkType, Parser};
    use regex::Regex;

    use super::*;
    use crate::inline::SimpleTagPattern;

    fn del() -> Box<dyn InlinePattern> {
        Box::new(SimpleTagPattern::new(
            "del",
            "del",
            75,
            Regex::new(r"~~(.+?)~~").unwrap(),
        ))
    }

    struct Shout;

    impl InlinePattern for Shout {
        fn name(&self) -> &str {
            "shout"
        }

        fn priority(&self) -> i32 {
            100
        }

        fn regex(&self) -> &Regex {
            static SHOUT: std::sync::LazyLock<Regex> =
                std::sync::LazyLock::new(|| Regex::new(r"!!(\w+)").unwrap());
            &SHOUT
        }

        fn allowed_in_links(&self) -> bool {
            false
        }

        fn handle(&self, found: &InlineMatch<'_>) -> Result<Option<Element>, RenderError> {
            Ok(found
                .plain_group(1)
                .map(|word| Element::new("b").text(word.to_uppercase())))
        }
    }

    fn apply(patterns: Vec<Box<dyn InlinePattern>>, markdown: &str) -> Vec<Event<'static>> {
        let events: Vec<Event<'_>> = Parser::new(markdown).collect();
        InlineEngine::new(patterns)
            .apply(events)
            .unwrap()
            .into_iter()
            .map(Event::into_static)
            .collect()
    }

    fn html(s: &str) -> Event<'static> {
        Event::InlineHtml(CowStr::from(s.to_owned()))
    }

    fn text(s: &str) -> Event<'static> {
        Event::Text(CowStr::from(s.to_owned()))
    }

    #[test]
    fn test_priority_order_is_descending_and_stable() {
        let engine = InlineEngine::new(vec![
            del(),
            Box::new(Shout),
            Box::new(SimpleTagPattern::new(
                "ins",
                "ins",
                75,
                Regex::new(r"\+\+(.+?)\+\+").unwrap(),
            )),
        ]);

        assert_eq!(engine.pattern_names(), vec!["shout", "del", "ins"]);
    }

    #[test]
    fn test_wraps_match_in_element() {
        let events = apply(vec![del()], "a ~~b~~ c");

        assert_eq!(
            events,
            vec![
                Event::Start(Tag::Paragraph),
                text("a "),
                html("<del>"),
                text("b"),
                html("</del>"),
                text(" c"),
                Event::End(TagEnd::Paragraph),
            ]
        );
    }

    #[test]
    fn test_keeps_inner_formatting() {
        let events = apply(vec![del()], "~~a *b* c~~");

        assert_eq!(
            events,
            vec![
                Event::Start(Tag::Paragraph),
                html("<del>"),
                text("a "),
                Event::Start(Tag::Emphasis),
                text("b"),
                Event::End(TagEnd::Emphasis),
                text(" c"),
                html("</del>"),
                Event::End(TagEnd::Paragraph),
            ]
        );
    }

    #[test]
    fn test_rejects_match_that_cuts_formatting() {
        let events = apply(vec![del()], "~~a *b~~ c*");

        assert!(!events.contains(&html("<del>")));
    }

    #[test]
    fn test_line_break_ends_scope() {
        let events = apply(vec![del()], "~~a\nb~~");

        assert!(!events.contains(&html("<del>")));
        assert!(events.contains(&Event::SoftBreak));
    }

    #[test]
    fn test_code_span_is_opaque() {
        let events = apply(vec![del()], "`~~a~~`");

        assert_eq!(
            events,
            vec![
                Event::Start(Tag::Paragraph),
                Event::Code(CowStr::from("~~a~~")),
                Event::End(TagEnd::Paragraph),
            ]
        );
    }

    #[test]
    fn test_code_block_is_untouched() {
        let events = apply(vec![del()], "```\n~~a~~\n```\n");

        assert!(!events.contains(&html("<del>")));
        assert!(events.contains(&text("~~a~~\n")));
    }

    #[test]
    fn test_image_alt_is_opaque() {
        let events = apply(vec![del()], "![~~a~~](x.png)");

        assert!(!events.contains(&html("<del>")));
    }

    #[test]
    fn test_pattern_skips_link_text_when_not_allowed() {
        let events = apply(vec![Box::new(Shout)], "[!!hey](/x) !!you");

        assert_eq!(
            events,
            vec![
                Event::Start(Tag::Paragraph),
                Event::Start(Tag::Link {
                    link_type: LinkType::Inline,
                    dest_url: CowStr::from("/x"),
                    title: CowStr::from(""),
                    id: CowStr::from(""),
                }),
                text("!!hey"),
                Event::End(TagEnd::Link),
                text(" "),
                html("<b>"),
                text("YOU"),
                html("</b>"),
                Event::End(TagEnd::Paragraph),
            ]
        );
    }

    #[test]
    fn test_later_pattern_sees_earlier_element() {
        let events = apply(vec![del(), Box::new(Shout)], "~~!!hi there~~");

        assert_eq!(
            events,
            vec![
                Event::Start(Tag::Paragraph),
                html("<del>"),
                html("<b>"),
                text("HI"),
                html("</b>"),
                text(" there"),
                html("</del>"),
                Event::End(TagEnd::Paragraph),
            ]
        );
    }

    #[test]
    fn test_control_characters_in_text_cannot_forge_tokens() {
        let events = apply(vec![del()], "~~a\u{2}0\u{3}~~");

        assert!(events.contains(&html("<del>")));
        assert!(events.contains(&text("a\u{fffd}0\u{fffd}")));
    }

    #[test]
    fn test_no_patterns_is_identity() {
        let events = apply(Vec::new(), "~~a~~ *b*");
        let expected: Vec<Event<'static>> = Parser::new("~~a~~ *b*").map(Event::into_static).collect();

        assert_eq!(events, expected);
    }

    #[test]
    fn test_cursor_tracks_tokens() {
        let text = "a\u{2}12\u{3}b";
        let mut cursor = TokenCursor::default();

        assert!(!cursor.advance(text, 1, &[]));
        assert!(cursor.advance(text, 2, &[]));
        assert!(cursor.advance(text, 3, &[]));
        assert!(!cursor.advance(text, 5, &[]));
    }

    #[test]
    fn test_cursor_tracks_link_depth() {
        let events: Vec<Event<'_>> = Parser::new("[a](/x) b").collect();
        let (text, slots) = flatten(events);
        let mut cursor = TokenCursor::default();

        let inside = text.find('a').unwrap();
        cursor.advance(&text, inside, &slots);
        assert_eq!(cursor.link_depth, 1);

        cursor.advance(&text, text.len(), &slots);
        assert_eq!(cursor.link_depth, 0);
    }

    #[test]
    fn test_long_line_with_many_matches() {
        let line = "x !!hey ".repeat(50_000);
        let started = std::time::Instant::now();

        let events = apply(vec![Box::new(Shout)], &line);

        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(events.iter().filter(|e| **e == html("<b>")).count(), 50_000);
    }

    #[test]
    fn test_well_formed() {
        assert!(well_formed("a\u{2}1\u{3}"));
        assert!(!well_formed("a\u{2}1"));
        assert!(!well_formed("1\u{3}b"));
    }
}
