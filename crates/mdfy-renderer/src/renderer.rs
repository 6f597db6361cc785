//! HTML renderer for pulldown-cmark events.
//!
//! Emits compact HTML5 with no whitespace between blocks. Footnote
//! definitions are collected while rendering and appended at the end.

use std::fmt::Write;

use pulldown_cmark::{CodeBlockKind, Event, Tag, TagEnd};

use crate::state::{FootnoteState, ImageState, TableState};
use crate::util::{escape_html, heading_level_to_num};

/// Render an event stream to an HTML string.
pub(crate) fn render_html<'a, I>(events: I) -> String
where
    I: IntoIterator<Item = Event<'a>>,
{
    let mut renderer = HtmlRenderer::new();
    for event in events {
        renderer.process_event(event);
    }
    renderer.finish()
}

pub(crate) struct HtmlRenderer {
    output: String,
    table: TableState,
    image: ImageState,
    footnotes: FootnoteState,
    pending_image: Vec<(String, String)>,
}

impl HtmlRenderer {
    pub(crate) fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            table: TableState::default(),
            image: ImageState::default(),
            footnotes: FootnoteState::default(),
            pending_image: Vec::new(),
        }
    }

    pub(crate) fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) | Event::InlineMath(text) | Event::DisplayMath(text) => {
                self.text(&text);
            }
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.raw_html(&html),
            Event::FootnoteReference(label) => self.footnote_reference(&label),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.output.push_str("<br>"),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => {
                self.output.push_str(if checked {
                    r#"<input type="checkbox" disabled checked>"#
                } else {
                    r#"<input type="checkbox" disabled>"#
                });
            }
        }
    }

    /// Close the document and append collected footnotes.
    pub(crate) fn finish(mut self) -> String {
        let definitions = self.footnotes.take_definitions();
        if !definitions.is_empty() {
            self.output.push_str(r#"<div class="footnote"><hr><ol>"#);
            for (label, body) in definitions {
                let label = escape_html(&label);
                write!(
                    self.output,
                    r##"<li id="fn-{label}">{body}<a class="footnote-backref" href="#fnref-{label}">&#8617;</a></li>"##
                )
                .unwrap();
            }
            self.output.push_str("</ol></div>");
        }
        self.output
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        // alt text is plain, formatting inside it is dropped
        if self.image.is_active() && !matches!(tag, Tag::Image { .. }) {
            return;
        }
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => {
                write!(self.output, "<h{}>", heading_level_to_num(level)).unwrap();
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => match kind {
                CodeBlockKind::Fenced(info) if !info.trim().is_empty() => {
                    let lang = info.split_whitespace().next().unwrap_or_default();
                    write!(
                        self.output,
                        r#"<pre><code class="language-{}">"#,
                        escape_html(lang)
                    )
                    .unwrap();
                }
                _ => self.output.push_str("<pre><code>"),
            },
            Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(label) => {
                self.footnotes.start_definition(&label, &mut self.output);
            }
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.output.push_str("<em>"),
            Tag::Strong => self.output.push_str("<strong>"),
            Tag::Strikethrough => self.output.push_str("<del>"),
            Tag::Superscript => self.output.push_str("<sup>"),
            Tag::Subscript => self.output.push_str("<sub>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                write!(self.output, r#"<a href="{}""#, escape_html(&dest_url)).unwrap();
                if !title.is_empty() {
                    write!(self.output, r#" title="{}""#, escape_html(&title)).unwrap();
                }
                self.output.push('>');
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image.start();
                self.pending_image
                    .push((dest_url.into_string(), title.into_string()));
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        if self.image.is_active() && tag != TagEnd::Image {
            return;
        }
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(level) => {
                write!(self.output, "</h{}>", heading_level_to_num(level)).unwrap();
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => self.output.push_str("</code></pre>"),
            TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::List(ordered) => self.output.push_str(if ordered { "</ol>" } else { "</ul>" }),
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition => self.footnotes.end_definition(&mut self.output),
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.output.push_str("</em>"),
            TagEnd::Strong => self.output.push_str("</strong>"),
            TagEnd::Strikethrough => self.output.push_str("</del>"),
            TagEnd::Superscript => self.output.push_str("</sup>"),
            TagEnd::Subscript => self.output.push_str("</sub>"),
            TagEnd::Link => self.output.push_str("</a>"),
            TagEnd::Image => {
                let alt = self.image.end();
                if let (Some(alt), Some((src, title))) = (alt, self.pending_image.pop()) {
                    self.image_tag(&src, &alt, &title);
                }
            }
        }
    }

    fn image_tag(&mut self, src: &str, alt: &str, title: &str) {
        write!(
            self.output,
            r#"<img src="{}" alt="{}""#,
            escape_html(src),
            escape_html(alt)
        )
        .unwrap();
        if !title.is_empty() {
            write!(self.output, r#" title="{}""#, escape_html(title)).unwrap();
        }
        self.output.push('>');
    }

    fn text(&mut self, text: &str) {
        if self.image.is_active() {
            self.image.push_str(text);
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
        } else {
            write!(self.output, "<code>{}</code>", escape_html(code)).unwrap();
        }
    }

    fn raw_html(&mut self, html: &str) {
        if !self.image.is_active() {
            self.output.push_str(html);
        }
    }

    fn soft_break(&mut self) {
        if self.image.is_active() {
            self.image.push_str(" ");
        } else {
            self.output.push('\n');
        }
    }

    fn footnote_reference(&mut self, label: &str) {
        let (number, first) = self.footnotes.reference(label);
        let id = escape_html(&label.to_lowercase());
        if first {
            write!(self.output, r#"<sup id="fnref-{id}">"#).unwrap();
        } else {
            self.output.push_str("<sup>");
        }
        write!(
            self.output,
            r##"<a class="footnote-ref" href="#fn-{id}">{number}</a></sup>"##
        )
        .unwrap();
    }
}
