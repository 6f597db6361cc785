//! Link-scheme pre-sanitization.
//!
//! Runs on raw markdown before parsing. For every inline link or image
//! target `[text](target)` whose destination carries a scheme that is not
//! allow-listed, the destination is cut down to whatever follows its last `:`
//! or `;`, so `[x](javascript:alert(1))` becomes `[x](alert(1))`.
//!
//! The destination ends at the first unbalanced `)` or whitespace. Link text,
//! titles and everything after the link are copied through untouched, so a
//! rewrite never reaches into the next sentence or the next link.

use std::collections::BTreeSet;

use crate::extension::Preprocessor;
use crate::fence::{FenceTracker, code_span_end};

/// Rewrites link destinations that use a scheme outside the allow-list.
#[derive(Clone, Debug)]
pub struct LinkGuard {
    schemes: BTreeSet<String>,
}

impl LinkGuard {
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            schemes: schemes
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Return the guarded markdown, or `None` when nothing needed rewriting.
    pub fn guard(&self, markdown: &str) -> Option<String> {
        let mut out = String::with_capacity(markdown.len());
        let mut fence = FenceTracker::new();
        let mut open_brackets = 0;
        let mut changed = false;

        for line in markdown.split_inclusive('\n') {
            if fence.update(line) || fence.in_fence() {
                open_brackets = 0;
                out.push_str(line);
                continue;
            }
            if line.trim().is_empty() {
                open_brackets = 0;
            }
            changed |= self.guard_line(line, &mut open_brackets, &mut out);
        }

        changed.then_some(out)
    }

    fn guard_line(&self, line: &str, open_brackets: &mut usize, out: &mut String) -> bool {
        let bytes = line.as_bytes();
        let mut copied = 0;
        let mut changed = false;
        let mut pos = 0;

        while pos < bytes.len() {
            match bytes[pos] {
                b'\\' => {
                    pos += 2;
                    continue;
                }
                b'`' => {
                    pos = code_span_end(line, pos);
                    continue;
                }
                b'[' => *open_brackets += 1,
                b']' if *open_brackets > 0 => {
                    *open_brackets -= 1;
                    if bytes.get(pos + 1) == Some(&b'(') {
                        let (start, end) = destination_span(line, pos + 2);
                        if let Some(rewritten) = self.rewrite(&line[start..end]) {
                            tracing::trace!(target = &line[start..end], "Rewrote link target");
                            out.push_str(&line[copied..start]);
                            out.push_str(&rewritten);
                            copied = end;
                            changed = true;
                        }
                        pos = end;
                        continue;
                    }
                }
                _ => {}
            }
            pos += 1;
        }

        out.push_str(&line[copied..]);
        changed
    }

    /// Rewritten destination, or `None` if the destination is safe as is.
    fn rewrite(&self, destination: &str) -> Option<String> {
        let (inner, angled) = match destination.strip_prefix('<') {
            Some(rest) => (rest.strip_suffix('>').unwrap_or(rest), true),
            None => (destination, false),
        };
        if inner.is_empty() || is_relative(inner) || self.has_allowed_scheme(inner) {
            return None;
        }

        let cut = inner.rfind([':', ';'])?;
        let tail = &inner[cut + 1..];
        Some(if angled {
            format!("<{tail}>")
        } else {
            tail.to_owned()
        })
    }

    fn has_allowed_scheme(&self, destination: &str) -> bool {
        destination
            .split_once(':')
            .is_some_and(|(scheme, _)| self.schemes.contains(&scheme.to_ascii_lowercase()))
    }
}

impl Preprocessor for LinkGuard {
    fn name(&self) -> &'static str {
        "link_guard"
    }

    fn process(&self, markdown: &str) -> Option<String> {
        self.guard(markdown)
    }
}

fn is_relative(destination: &str) -> bool {
    destination.starts_with(['#', '/', '?', '.'])
}

/// Byte range of the link destination starting at `from` (just after `](`).
fn destination_span(line: &str, from: usize) -> (usize, usize) {
    let bytes = line.as_bytes();
    let mut start = from;
    while start < bytes.len() && matches!(bytes[start], b' ' | b'\t') {
        start += 1;
    }

    if bytes.get(start) == Some(&b'<') {
        let end = bytes[start..]
            .iter()
            .position(|b| *b == b'>')
            .map_or(start + 1, |offset| start + offset + 1);
        return (start, end);
    }

    let mut depth = 0usize;
    let mut pos = start;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'(' => depth += 1,
            b')' if depth == 0 => break,
            b')' => depth -= 1,
            b' ' | b'\t' | b'\r' | b'\n' => break,
            _ => {}
        }
        pos += 1;
    }

    (start, pos.min(bytes.len()))
}
