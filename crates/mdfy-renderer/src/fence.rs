//! Code region detection for line-oriented preprocessors.
//!
//! Preprocessors run on raw markdown, so they must step around code: fenced
//! blocks are tracked across lines by [`FenceTracker`], and inline code spans
//! within a line are skipped with [`code_span_end`].

/// Tracks whether line-by-line processing is inside a fenced code block.
///
/// Fences open with three or more backticks or tildes. A fence closes on a
/// line holding only the same character, repeated at least as many times.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.open.is_some()
    }

    /// Feed the next line. Returns `true` when the line opens or closes a fence.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let Some((ch, len)) = fence_marker(trimmed) else {
            return false;
        };

        match self.open {
            Some((open_ch, open_len)) => {
                let closes =
                    ch == open_ch && len >= open_len && trimmed[len..].trim().is_empty();
                if closes {
                    self.open = None;
                }
                closes
            }
            None => {
                self.open = Some((ch, len));
                true
            }
        }
    }
}

/// Leading fence character and run length, if the line starts a fence marker.
fn fence_marker(trimmed: &str) -> Option<(char, usize)> {
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    (len >= 3).then_some((ch, len))
}

/// Given `line[start..]` beginning with a backtick run, return the byte index
/// just past the matching closing run.
///
/// An unmatched run is literal text, so the index just past the opening run
/// is returned instead.
pub(crate) fn code_span_end(line: &str, start: usize) -> usize {
    let bytes = line.as_bytes();
    let opening = bytes[start..].iter().take_while(|b| **b == b'`').count();
    let mut pos = start + opening;

    while pos < bytes.len() {
        if bytes[pos] == b'`' {
            let run = bytes[pos..].iter().take_while(|b| **b == b'`').count();
            if run == opening {
                return pos + run;
            }
            pos += run;
        } else {
            pos += 1;
        }
    }

    start + opening
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtick_fence_round_trip() {
        let mut tracker = FenceTracker::new();

        assert!(tracker.update("```rust"));
        assert!(tracker.in_fence());
        assert!(!tracker.update("[x](javascript:alert(1))"));
        assert!(tracker.in_fence());
        assert!(tracker.update("```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_tilde_fence_not_closed_by_backticks() {
        let mut tracker = FenceTracker::new();

        tracker.update("~~~");
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
        assert!(tracker.update("~~~~"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_shorter_run_does_not_close() {
        let mut tracker = FenceTracker::new();

        tracker.update("````");
        assert!(!tracker.update("```"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_closing_fence_with_info_does_not_close() {
        let mut tracker = FenceTracker::new();

        tracker.update("```");
        assert!(!tracker.update("```python"));
        assert!(tracker.in_fence());
    }

    #[test]
    fn test_strikethrough_is_not_a_fence() {
        let mut tracker = FenceTracker::new();

        assert!(!tracker.update("~~gone~~ text"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn test_code_span_end_matched() {
        let line = "a `b` c";

        assert_eq!(code_span_end(line, 2), 5);
    }

    #[test]
    fn test_code_span_end_double_backticks() {
        let line = "``a ` b`` tail";

        assert_eq!(&line[..code_span_end(line, 0)], "``a ` b``");
    }

    #[test]
    fn test_code_span_end_unmatched() {
        let line = "``no close";

        assert_eq!(code_span_end(line, 0), 2);
    }
}
