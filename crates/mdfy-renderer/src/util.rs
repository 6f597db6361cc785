//! Shared helpers for HTML output.

use pulldown_cmark::HeadingLevel;

/// Escape text for use in HTML content or a double-quoted attribute.
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Convert heading level enum to number (1-6).
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_html_leaves_plain_text() {
        assert_eq!(escape_html("it's fine"), "it's fine");
    }

    #[test]
    fn test_heading_level_to_num() {
        assert_eq!(heading_level_to_num(HeadingLevel::H1), 1);
        assert_eq!(heading_level_to_num(HeadingLevel::H6), 6);
    }
}
