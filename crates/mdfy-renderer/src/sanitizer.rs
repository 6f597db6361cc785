//! Allow-list HTML sanitization.
//!
//! Rendered HTML passes through [`Sanitizer::clean`] before it leaves the
//! pipeline. The sanitizer keeps only allow-listed tags, attributes and URL
//! schemes. Disallowed tags are unwrapped (their text survives) except
//! `script` and `style`, whose content is dropped entirely.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::{LazyLock, Mutex, PoisonError};

const DEFAULT_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "cite", "code", "command", "dd", "del", "div", "dl",
    "dt", "em", "fieldset", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "iframe", "img",
    "input", "ins", "kbd", "label", "legend", "li", "ol", "optgroup", "option", "p", "pre",
    "small", "span", "strong", "sub", "sup", "table", "tbody", "td", "tfoot", "th", "thead",
    "tr", "u", "ul",
];

const DEFAULT_GLOBAL_ATTRIBUTES: &[&str] = &[
    "accesskey",
    "class",
    "contenteditable",
    "data-",
    "dir",
    "draggable",
    "hidden",
    "id",
    "lang",
    "spellcheck",
    "style",
    "tabindex",
    "title",
    "translate",
];

const DEFAULT_TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href"]),
    ("del", &["cite", "datetime"]),
    (
        "iframe",
        &["src", "width", "height", "frameborder", "allowfullscreen"],
    ),
    ("img", &["alt", "height", "src", "width"]),
    ("input", &["type", "name", "value"]),
    ("ins", &["cite", "datetime"]),
    ("label", &["for"]),
    ("optgroup", &["label"]),
    ("option", &["value"]),
];

const DEFAULT_SCHEMES: &[&str] = &[
    "file", "ftp", "ftps", "http", "https", "irc", "mailto", "sftp", "ssh", "tel", "telnet",
    "tftp", "vnc", "xmpp",
];

/// Tags whose content is removed together with the tag.
const CLEAN_CONTENT_TAGS: &[&str] = &["script", "style"];

/// What the sanitizer lets through.
///
/// A global attribute ending in `-` (such as `data-`) allows every attribute
/// with that prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowList {
    pub tags: BTreeSet<String>,
    pub attributes: BTreeMap<String, BTreeSet<String>>,
    pub global_attributes: BTreeSet<String>,
    pub schemes: BTreeSet<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self {
            tags: owned_set(DEFAULT_TAGS),
            attributes: DEFAULT_TAG_ATTRIBUTES
                .iter()
                .map(|(tag, attrs)| ((*tag).to_owned(), owned_set(attrs)))
                .collect(),
            global_attributes: owned_set(DEFAULT_GLOBAL_ATTRIBUTES),
            schemes: owned_set(DEFAULT_SCHEMES),
        }
    }
}

impl AllowList {
    /// Replace the allowed tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the per-tag attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: BTreeMap<String, BTreeSet<String>>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Replace the attributes allowed on every tag.
    #[must_use]
    pub fn with_global_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the allowed URL schemes.
    #[must_use]
    pub fn with_schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemes = schemes.into_iter().map(Into::into).collect();
        self
    }
}

fn owned_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

/// Interns an allow-list name for the life of the process.
///
/// The ammonia builder borrows every name it matches against. Interning lets
/// a sanitizer build it once, and rebuilding with the same allow-list reuses
/// the names already stored.
fn intern(name: &str) -> &'static str {
    static NAMES: LazyLock<Mutex<HashSet<&'static str>>> = LazyLock::new(Mutex::default);

    let mut names = NAMES.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(&name) = names.get(name) {
        return name;
    }
    let name: &'static str = Box::leak(name.to_owned().into_boxed_str());
    names.insert(name);
    name
}

fn interned(items: &BTreeSet<String>) -> HashSet<&'static str> {
    items.iter().map(|item| intern(item)).collect()
}

/// HTML sanitizer backed by `ammonia`.
///
/// The ammonia builder is configured once in [`Sanitizer::new`] and reused
/// by every [`clean`](Sanitizer::clean) call.
pub struct Sanitizer {
    allow: AllowList,
    builder: ammonia::Builder<'static>,
}

impl Sanitizer {
    pub fn new(allow: AllowList) -> Self {
        let tags = interned(&allow.tags);
        let tag_attributes: HashMap<&str, HashSet<&str>> = allow
            .attributes
            .iter()
            .map(|(tag, attrs)| (intern(tag), interned(attrs)))
            .collect();
        let (prefixes, generic): (HashSet<&str>, HashSet<&str>) =
            interned(&allow.global_attributes)
                .into_iter()
                .partition(|attr| attr.ends_with('-'));
        // ammonia refuses a tag that is both allowed and content-cleaned
        let clean_content: HashSet<&str> = CLEAN_CONTENT_TAGS
            .iter()
            .copied()
            .filter(|tag| !tags.contains(tag))
            .collect();

        let mut builder = ammonia::Builder::empty();
        builder
            .tags(tags)
            .tag_attributes(tag_attributes)
            .generic_attributes(generic)
            .url_schemes(interned(&allow.schemes))
            .url_relative(ammonia::UrlRelative::PassThrough)
            .clean_content_tags(clean_content)
            .strip_comments(true)
            .link_rel(None);
        if !prefixes.is_empty() {
            builder.generic_attribute_prefixes(prefixes);
        }

        Self { allow, builder }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow
    }

    /// Sanitize an HTML fragment.
    ///
    /// Idempotent: cleaning already clean output returns it unchanged.
    pub fn clean(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

impl fmt::Debug for Sanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sanitizer")
            .field("allow", &self.allow)
            .finish_non_exhaustive()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(AllowList::default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn clean(html: &str) -> String {
        Sanitizer::default().clean(html)
    }

    #[test]
    fn test_keeps_allowed_markup() {
        let html = r#"<p><a href="https://python.web.id">python</a></p>"#;

        assert_eq!(clean(html), html);
    }

    #[test]
    fn test_adds_no_rel() {
        let cleaned = clean(r#"<a href="https://example.com">x</a>"#);

        assert!(!cleaned.contains("rel="));
    }

    #[test]
    fn test_drops_script_with_content() {
        assert_eq!(clean("<p>a<script>alert(1)</script>b</p>"), "<p>ab</p>");
    }

    #[test]
    fn test_drops_style_with_content() {
        assert_eq!(clean("<style>p { color: red }</style><p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn test_unwraps_unknown_tags() {
        assert_eq!(clean("<p><blink>hi</blink></p>"), "<p>hi</p>");
    }

    #[test]
    fn test_strips_event_handlers() {
        assert_eq!(
            clean(r#"<img src="a.png" onerror="alert(1)">"#),
            r#"<img src="a.png">"#
        );
    }

    #[test]
    fn test_drops_javascript_href() {
        let cleaned = clean(r#"<a href="javascript:alert(1)">x</a>"#);

        assert!(!cleaned.contains("javascript"));
        assert!(cleaned.contains(">x</a>"));
    }

    #[test]
    fn test_drops_entity_encoded_scheme() {
        let cleaned = clean(r#"<a href="&#106;avascript&#58;alert(1)">x</a>"#);

        assert!(!cleaned.to_lowercase().contains("javascript"));
    }

    #[test]
    fn test_drops_control_obfuscated_scheme() {
        let cleaned = clean("<a href=\"java\tscript:alert(1)\">x</a>");

        assert!(!cleaned.contains("href"));
    }

    #[test]
    fn test_drops_data_uri_image() {
        let cleaned = clean(r#"<img src="data:image/png;base64,AAAA">"#);

        assert!(!cleaned.contains("data:"));
    }

    #[test]
    fn test_keeps_relative_urls() {
        let html = "<a href=\"#fn-1\">1</a><a href=\"/users/me/\">me</a>";

        assert_eq!(clean(html), html);
    }

    #[test]
    fn test_keeps_data_prefixed_attributes() {
        let html = r#"<span data-user="alice">x</span>"#;

        assert_eq!(clean(html), html);
    }

    #[test]
    fn test_strips_unlisted_attribute() {
        assert_eq!(
            clean(r#"<p onclick="x()" class="lead">x</p>"#),
            r#"<p class="lead">x</p>"#
        );
    }

    #[test]
    fn test_strips_comments() {
        assert_eq!(clean("<p>a<!-- hidden -->b</p>"), "<p>ab</p>");
    }

    #[test]
    fn test_custom_allow_list() {
        let sanitizer = Sanitizer::new(
            AllowList::default()
                .with_tags(["p"])
                .with_global_attributes(Vec::<String>::new()),
        );

        assert_eq!(
            sanitizer.clean(r#"<p class="x"><em>hi</em></p>"#),
            "<p>hi</p>"
        );
    }

    #[test]
    fn test_allowing_style_tag_does_not_panic() {
        let sanitizer = Sanitizer::new(AllowList::default().with_tags(["p", "style"]));

        assert!(sanitizer.clean("<style>p {}</style>").contains("<style>"));
    }

    #[test]
    fn test_custom_schemes() {
        let sanitizer = Sanitizer::new(AllowList::default().with_schemes(["https"]));

        let cleaned = sanitizer.clean(r#"<a href="ftp://example.com/f">f</a>"#);

        assert_eq!(cleaned, "<a>f</a>");
    }

    #[test]
    fn test_intern_reuses_names() {
        let first = intern("x-widget");
        let second = intern(&String::from("x-widget"));

        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_one_sanitizer_cleans_many_documents() {
        let sanitizer = Sanitizer::default();

        assert_eq!(sanitizer.clean("<p>a<script>x</script></p>"), "<p>a</p>");
        assert_eq!(sanitizer.clean("<em onclick=\"x()\">b</em>"), "<em>b</em>");
        assert_eq!(sanitizer.clean("<p>a<script>x</script></p>"), "<p>a</p>");
    }

    #[test]
    fn test_idempotent() {
        let html = r#"<p>x &amp; y<iframe src="https://www.youtube.com/embed/abc" allowfullscreen=""></iframe><b onclick="z">b</b></p>"#;

        let once = clean(html);

        assert_eq!(clean(&once), once);
    }
}
