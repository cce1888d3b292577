//! Post-body normalization.
//!
//! WordPress bodies arrive with shortcode leftovers and bare `<h2>` headings.
//! Normalization strips the dead directives, unwraps caption shortcodes,
//! injects anchor ids into second-level headings and derives the
//! table-of-contents entries the rendering layer links to.
//!
//! The content is known-shape WordPress output, so this is deliberately
//! targeted regex/string surgery rather than a full HTML parse; everything
//! lives behind this module so the implementation can be swapped if the
//! input shape ever changes.
//!
//! Normalization is idempotent: headings that already carry an `id`
//! attribute are left untouched, so a second pass is a no-op.

use regex::Regex;
use std::sync::LazyLock;

static SUBCATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[subcategory[^\]]*\]").unwrap());

static CAPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[caption[^\]]*\](.*?)\[/caption\]").unwrap());

static H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h2([^>]*)>(.*?)</h2>").unwrap());

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// One table-of-contents entry, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Anchor id injected into the matching `<h2>`.
    pub id: String,
    /// Stripped heading text.
    pub text: String,
}

/// Fully normalized post body plus its derived table of contents.
#[derive(Debug, Clone, Default)]
pub struct NormalizedContent {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

impl NormalizedContent {
    /// A TOC is only worth rendering with at least two entries.
    pub fn has_toc(&self) -> bool {
        self.toc.len() >= 2
    }
}

/// Run the full normalization pass over a raw HTML body.
///
/// Order matters: shortcodes are stripped before heading ids are computed so
/// a shortcode inside a heading cannot leak into its anchor.
pub fn normalize(content: &str) -> NormalizedContent {
    let html = strip_shortcodes(content);
    let html = inject_heading_ids(&html);
    let toc = table_of_contents(&html);
    NormalizedContent { html, toc }
}

/// Remove `[subcategory …]` directives and unwrap `[caption …]…[/caption]`.
pub fn strip_shortcodes(content: &str) -> String {
    let stripped = SUBCATEGORY_RE.replace_all(content, "");
    CAPTION_RE.replace_all(&stripped, "$1").into_owned()
}

/// Inject a computed `id` into every `<h2>` that does not declare one.
pub fn inject_heading_ids(content: &str) -> String {
    H2_RE
        .replace_all(content, |caps: &regex::Captures<'_>| {
            let attrs = &caps[1];
            if attrs.contains("id=") {
                return caps[0].to_owned();
            }
            let inner = &caps[2];
            let id = heading_slug(&strip_html(inner));
            format!(r#"<h2 id="{id}"{attrs}>{inner}</h2>"#)
        })
        .into_owned()
}

/// Collect TOC entries from all `<h2>` headings with non-empty text,
/// deduplicated by id in first-seen document order.
pub fn table_of_contents(content: &str) -> Vec<TocEntry> {
    let mut seen = std::collections::HashSet::new();
    let mut entries = Vec::new();
    for caps in H2_RE.captures_iter(content) {
        let text = strip_html(&caps[2]);
        if text.is_empty() {
            continue;
        }
        let id = heading_slug(&text);
        if seen.insert(id.clone()) {
            entries.push(TocEntry { id, text });
        }
    }
    entries
}

/// Drop HTML tags, collapse whitespace runs to single spaces and trim.
pub fn strip_html(html: &str) -> String {
    let text = TAG_RE.replace_all(html, "");
    WS_RE.replace_all(&text, " ").trim().to_owned()
}

/// Slug-style anchor id: lowercase, non-alphanumeric runs collapsed to a
/// single hyphen, leading/trailing hyphens trimmed.
pub fn heading_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_ALNUM_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_owned()
}

/// Truncate to at most `limit` characters, never splitting a code point.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
