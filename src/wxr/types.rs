//! Entities produced by classifying a WXR export.
//!
//! Field names serialize as camelCase because the persisted JSON layout is
//! consumed by a JavaScript rendering layer (`authorDisplay`, `dateGmt`, …).

use serde::{Deserialize, Serialize};

/// A `wp:category` taxonomy entry.
///
/// `parent` is a slug reference forming a tree; an empty string marks a root
/// category. The export format does not guarantee the graph is acyclic, so
/// hierarchy walks must guard against cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub slug: String,
    pub name: String,
    pub parent: String,
    /// Raw HTML, may still contain shortcode markers; stripped at render time.
    pub description: String,
}

/// A `wp:author` entry, keyed by `login` in the author lookup table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Author {
    pub id: String,
    pub login: String,
    pub email: String,
    pub display_name: String,
}

/// A published `<item>`: post or page, distinguished by `post_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Post {
    pub title: String,
    /// Site-unique key and primary external identifier.
    pub slug: String,
    pub date: String,
    pub date_gmt: String,
    pub modified: String,
    pub modified_gmt: String,
    /// Raw creator login from `dc:creator`.
    pub author: String,
    /// Resolved display name; falls back to the raw login for unknown authors.
    pub author_display: String,
    /// Full HTML body. Never trimmed: whitespace inside HTML is meaningful.
    pub content: String,
    pub excerpt: String,
    /// Ordered category slugs; the first entry is the primary category.
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub status: String,
    pub post_type: String,
    pub post_id: String,
    pub link: String,
}

impl Post {
    /// Effective last-modified timestamp for sitemap purposes.
    pub fn lastmod(&self) -> &str {
        if self.modified_gmt.is_empty() {
            &self.date_gmt
        } else {
            &self.modified_gmt
        }
    }
}
