//! Derived indexes over the post collection.
//!
//! List/index pages never need full bodies, so everything here is built from
//! lightweight summaries: recent posts for the homepage, per-category and
//! per-author post lists, and the sitemap manifest. All lists are sorted
//! newest-first before persistence, the sitemap manifest included, so every
//! consumer sees one consistent ordering.

use crate::dates::newest_first;
use crate::normalize::{heading_slug, strip_html, truncate_chars};
use crate::wxr::Post;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw excerpt cap for category summaries.
const CATEGORY_EXCERPT_CHARS: usize = 200;
/// Stripped excerpt cap for author summaries.
const AUTHOR_EXCERPT_CHARS: usize = 160;

/// Lightweight projection used by category post lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub date: String,
    pub author: String,
}

/// Homepage summary; also carries category slugs for the card badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub date: String,
    pub author: String,
    pub categories: Vec<String>,
}

/// Per-author post summary (stripped excerpt, includes categories).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorPostSummary {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub categories: Vec<String>,
    pub excerpt: String,
}

/// One author's page data: display name plus their posts, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorEntry {
    pub name: String,
    pub slug: String,
    pub posts: Vec<AuthorPostSummary>,
}

/// `authors/_index.json` row for author-listing pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorIndexEntry {
    pub name: String,
    pub count: usize,
}

/// `sitemap-posts.json` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub slug: String,
    pub lastmod: String,
}

/// Author page slug: lowercased display name with non-alphanumeric runs
/// hyphenated, so "Jane Doe" and "jane doe" merge into one author.
pub fn author_slug(name: &str) -> String {
    heading_slug(name)
}

/// Newest posts, truncated to `limit`.
pub fn recent_posts(posts: &[Post], limit: usize) -> Vec<RecentSummary> {
    let mut sorted: Vec<&Post> = posts.iter().collect();
    sorted.sort_by(|a, b| newest_first(&a.date_gmt, &b.date_gmt));
    sorted
        .into_iter()
        .take(limit)
        .map(|post| RecentSummary {
            slug: post.slug.clone(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            date: post.date_gmt.clone(),
            author: post.author_display.clone(),
            categories: post.categories.clone(),
        })
        .collect()
}

/// Per-category post lists, each sorted newest-first.
///
/// A post with no categories contributes to no list; it stays reachable only
/// through slug lookup and the recent list.
pub fn category_index(posts: &[Post]) -> BTreeMap<String, Vec<PostSummary>> {
    let mut index: BTreeMap<String, Vec<PostSummary>> = BTreeMap::new();
    for post in posts {
        for cat_slug in &post.categories {
            index.entry(cat_slug.clone()).or_default().push(PostSummary {
                slug: post.slug.clone(),
                title: post.title.clone(),
                excerpt: truncate_chars(&post.excerpt, CATEGORY_EXCERPT_CHARS),
                date: post.date_gmt.clone(),
                author: post.author_display.clone(),
            });
        }
    }
    for summaries in index.values_mut() {
        summaries.sort_by(|a, b| newest_first(&a.date, &b.date));
    }
    index
}

/// Group posts by author slug. Posts without any author identifier are
/// skipped; each author's list is sorted newest-first.
pub fn author_index(posts: &[Post]) -> BTreeMap<String, AuthorEntry> {
    let mut index: BTreeMap<String, AuthorEntry> = BTreeMap::new();
    for post in posts {
        let name = if post.author_display.is_empty() {
            &post.author
        } else {
            &post.author_display
        };
        if name.is_empty() {
            continue;
        }

        let slug = author_slug(name);
        let entry = index.entry(slug.clone()).or_insert_with(|| AuthorEntry {
            name: name.clone(),
            slug,
            posts: Vec::new(),
        });
        entry.posts.push(AuthorPostSummary {
            slug: post.slug.clone(),
            title: post.title.clone(),
            date: if post.date_gmt.is_empty() {
                post.date.clone()
            } else {
                post.date_gmt.clone()
            },
            categories: post.categories.clone(),
            excerpt: truncate_chars(&strip_html(&post.excerpt), AUTHOR_EXCERPT_CHARS),
        });
    }
    for entry in index.values_mut() {
        entry.posts.sort_by(|a, b| newest_first(&a.date, &b.date));
    }
    index
}

/// Flat `slug → {name, count}` listing derived from the author index.
pub fn author_name_index(
    authors: &BTreeMap<String, AuthorEntry>,
) -> BTreeMap<String, AuthorIndexEntry> {
    authors
        .iter()
        .map(|(slug, entry)| {
            (
                slug.clone(),
                AuthorIndexEntry {
                    name: entry.name.clone(),
                    count: entry.posts.len(),
                },
            )
        })
        .collect()
}

/// One manifest entry per post, sorted descending by effective lastmod
/// (`modifiedGmt` falling back to `dateGmt`).
pub fn sitemap_manifest(posts: &[Post]) -> Vec<SitemapEntry> {
    let mut entries: Vec<SitemapEntry> = posts
        .iter()
        .map(|post| SitemapEntry {
            slug: post.slug.clone(),
            lastmod: post.lastmod().to_owned(),
        })
        .collect();
    entries.sort_by(|a, b| newest_first(&a.lastmod, &b.lastmod));
    entries
}
