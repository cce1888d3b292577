//! WXR record classification.
//!
//! Interprets the parser's event stream into typed entities. All parse state
//! lives in an explicit [`Classifier`] value; the pipeline drivers own it for
//! the duration of one run, there are no process-wide accumulators.
//!
//! # Classification rules
//!
//! - `wp:category` close: keep only categories with a non-empty slug.
//! - `wp:author` close: keep only authors with a non-empty login, keyed by it.
//! - `item` close: keep only `status == publish`; resolve the display name
//!   through the author table (falling back to the raw login); route by
//!   `wp:post_type` into posts or pages, drop anything else silently.
//! - `<category>` children of an item split on the `domain` attribute:
//!   `category` entries contribute their `nicename` **attribute** to the
//!   category-slug list, `post_tag` entries contribute their **text** to the
//!   tag list. The attribute/text asymmetry is how WordPress exports work.

use super::parser::{WxrEvent, WxrParser};
use super::types::{Author, Category, Post};
use anyhow::Result;
use std::collections::HashMap;
use std::io::BufRead;

/// Everything one parse run produces.
#[derive(Debug, Default)]
pub struct ParsedExport {
    pub categories: Vec<Category>,
    pub posts: Vec<Post>,
    pub pages: Vec<Post>,
    /// Author lookup table keyed by login.
    pub authors: HashMap<String, Author>,
    pub stats: ClassifyStats,
}

/// Operator-visibility counters for records that were dropped by design.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClassifyStats {
    /// `wp:category` blocks without a slug.
    pub dropped_categories: usize,
    /// `wp:author` blocks without a login.
    pub dropped_authors: usize,
    /// Items that were unpublished or of an unhandled post type.
    pub skipped_items: usize,
}

/// Per-item accumulator. The postmeta map and the pending category-element
/// attributes are parse scaffolding, discarded at finalize.
#[derive(Debug, Default)]
struct ItemAcc {
    post: Post,
    metas: HashMap<String, String>,
    cat_domain: String,
    cat_nicename: String,
}

#[derive(Debug, Default)]
struct MetaAcc {
    key: String,
    value: String,
}

/// Event-driven WXR classifier.
#[derive(Default)]
pub struct Classifier {
    export: ParsedExport,
    text: String,
    item: Option<ItemAcc>,
    category: Option<Category>,
    author: Option<Author>,
    meta: Option<MetaAcc>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of published posts collected so far.
    pub fn post_count(&self) -> usize {
        self.export.posts.len()
    }

    pub fn into_export(self) -> ParsedExport {
        self.export
    }

    /// Feed one parser event into the state machine.
    pub fn handle(&mut self, event: WxrEvent) {
        match event {
            WxrEvent::Open { tag, attrs } => {
                self.text.clear();
                self.open(&tag, &attrs);
            }
            WxrEvent::Text(text) => self.text.push_str(&text),
            WxrEvent::Close(tag) => {
                self.close(&tag);
                self.text.clear();
            }
            WxrEvent::Eof => {}
        }
    }

    fn open(&mut self, tag: &str, attrs: &[(String, String)]) {
        match tag {
            "item" => self.item = Some(ItemAcc::default()),
            "wp:category" if self.item.is_none() => {
                self.category = Some(Category::default());
            }
            "wp:author" => self.author = Some(Author::default()),
            "wp:postmeta" if self.item.is_some() => {
                self.meta = Some(MetaAcc::default());
            }
            "category" => {
                if let Some(item) = self.item.as_mut() {
                    item.cat_domain = attr_value(attrs, "domain");
                    item.cat_nicename = attr_value(attrs, "nicename");
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: &str) {
        if self.author.is_some() {
            self.close_in_author(tag);
        }
        if self.category.is_some() && self.item.is_none() {
            self.close_in_category(tag);
        }
        if self.item.is_some() {
            self.close_in_item(tag);
        }
    }

    fn close_in_author(&mut self, tag: &str) {
        let author = self.author.as_mut().unwrap();
        match tag {
            "wp:author_id" => author.id = self.text.trim().to_owned(),
            "wp:author_login" => author.login = self.text.trim().to_owned(),
            "wp:author_email" => author.email = self.text.trim().to_owned(),
            "wp:author_display_name" => {
                author.display_name = self.text.trim().to_owned();
            }
            "wp:author" => {
                let author = self.author.take().unwrap();
                if author.login.is_empty() {
                    self.export.stats.dropped_authors += 1;
                } else {
                    self.export.authors.insert(author.login.clone(), author);
                }
            }
            _ => {}
        }
    }

    fn close_in_category(&mut self, tag: &str) {
        let category = self.category.as_mut().unwrap();
        match tag {
            "wp:category_nicename" => category.slug = self.text.trim().to_owned(),
            "wp:cat_name" => category.name = self.text.trim().to_owned(),
            "wp:category_parent" => category.parent = self.text.trim().to_owned(),
            "wp:category_description" => {
                category.description = self.text.trim().to_owned();
            }
            "wp:category" => {
                let category = self.category.take().unwrap();
                if category.slug.is_empty() {
                    self.export.stats.dropped_categories += 1;
                } else {
                    self.export.categories.push(category);
                }
            }
            _ => {}
        }
    }

    fn close_in_item(&mut self, tag: &str) {
        let item = self.item.as_mut().unwrap();
        let trimmed = self.text.trim();
        match tag {
            "title" => item.post.title = trimmed.to_owned(),
            "link" => item.post.link = trimmed.to_owned(),
            "dc:creator" => item.post.author = trimmed.to_owned(),
            // content is kept verbatim: leading/trailing whitespace inside
            // the HTML body is significant
            "content:encoded" => item.post.content = self.text.clone(),
            "excerpt:encoded" => item.post.excerpt = trimmed.to_owned(),
            "wp:post_id" => item.post.post_id = trimmed.to_owned(),
            "wp:post_date" => item.post.date = trimmed.to_owned(),
            "wp:post_date_gmt" => item.post.date_gmt = trimmed.to_owned(),
            "wp:post_modified" => item.post.modified = trimmed.to_owned(),
            "wp:post_modified_gmt" => {
                item.post.modified_gmt = trimmed.to_owned();
            }
            "wp:post_name" => item.post.slug = trimmed.to_owned(),
            "wp:status" => item.post.status = trimmed.to_owned(),
            "wp:post_type" => item.post.post_type = trimmed.to_owned(),
            "category" => match item.cat_domain.as_str() {
                "category" => {
                    if !item.cat_nicename.is_empty() {
                        item.post.categories.push(item.cat_nicename.clone());
                    }
                }
                "post_tag" => item.post.tags.push(trimmed.to_owned()),
                _ => {}
            },
            _ if self.meta.is_some() => {
                let meta = self.meta.as_mut().unwrap();
                match tag {
                    "wp:meta_key" => meta.key = trimmed.to_owned(),
                    "wp:meta_value" => meta.value = self.text.clone(),
                    "wp:postmeta" => {
                        let meta = self.meta.take().unwrap();
                        if !meta.key.is_empty() {
                            item.metas.insert(meta.key, meta.value);
                        }
                    }
                    _ => {}
                }
            }
            "item" => self.finalize_item(),
            _ => {}
        }
    }

    fn finalize_item(&mut self) {
        let item = self.item.take().unwrap();
        let mut post = item.post;

        if post.status != "publish" {
            self.export.stats.skipped_items += 1;
            return;
        }

        post.author_display = self
            .export
            .authors
            .get(&post.author)
            .map(|a| a.display_name.clone())
            .unwrap_or_else(|| post.author.clone());

        match post.post_type.as_str() {
            "post" => self.export.posts.push(post),
            "page" => self.export.pages.push(post),
            _ => self.export.stats.skipped_items += 1,
        }
    }
}

fn attr_value(attrs: &[(String, String)], name: &str) -> String {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
        .unwrap_or_default()
}

/// Drive a parser to completion, reporting post counts as they grow.
pub fn classify_stream<R: BufRead>(
    parser: &mut WxrParser<R>,
    mut on_post: impl FnMut(usize),
) -> Result<ParsedExport> {
    let mut classifier = Classifier::new();
    loop {
        let event = parser.next_event()?;
        if event == WxrEvent::Eof {
            break;
        }
        let before = classifier.post_count();
        classifier.handle(event);
        let after = classifier.post_count();
        if after > before {
            on_post(after);
        }
    }
    Ok(classifier.into_export())
}
