//! JSON-LD structured data builders.
//!
//! Produces the schema.org objects the rendering layer embeds as
//! `<script type="application/ld+json">`: Article, BreadcrumbList, WebSite,
//! Organization and FAQPage. Everything is built from the normalized post
//! data; no field is invented here.

use crate::category::CategoryMap;
use crate::config::PipelineConfig;
use crate::dates::iso_date;
use crate::normalize::{TocEntry, strip_html, truncate_chars};
use crate::wxr::Post;
use regex::Regex;
use serde_json::{Value, json};

/// Meta-description cap shared by Article and page metadata.
const DESCRIPTION_CHARS: usize = 160;
/// FAQ answers are capped at this many characters of stripped text.
const ANSWER_CHARS: usize = 300;
/// Answers shorter than this are too thin to count as answers.
const MIN_ANSWER_CHARS: usize = 20;

/// One breadcrumb step, root first.
#[derive(Debug, Clone, PartialEq)]
pub struct BreadcrumbItem {
    pub name: String,
    pub url: String,
}

/// schema.org Article for a post.
pub fn article(post: &Post, categories: &CategoryMap, config: &PipelineConfig) -> Value {
    let site_url = config.site_url();
    let cat_names: Vec<&str> = post
        .categories
        .iter()
        .filter_map(|slug| categories.get(slug))
        .map(|cat| cat.name.as_str())
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "Article",
        "headline": post.title,
        "description": truncate_chars(&strip_html(&post.excerpt), DESCRIPTION_CHARS),
        "datePublished": iso_date(&post.date_gmt),
        "dateModified": iso_date(&post.modified_gmt),
        "author": {
            "@type": "Person",
            "name": if post.author_display.is_empty() { &post.author } else { &post.author_display },
        },
        "publisher": {
            "@type": "Organization",
            "name": config.site.name,
            "url": site_url,
            "logo": {
                "@type": "ImageObject",
                "url": format!("{site_url}/assets/logo.png"),
            },
        },
        "mainEntityOfPage": {
            "@type": "WebPage",
            "@id": format!("{site_url}/{}/", post.slug),
        },
        "articleSection": cat_names.first().copied().unwrap_or("Travel"),
        "keywords": post.tags.join(", "),
    })
}

/// schema.org BreadcrumbList from an ordered trail.
pub fn breadcrumbs(items: &[BreadcrumbItem]) -> Value {
    let elements: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": item.name,
                "item": item.url,
            })
        })
        .collect();

    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": elements,
    })
}

/// Breadcrumb trail for a post: Home, the primary category's hierarchy,
/// then the post itself. Posts without a resolvable category fall back to
/// the travel-destinations section.
pub fn breadcrumb_trail(
    post: &Post,
    categories: &CategoryMap,
    config: &PipelineConfig,
) -> Vec<BreadcrumbItem> {
    let site_url = config.site_url();
    let mut items = vec![BreadcrumbItem {
        name: "Home".into(),
        url: site_url.to_owned(),
    }];

    let primary = post
        .categories
        .iter()
        .find_map(|slug| categories.get(slug).map(|_| slug.as_str()))
        .unwrap_or("travel-destinations");

    for cat in categories.hierarchy(primary) {
        items.push(BreadcrumbItem {
            name: cat.name.clone(),
            url: format!("{site_url}/category/{}/", cat.slug),
        });
    }

    items.push(BreadcrumbItem {
        name: post.title.clone(),
        url: format!("{site_url}/{}/", post.slug),
    });
    items
}

/// schema.org WebSite with its search action.
pub fn website(config: &PipelineConfig) -> Value {
    let site_url = config.site_url();
    json!({
        "@context": "https://schema.org",
        "@type": "WebSite",
        "name": config.site.name,
        "url": site_url,
        "description": config.site.description,
        "publisher": {
            "@type": "Organization",
            "name": config.site.name,
            "url": site_url,
        },
        "potentialAction": {
            "@type": "SearchAction",
            "target": format!("{site_url}/?s={{search_term_string}}"),
            "query-input": "required name=search_term_string",
        },
    })
}

/// schema.org Organization for the homepage.
pub fn organization(config: &PipelineConfig) -> Value {
    let site_url = config.site_url();
    json!({
        "@context": "https://schema.org",
        "@type": "Organization",
        "name": config.site.name,
        "url": site_url,
        "logo": format!("{site_url}/assets/logo.png"),
        "sameAs": [],
    })
}

/// schema.org FAQPage derived from question-style headings.
///
/// A heading counts as a question when it contains `?` or opens with a
/// question word. The answer is the first paragraph following the heading in
/// the normalized content; thin answers are discarded. Returns `None` below
/// two usable Q&A pairs, since a one-question FAQ is noise to crawlers.
pub fn faq(headings: &[TocEntry], content: &str) -> Option<Value> {
    let questions: Vec<&TocEntry> = headings.iter().filter(|h| is_question(&h.text)).collect();
    if questions.len() < 2 {
        return None;
    }

    let mut items = Vec::new();
    for question in questions {
        let Some(answer) = first_answer(content, &question.id) else {
            continue;
        };
        items.push(json!({
            "@type": "Question",
            "name": question.text,
            "acceptedAnswer": {
                "@type": "Answer",
                "text": answer,
            },
        }));
    }

    if items.len() < 2 {
        return None;
    }

    Some(json!({
        "@context": "https://schema.org",
        "@type": "FAQPage",
        "mainEntity": items,
    }))
}

fn is_question(text: &str) -> bool {
    if text.contains('?') {
        return true;
    }
    let lower = text.to_lowercase();
    ["what", "how", "why", "when", "where"]
        .iter()
        .any(|word| lower.starts_with(word))
        || ["is ", "are ", "can ", "do "]
            .iter()
            .any(|word| lower.starts_with(word))
}

/// Stripped text of the first `<p>` after the heading carrying `id`.
fn first_answer(content: &str, id: &str) -> Option<String> {
    let pattern = format!(
        r#"(?is)<h2[^>]*id="{}"[^>]*>.*?</h2>\s*(<p>.*?</p>)"#,
        regex::escape(id)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(content)?;
    let answer = truncate_chars(&strip_html(&caps[1]), ANSWER_CHARS);
    (answer.len() > MIN_ANSWER_CHARS).then_some(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize;
    use crate::wxr::Category;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    fn sample_post() -> Post {
        Post {
            title: "Visiting Lisbon".into(),
            slug: "visiting-lisbon".into(),
            date_gmt: "2023-04-01 08:00:00".into(),
            modified_gmt: "2023-05-01 08:00:00".into(),
            author: "jdoe".into(),
            author_display: "Jane Doe".into(),
            excerpt: "<p>Lisbon in spring.</p>".into(),
            categories: vec!["europe".into()],
            tags: vec!["portugal".into(), "city-break".into()],
            ..Post::default()
        }
    }

    fn cat_map() -> CategoryMap {
        CategoryMap::new(&[Category {
            slug: "europe".into(),
            name: "Europe".into(),
            parent: String::new(),
            description: String::new(),
        }])
    }

    #[test]
    fn test_article_fields() {
        let value = article(&sample_post(), &cat_map(), &config());
        assert_eq!(value["@type"], "Article");
        assert_eq!(value["headline"], "Visiting Lisbon");
        assert_eq!(value["description"], "Lisbon in spring.");
        assert_eq!(value["datePublished"], "2023-04-01T08:00:00Z");
        assert_eq!(value["dateModified"], "2023-05-01T08:00:00Z");
        assert_eq!(value["author"]["name"], "Jane Doe");
        assert_eq!(value["articleSection"], "Europe");
        assert_eq!(value["keywords"], "portugal, city-break");
    }

    #[test]
    fn test_article_section_fallback() {
        let mut post = sample_post();
        post.categories.clear();
        let value = article(&post, &cat_map(), &config());
        assert_eq!(value["articleSection"], "Travel");
    }

    #[test]
    fn test_breadcrumbs_positions() {
        let trail = breadcrumb_trail(&sample_post(), &cat_map(), &config());
        let value = breadcrumbs(&trail);
        let elements = value["itemListElement"].as_array().unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0]["position"], 1);
        assert_eq!(elements[0]["name"], "Home");
        assert_eq!(elements[1]["name"], "Europe");
        assert_eq!(elements[2]["name"], "Visiting Lisbon");
        assert_eq!(
            elements[2]["item"],
            "https://travelasker.com/visiting-lisbon/"
        );
    }

    #[test]
    fn test_website_search_action() {
        let value = website(&config());
        assert_eq!(value["@type"], "WebSite");
        assert_eq!(
            value["potentialAction"]["target"],
            "https://travelasker.com/?s={search_term_string}"
        );
    }

    #[test]
    fn test_faq_built_from_question_headings() {
        let raw = "<h2>What is travel insurance?</h2>\
            <p>Travel insurance covers unexpected costs while you travel.</p>\
            <h2>How much does it cost?</h2>\
            <p>Usually a small percentage of your total trip price per person.</p>";
        let normalized = normalize::normalize(raw);
        let value = faq(&normalized.toc, &normalized.html).unwrap();
        let entities = value["mainEntity"].as_array().unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0]["name"], "What is travel insurance?");
        assert!(
            entities[0]["acceptedAnswer"]["text"]
                .as_str()
                .unwrap()
                .starts_with("Travel insurance covers")
        );
    }

    #[test]
    fn test_faq_none_for_single_question() {
        let raw = "<h2>What is this?</h2><p>A long enough answer to count here.</p>\
            <h2>Conclusion</h2><p>The end of the article.</p>";
        let normalized = normalize::normalize(raw);
        assert!(faq(&normalized.toc, &normalized.html).is_none());
    }

    #[test]
    fn test_faq_discards_thin_answers() {
        let raw = "<h2>What is A?</h2><p>short</p><h2>What is B?</h2><p>also short</p>";
        let normalized = normalize::normalize(raw);
        assert!(faq(&normalized.toc, &normalized.html).is_none());
    }
}
