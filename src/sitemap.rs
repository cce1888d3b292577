//! Sitemap XML generation.
//!
//! Reads the persisted sitemap manifest and category list, then writes
//! paginated post sitemaps, a category sitemap, the sitemap index referencing
//! all of them, and robots.txt.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/some-post/</loc>
//!     <lastmod>2025-01-01T00:00:00Z</lastmod>
//!   </url>
//! </urlset>
//! ```
//!
//! Search engines cap a single sitemap at 50k URLs; the configured page size
//! (default 1000) keeps each file small enough to regenerate and diff
//! cheaply.

use crate::config::PipelineConfig;
use crate::dates::iso_date;
use crate::index::SitemapEntry;
use crate::log;
use crate::store::read_json_gz;
use crate::wxr::Category;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Build all sitemap files from the extracted data directory.
pub fn build_sitemaps(config: &PipelineConfig) -> Result<()> {
    let data_dir = &config.extract.data_dir;
    let out_dir = &config.sitemap.output_dir;

    // missing data files mean an empty site, not a failure
    let manifest: Vec<SitemapEntry> =
        read_json_gz(&data_dir.join("sitemap-posts.json"))?.unwrap_or_default();
    let categories: Vec<Category> =
        read_json_gz(&data_dir.join("categories.json"))?.unwrap_or_default();

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let site_url = config.site_url();
    let pages = paginate(&manifest, config.sitemap.urls_per_sitemap);

    for (i, page) in pages.iter().enumerate() {
        let name = format!("post-sitemap{}.xml", i + 1);
        write_xml(&out_dir.join(&name), &post_sitemap_xml(page, site_url))?;
    }

    write_xml(
        &out_dir.join("category-sitemap.xml"),
        &category_sitemap_xml(&categories, site_url),
    )?;
    write_xml(
        &out_dir.join("sitemap.xml"),
        &sitemap_index_xml(pages.len(), site_url),
    )?;

    let robots = format!("User-agent: *\nAllow: /\nSitemap: {site_url}/sitemap.xml\n");
    fs::write(out_dir.join("robots.txt"), robots)
        .with_context(|| format!("failed to write robots.txt in {}", out_dir.display()))?;

    log!("sitemap"; "{} post sitemaps + 1 category sitemap + index", pages.len());
    Ok(())
}

fn write_xml(path: &Path, xml: &str) -> Result<()> {
    fs::write(path, xml).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn paginate(entries: &[SitemapEntry], per_page: usize) -> Vec<&[SitemapEntry]> {
    entries.chunks(per_page.max(1)).collect()
}

/// One `<urlset>` page of post URLs with lastmod timestamps.
fn post_sitemap_xml(entries: &[SitemapEntry], site_url: &str) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!(
            "    <loc>{}/{}/</loc>\n",
            escape_xml(site_url),
            escape_xml(&entry.slug)
        ));
        if !entry.lastmod.is_empty() {
            xml.push_str(&format!(
                "    <lastmod>{}</lastmod>\n",
                escape_xml(&iso_date(&entry.lastmod))
            ));
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// `<urlset>` of category archive URLs, no lastmod.
fn category_sitemap_xml(categories: &[Category], site_url: &str) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for cat in categories {
        xml.push_str("  <url>\n");
        xml.push_str(&format!(
            "    <loc>{}/category/{}/</loc>\n",
            escape_xml(site_url),
            escape_xml(&cat.slug)
        ));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// `<sitemapindex>` referencing every post sitemap plus the category sitemap.
fn sitemap_index_xml(post_sitemaps: usize, site_url: &str) -> String {
    let mut xml = String::with_capacity(1024);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<sitemapindex xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for i in 1..=post_sitemaps {
        xml.push_str("  <sitemap>\n");
        xml.push_str(&format!(
            "    <loc>{}/post-sitemap{i}.xml</loc>\n",
            escape_xml(site_url)
        ));
        xml.push_str("  </sitemap>\n");
    }
    xml.push_str("  <sitemap>\n");
    xml.push_str(&format!(
        "    <loc>{}/category-sitemap.xml</loc>\n",
        escape_xml(site_url)
    ));
    xml.push_str("  </sitemap>\n");

    xml.push_str("</sitemapindex>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
