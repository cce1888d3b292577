//! Full ingestion pipeline: WXR export in, data directory out.
//!
//! One sequential pass over the XML builds every in-memory collection, then
//! all §output files are written into `<data_dir>.staging` and the staging
//! directory is swapped into place in one rename. A failed run therefore
//! never leaves a half-written dataset where the previous good one was.
//!
//! Per-category and per-author files share no state, so they are written in
//! parallel; everything else is sequential.

use crate::config::PipelineConfig;
use crate::dates::newest_first;
use crate::index::{
    author_index, author_name_index, category_index, recent_posts, sitemap_manifest,
};
use crate::log;
use crate::logger::LineCounter;
use crate::normalize::normalize;
use crate::store::{write_chunks, write_json_gz};
use crate::wxr::{ParsedExport, WxrParser, classify_stream};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Counts reported after a successful run.
#[derive(Debug)]
pub struct ExtractReport {
    pub posts: usize,
    pub pages: usize,
    pub categories: usize,
    pub authors: usize,
    pub chunks: usize,
}

/// Run the whole pipeline: parse, classify, normalize, persist, publish.
pub fn run_extract(config: &PipelineConfig) -> Result<ExtractReport> {
    let source = &config.extract.source;
    let data_dir = &config.extract.data_dir;

    log!("extract"; "parsing {}", source.display());
    let mut export = parse_export(source)?;

    log!(
        "extract";
        "{} posts, {} pages, {} categories, {} authors",
        export.posts.len(),
        export.pages.len(),
        export.categories.len(),
        export.authors.len()
    );
    let stats = export.stats;
    if stats.dropped_categories + stats.dropped_authors > 0 {
        log!(
            "extract";
            "dropped {} slugless categories, {} loginless authors",
            stats.dropped_categories,
            stats.dropped_authors
        );
    }
    if stats.skipped_items > 0 {
        log!("extract"; "skipped {} unpublished or unhandled items", stats.skipped_items);
    }

    prepare_export(&mut export);

    let staging = staging_dir(data_dir);
    let report = write_dataset(&staging, &export, config)
        .with_context(|| format!("failed to write dataset to {}", staging.display()))?;
    publish(&staging, data_dir)?;

    log!(
        "extract";
        "published {} posts ({} chunks), {} pages, {} categories, {} authors to {}",
        report.posts,
        report.chunks,
        report.pages,
        report.categories,
        report.authors,
        data_dir.display()
    );
    Ok(report)
}

/// Stream-parse the export with in-place progress every 500 posts.
fn parse_export(source: &Path) -> Result<ParsedExport> {
    let file = File::open(source)
        .with_context(|| format!("failed to open WXR export {}", source.display()))?;
    let mut parser = WxrParser::new(BufReader::with_capacity(64 * 1024, file));

    let counter = LineCounter::new("extract", "posts");
    let export = classify_stream(&mut parser, |count| {
        if count % 500 == 0 {
            counter.tick(count);
        }
    })?;
    counter.finish();

    if parser.recovered_errors() > 0 {
        log!("extract"; "recovered from {} malformed XML fragments", parser.recovered_errors());
    }
    Ok(export)
}

/// Normalize bodies, drop unaddressable records and fix the post order.
fn prepare_export(export: &mut ParsedExport) {
    for post in export.posts.iter_mut().chain(export.pages.iter_mut()) {
        post.content = normalize(&post.content).html;
    }

    // records without a slug cannot be addressed by anything downstream
    let before = export.posts.len() + export.pages.len();
    export.posts.retain(|post| !post.slug.is_empty());
    export.pages.retain(|page| !page.slug.is_empty());
    let dropped = before - export.posts.len() - export.pages.len();
    if dropped > 0 {
        log!("extract"; "dropped {dropped} published items without a slug");
    }

    // newest first, so chunk 0 holds the most-requested posts
    export
        .posts
        .sort_by(|a, b| newest_first(&a.date_gmt, &b.date_gmt));
}

/// Write every output file into the staging directory.
fn write_dataset(
    staging: &Path,
    export: &ParsedExport,
    config: &PipelineConfig,
) -> Result<ExtractReport> {
    if staging.exists() {
        fs::remove_dir_all(staging)
            .with_context(|| format!("failed to clear stale {}", staging.display()))?;
    }
    for sub in ["posts", "pages", "categories", "authors"] {
        fs::create_dir_all(staging.join(sub))
            .with_context(|| format!("failed to create {}", staging.join(sub).display()))?;
    }

    write_json_gz(&staging.join("categories.json"), &export.categories)?;
    write_json_gz(&staging.join("pages.json"), &export.pages)?;
    for page in &export.pages {
        write_json_gz(&staging.join("pages").join(format!("{}.json", page.slug)), page)?;
    }

    let posts = &export.posts;
    write_json_gz(
        &staging.join("recent.json"),
        &recent_posts(posts, config.extract.recent_limit),
    )?;

    let chunks = write_chunks(staging, posts, config.extract.chunk_size)?;

    let by_category = category_index(posts);
    by_category
        .par_iter()
        .try_for_each(|(slug, summaries)| {
            write_json_gz(
                &staging.join("categories").join(format!("{slug}.json")),
                summaries,
            )
        })?;

    let by_author = author_index(posts);
    by_author
        .par_iter()
        .try_for_each(|(slug, entry)| {
            write_json_gz(&staging.join("authors").join(format!("{slug}.json")), entry)
        })?;
    write_json_gz(
        &staging.join("authors").join("_index.json"),
        &author_name_index(&by_author),
    )?;

    write_json_gz(&staging.join("sitemap-posts.json"), &sitemap_manifest(posts))?;

    Ok(ExtractReport {
        posts: posts.len(),
        pages: export.pages.len(),
        categories: export.categories.len(),
        authors: by_author.len(),
        chunks,
    })
}

/// Swap the staging directory into place.
fn publish(staging: &Path, data_dir: &Path) -> Result<()> {
    if data_dir.exists() {
        fs::remove_dir_all(data_dir)
            .with_context(|| format!("failed to remove old {}", data_dir.display()))?;
    }
    fs::rename(staging, data_dir).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            staging.display(),
            data_dir.display()
        )
    })?;
    Ok(())
}

fn staging_dir(data_dir: &Path) -> PathBuf {
    let mut os = data_dir.as_os_str().to_owned();
    os.push(".staging");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{PostSummary, RecentSummary, SitemapEntry};
    use crate::store::{PostStore, read_json_gz};
    use crate::wxr::Category;
    use std::collections::BTreeMap;

    fn item(slug: &str, status: &str, post_type: &str, date_gmt: &str, cats: &str) -> String {
        format!(
            r#"<item>
                <title>Title {slug}</title>
                <dc:creator>jdoe</dc:creator>
                <content:encoded><![CDATA[<h2>Intro</h2><p>a</p><h2>Conclusion</h2>[subcategory]]]></content:encoded>
                <excerpt:encoded>About {slug}</excerpt:encoded>
                <wp:post_date_gmt>{date_gmt}</wp:post_date_gmt>
                <wp:post_name>{slug}</wp:post_name>
                <wp:status>{status}</wp:status>
                <wp:post_type>{post_type}</wp:post_type>
                {cats}
            </item>"#
        )
    }

    fn sample_xml() -> String {
        let cat = r#"<category domain="category" nicename="europe">Europe</category>"#;
        format!(
            r#"<rss>
            <wp:author>
                <wp:author_login>jdoe</wp:author_login>
                <wp:author_display_name>Jane Doe</wp:author_display_name>
            </wp:author>
            <wp:category>
                <wp:category_nicename>europe</wp:category_nicename>
                <wp:cat_name>Europe</wp:cat_name>
            </wp:category>
            {}{}{}{}{}
            </rss>"#,
            item("first", "publish", "post", "2023-01-01 00:00:00", cat),
            item("second", "publish", "post", "2023-02-01 00:00:00", cat),
            item("hidden", "draft", "post", "2023-03-01 00:00:00", ""),
            item("about", "publish", "page", "2022-01-01 00:00:00", ""),
            item("", "publish", "post", "2023-04-01 00:00:00", ""),
        )
    }

    fn run_on_sample() -> (tempfile::TempDir, PipelineConfig, ExtractReport) {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("export.xml");
        std::fs::write(&source, sample_xml()).unwrap();

        let mut config = PipelineConfig::default();
        config.extract.source = source;
        config.extract.data_dir = dir.path().join("data");
        config.extract.chunk_size = 1;

        let report = run_extract(&config).unwrap();
        (dir, config, report)
    }

    #[test]
    fn test_full_pipeline_round_trip() {
        let (_dir, config, report) = run_on_sample();
        assert_eq!(report.posts, 2);
        assert_eq!(report.pages, 1);
        assert_eq!(report.chunks, 2);

        let store = PostStore::new(&config.extract.data_dir);
        let post = store.get("first").unwrap().unwrap();
        assert_eq!(post.title, "Title first");
        assert_eq!(post.author_display, "Jane Doe");
        // body was normalized before persistence
        assert!(post.content.contains(r#"<h2 id="intro">"#));
        assert!(!post.content.contains("[subcategory]"));

        // draft and slugless items never reach the store
        assert!(store.get("hidden").unwrap().is_none());
        assert_eq!(store.post_count().unwrap(), 2);
    }

    #[test]
    fn test_indexes_written() {
        let (_dir, config, _report) = run_on_sample();
        let data = &config.extract.data_dir;

        let recent: Vec<RecentSummary> =
            read_json_gz(&data.join("recent.json")).unwrap().unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].slug, "second"); // newest first

        let europe: Vec<PostSummary> =
            read_json_gz(&data.join("categories/europe.json")).unwrap().unwrap();
        assert_eq!(europe.len(), 2);

        let authors: BTreeMap<String, serde_json::Value> =
            read_json_gz(&data.join("authors/_index.json")).unwrap().unwrap();
        assert_eq!(authors["jane-doe"]["count"], 2);

        let manifest: Vec<SitemapEntry> =
            read_json_gz(&data.join("sitemap-posts.json")).unwrap().unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest[0].slug, "second");

        let cats: Vec<Category> =
            read_json_gz(&data.join("categories.json")).unwrap().unwrap();
        assert_eq!(cats[0].slug, "europe");
    }

    #[test]
    fn test_pages_stored_individually() {
        let (_dir, config, _report) = run_on_sample();
        let page: crate::wxr::Post =
            read_json_gz(&config.extract.data_dir.join("pages/about.json"))
                .unwrap()
                .unwrap();
        assert_eq!(page.post_type, "page");
    }

    #[test]
    fn test_staging_dir_cleaned_up() {
        let (_dir, config, _report) = run_on_sample();
        assert!(config.extract.data_dir.exists());
        assert!(!staging_dir(&config.extract.data_dir).exists());
    }

    #[test]
    fn test_missing_source_fails_without_touching_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.extract.source = dir.path().join("nope.xml");
        config.extract.data_dir = dir.path().join("data");

        assert!(run_extract(&config).is_err());
        assert!(!config.extract.data_dir.exists());
    }

    #[test]
    fn test_rerun_replaces_dataset() {
        let (dir, mut config, _report) = run_on_sample();

        // second run against a smaller export replaces, not merges
        let source = dir.path().join("export2.xml");
        std::fs::write(
            &source,
            format!(
                "<rss>{}</rss>",
                item("only", "publish", "post", "2024-01-01 00:00:00", "")
            ),
        )
        .unwrap();
        config.extract.source = source;

        let report = run_extract(&config).unwrap();
        assert_eq!(report.posts, 1);

        let store = PostStore::new(&config.extract.data_dir);
        assert!(store.get("only").unwrap().is_some());
        assert!(store.get("first").unwrap().is_none());
    }
}
