//! Author index rebuild from existing post chunks.
//!
//! Useful when the grouping rules change after an extract: instead of
//! re-parsing the whole WXR export, scan `posts/chunk-*.json.gz` and rewrite
//! only the `authors/` directory. Chunks are processed one at a time so the
//! full post set is never resident.

use crate::config::PipelineConfig;
use crate::dates::newest_first;
use crate::index::{AuthorEntry, author_index, author_name_index};
use crate::log;
use crate::store::{read_json_gz, write_json_gz};
use crate::wxr::Post;
use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Scan all post chunks and rewrite `authors/<slug>.json` plus
/// `authors/_index.json`. Returns the number of authors written.
pub fn rebuild_authors(config: &PipelineConfig) -> Result<usize> {
    let data_dir = &config.extract.data_dir;
    let posts_dir = data_dir.join("posts");
    if !posts_dir.is_dir() {
        bail!(
            "no post chunks found in {}, run extract first",
            posts_dir.display()
        );
    }

    let chunks = chunk_numbers(&posts_dir)?;
    log!("authors"; "scanning {} chunks in {}", chunks.len(), posts_dir.display());

    let mut authors: BTreeMap<String, AuthorEntry> = BTreeMap::new();
    let mut scanned = 0usize;
    for number in chunks {
        let logical = posts_dir.join(format!("chunk-{number}.json"));
        let chunk: HashMap<String, Post> = read_json_gz(&logical)?.ok_or_else(|| {
            anyhow::anyhow!("chunk file vanished during scan: {}", logical.display())
        })?;
        scanned += chunk.len();
        let posts: Vec<Post> = chunk.into_values().collect();
        for (slug, entry) in author_index(&posts) {
            authors
                .entry(slug)
                .and_modify(|existing| existing.posts.extend(entry.posts.clone()))
                .or_insert(entry);
        }
    }

    // per-chunk lists were sorted independently, restore the global order
    for entry in authors.values_mut() {
        entry.posts.sort_by(|a, b| newest_first(&a.date, &b.date));
    }

    let authors_dir = data_dir.join("authors");
    if authors_dir.exists() {
        fs::remove_dir_all(&authors_dir)
            .with_context(|| format!("failed to clear {}", authors_dir.display()))?;
    }
    fs::create_dir_all(&authors_dir)
        .with_context(|| format!("failed to create {}", authors_dir.display()))?;

    authors.par_iter().try_for_each(|(slug, entry)| {
        write_json_gz(&authors_dir.join(format!("{slug}.json")), entry)
    })?;
    write_json_gz(
        &authors_dir.join("_index.json"),
        &author_name_index(&authors),
    )?;

    log!(
        "authors";
        "{} authors from {} posts written to {}",
        authors.len(),
        scanned,
        authors_dir.display()
    );
    Ok(authors.len())
}

/// Chunk numbers present in the posts directory, ascending. Files that do
/// not match the `chunk-<n>.json.gz` shape are ignored.
fn chunk_numbers(posts_dir: &Path) -> Result<Vec<usize>> {
    let mut numbers = Vec::new();
    for entry in WalkDir::new(posts_dir).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to scan {}", posts_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if let Some(number) = name
            .strip_prefix("chunk-")
            .and_then(|rest| rest.strip_suffix(".json.gz"))
            .and_then(|digits| digits.parse::<usize>().ok())
        {
            numbers.push(number);
        }
    }
    numbers.sort_unstable();
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::AuthorIndexEntry;
    use crate::store::write_chunks;

    fn post(slug: &str, date_gmt: &str, author: &str) -> Post {
        Post {
            slug: slug.into(),
            title: format!("Title {slug}"),
            date_gmt: date_gmt.into(),
            author: author.to_lowercase().replace(' ', ""),
            author_display: author.into(),
            status: "publish".into(),
            post_type: "post".into(),
            ..Post::default()
        }
    }

    fn seeded_config(posts: &[Post], chunk_size: usize) -> (tempfile::TempDir, PipelineConfig) {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        fs::create_dir_all(data_dir.join("posts")).unwrap();
        write_chunks(&data_dir, posts, chunk_size).unwrap();

        let mut config = PipelineConfig::default();
        config.extract.data_dir = data_dir;
        (dir, config)
    }

    #[test]
    fn test_rebuild_groups_across_chunks() {
        let posts = vec![
            post("a", "2021-01-01 00:00:00", "Jane Doe"),
            post("b", "2022-01-01 00:00:00", "Jane Doe"),
            post("c", "2023-01-01 00:00:00", "Bob"),
        ];
        // chunk size 1 forces Jane's posts into separate chunks
        let (_dir, config) = seeded_config(&posts, 1);

        let count = rebuild_authors(&config).unwrap();
        assert_eq!(count, 2);

        let data_dir = &config.extract.data_dir;
        let jane: AuthorEntry = read_json_gz(&data_dir.join("authors/jane-doe.json"))
            .unwrap()
            .unwrap();
        assert_eq!(jane.posts.len(), 2);
        assert_eq!(jane.posts[0].slug, "b"); // newest first across chunks

        let index: BTreeMap<String, AuthorIndexEntry> =
            read_json_gz(&data_dir.join("authors/_index.json"))
                .unwrap()
                .unwrap();
        assert_eq!(index["jane-doe"].count, 2);
        assert_eq!(index["bob"].count, 1);
    }

    #[test]
    fn test_rebuild_replaces_stale_author_files() {
        let posts = vec![post("a", "2021-01-01 00:00:00", "Jane Doe")];
        let (_dir, config) = seeded_config(&posts, 500);

        let authors_dir = config.extract.data_dir.join("authors");
        fs::create_dir_all(&authors_dir).unwrap();
        fs::write(authors_dir.join("ghost.json.gz"), b"stale").unwrap();

        rebuild_authors(&config).unwrap();
        assert!(!authors_dir.join("ghost.json.gz").exists());
        assert!(authors_dir.join("jane-doe.json.gz").exists());
    }

    #[test]
    fn test_rebuild_without_chunks_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PipelineConfig::default();
        config.extract.data_dir = dir.path().join("data");
        assert!(rebuild_authors(&config).is_err());
    }

    #[test]
    fn test_chunk_numbers_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let posts_dir = dir.path().join("posts");
        fs::create_dir_all(&posts_dir).unwrap();
        for name in ["chunk-10.json.gz", "chunk-2.json.gz", "chunk-0.json.gz", "notes.txt"] {
            fs::write(posts_dir.join(name), b"").unwrap();
        }
        assert_eq!(chunk_numbers(&posts_dir).unwrap(), vec![0, 2, 10]);
    }
}
