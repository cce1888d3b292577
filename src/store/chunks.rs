//! Chunked post storage with O(1) slug lookup.
//!
//! ~142k posts cannot live in one JSON file the render layer would have to
//! load whole, and 142k individual files is worse. Posts are partitioned into
//! fixed-size chunks (`posts/chunk-<n>.json.gz`, each a slug→Post map) plus a
//! single `slug-index.json.gz` mapping slug→chunk number. Resolving one post
//! costs the index (cached after first load) plus exactly one chunk
//! decompress, regardless of corpus size.
//!
//! Chunk membership is irrelevant to correctness; callers sort before writing
//! so neighboring records compress well and hot chunks stay hot.

use super::gzip::{read_json_gz, write_json_gz};
use crate::wxr::Post;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const POSTS_DIR: &str = "posts";
const SLUG_INDEX_FILE: &str = "slug-index.json";

fn chunk_file(n: usize) -> String {
    format!("chunk-{n}.json")
}

/// Partition `posts` (in caller order) into chunks under `data_dir/posts/`
/// and write the slug index. Returns the number of chunks written.
///
/// Callers must already have filtered out slugless posts: a record without a
/// slug would be unaddressable in the store.
pub fn write_chunks(data_dir: &Path, posts: &[Post], chunk_size: usize) -> Result<usize> {
    let posts_dir = data_dir.join(POSTS_DIR);
    std::fs::create_dir_all(&posts_dir)
        .with_context(|| format!("failed to create {}", posts_dir.display()))?;

    let mut slug_index: BTreeMap<&str, usize> = BTreeMap::new();
    let mut chunk_count = 0;

    for (num, slice) in posts.chunks(chunk_size.max(1)).enumerate() {
        let chunk: BTreeMap<&str, &Post> =
            slice.iter().map(|post| (post.slug.as_str(), post)).collect();
        for post in slice {
            slug_index.insert(&post.slug, num);
        }
        write_json_gz(&posts_dir.join(chunk_file(num)), &chunk)?;
        chunk_count = num + 1;
    }

    write_json_gz(&data_dir.join(SLUG_INDEX_FILE), &slug_index)?;
    Ok(chunk_count)
}

/// Read side of the chunked store.
///
/// The slug index is loaded lazily and cached for the life of the process;
/// concurrent first reads may race to load it, which wastes one decompress
/// and nothing else. There is no invalidation: a fresh dataset means a fresh
/// process.
pub struct PostStore {
    data_dir: PathBuf,
    slug_index: OnceLock<HashMap<String, usize>>,
}

impl PostStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            slug_index: OnceLock::new(),
        }
    }

    fn slug_index(&self) -> Result<&HashMap<String, usize>> {
        if let Some(index) = self.slug_index.get() {
            return Ok(index);
        }
        let loaded: HashMap<String, usize> =
            read_json_gz(&self.data_dir.join(SLUG_INDEX_FILE))?.unwrap_or_default();
        Ok(self.slug_index.get_or_init(|| loaded))
    }

    /// Resolve one post by slug.
    ///
    /// Absence is a value, not a fault: an unknown slug, a missing chunk
    /// file, or a slug missing from its nominal chunk (defensive
    /// double-check) all return `Ok(None)`.
    pub fn get(&self, slug: &str) -> Result<Option<Post>> {
        let Some(&chunk_num) = self.slug_index()?.get(slug) else {
            return Ok(None);
        };
        let chunk: Option<HashMap<String, Post>> =
            read_json_gz(&self.data_dir.join(POSTS_DIR).join(chunk_file(chunk_num)))?;
        Ok(chunk.and_then(|mut posts| posts.remove(slug)))
    }

    pub fn post_count(&self) -> Result<usize> {
        Ok(self.slug_index()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_post(n: usize) -> Post {
        Post {
            title: format!("Post {n}"),
            slug: format!("post-{n}"),
            date_gmt: format!("2023-01-01 {:02}:00:00", n % 24),
            content: format!("<p>body {n}</p>"),
            status: "publish".into(),
            post_type: "post".into(),
            ..Post::default()
        }
    }

    #[test]
    fn test_chunk_partitioning_1250_by_500() {
        let dir = tempfile::tempdir().unwrap();
        let posts: Vec<Post> = (0..1250).map(make_post).collect();

        let chunks = write_chunks(dir.path(), &posts, 500).unwrap();
        assert_eq!(chunks, 3);

        let posts_dir = dir.path().join("posts");
        assert!(posts_dir.join("chunk-0.json.gz").exists());
        assert!(posts_dir.join("chunk-2.json.gz").exists());
        assert!(!posts_dir.join("chunk-3.json.gz").exists());

        // every slug resolves to the chunk its position dictates
        let index: HashMap<String, usize> =
            read_json_gz(&dir.path().join("slug-index.json")).unwrap().unwrap();
        assert_eq!(index.len(), 1250);
        assert_eq!(index["post-0"], 0);
        assert_eq!(index["post-499"], 0);
        assert_eq!(index["post-500"], 1);
        assert_eq!(index["post-1249"], 2);

        // the last chunk holds the 250 remainder
        let last: HashMap<String, Post> =
            read_json_gz(&posts_dir.join("chunk-2.json")).unwrap().unwrap();
        assert_eq!(last.len(), 250);
    }

    #[test]
    fn test_round_trip_equality() {
        let dir = tempfile::tempdir().unwrap();
        let posts: Vec<Post> = (0..42).map(make_post).collect();
        write_chunks(dir.path(), &posts, 10).unwrap();

        let store = PostStore::new(dir.path());
        for post in &posts {
            let found = store.get(&post.slug).unwrap().unwrap();
            assert_eq!(&found, post);
        }
    }

    #[test]
    fn test_missing_slug_is_none() {
        let dir = tempfile::tempdir().unwrap();
        write_chunks(dir.path(), &[make_post(1)], 10).unwrap();

        let store = PostStore::new(dir.path());
        assert!(store.get("no-such-slug").unwrap().is_none());
    }

    #[test]
    fn test_empty_store_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = PostStore::new(dir.path());
        assert!(store.get("anything").unwrap().is_none());
        assert_eq!(store.post_count().unwrap(), 0);
    }

    #[test]
    fn test_stale_index_entry_is_none() {
        // index claims a chunk that does not contain the slug
        let dir = tempfile::tempdir().unwrap();
        write_chunks(dir.path(), &[make_post(1)], 10).unwrap();

        let mut index: HashMap<String, usize> =
            read_json_gz(&dir.path().join("slug-index.json")).unwrap().unwrap();
        index.insert("phantom".into(), 0);
        write_json_gz(&dir.path().join("slug-index.json"), &index).unwrap();

        let store = PostStore::new(dir.path());
        assert!(store.get("phantom").unwrap().is_none());
    }
}
