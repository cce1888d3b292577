//! Persisted data layout: gzip JSON files and the chunked post store.

pub mod chunks;
pub mod gzip;

pub use chunks::{PostStore, write_chunks};
pub use gzip::{read_json_gz, write_json_gz};

use crate::category::CategoryMap;
use crate::wxr::{Category, Post};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Read-side facade over a published data directory.
///
/// Holds the two small long-lived caches: the chunk store's slug index and
/// the category list. Every other read decompresses one file on demand.
pub struct DataStore {
    data_dir: PathBuf,
    posts: PostStore,
    categories: OnceLock<Vec<Category>>,
}

impl DataStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            posts: PostStore::new(&data_dir),
            data_dir,
            categories: OnceLock::new(),
        }
    }

    /// Slug-addressed access to the chunked posts.
    pub fn posts(&self) -> &PostStore {
        &self.posts
    }

    /// All categories, loaded once per store. A missing file is an empty
    /// taxonomy, not an error.
    pub fn categories(&self) -> Result<&[Category]> {
        if let Some(cached) = self.categories.get() {
            return Ok(cached);
        }
        let loaded: Vec<Category> =
            read_json_gz(&self.data_dir.join("categories.json"))?.unwrap_or_default();
        Ok(self.categories.get_or_init(|| loaded))
    }

    /// Slug→Category lookup built over [`Self::categories`].
    pub fn category_map(&self) -> Result<CategoryMap> {
        Ok(CategoryMap::new(self.categories()?))
    }

    /// One page by slug, `Ok(None)` when absent.
    pub fn page(&self, slug: &str) -> Result<Option<Post>> {
        read_json_gz(&self.data_dir.join("pages").join(format!("{slug}.json")))
    }
}
