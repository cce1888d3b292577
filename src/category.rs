//! Category lookup and hierarchy resolution.
//!
//! Categories form a tree through `parent` slug references. The export format
//! does not actually guarantee a tree, so the hierarchy walk carries a
//! visited set: a revisited slug means malformed taxonomy data, and the walk
//! stops there instead of looping.

use crate::log;
use crate::wxr::Category;
use std::collections::{HashMap, HashSet};

/// Slug-keyed category lookup built once per run.
#[derive(Debug, Default)]
pub struct CategoryMap {
    map: HashMap<String, Category>,
}

impl CategoryMap {
    pub fn new(categories: &[Category]) -> Self {
        let map = categories
            .iter()
            .map(|cat| (cat.slug.clone(), cat.clone()))
            .collect();
        Self { map }
    }

    pub fn get(&self, slug: &str) -> Option<&Category> {
        self.map.get(slug)
    }

    /// Parent chain for a category, root first, ending at the category
    /// itself. Unknown slugs yield an empty chain. Used directly as the
    /// breadcrumb trail.
    pub fn hierarchy(&self, slug: &str) -> Vec<&Category> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = slug;

        while !current.is_empty() {
            if !visited.insert(current.to_owned()) {
                log!("error"; "category parent cycle at '{current}', truncating chain");
                break;
            }
            let Some(cat) = self.map.get(current) else {
                break;
            };
            chain.push(cat);
            current = &cat.parent;
        }

        chain.reverse();
        chain
    }
}
