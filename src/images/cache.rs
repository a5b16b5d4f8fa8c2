use std::collections::HashMap;

use super::candidates::CandidateSet;
use super::resolver::{ImageResolver, ResolvedImage};

/// Caller-owned memo of past lookups, keyed on `(display_name, brand_name)`.
///
/// Keys are taken as given: "Black" and "black" are separate entries even
/// though they resolve the same way.
#[derive(Debug, Default, Clone)]
pub struct ResolutionCache {
    entries: HashMap<(String, Option<String>), ResolvedImage>,
    hits: u64,
    misses: u64,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, display_name: &str, brand_name: Option<&str>) -> Option<&ResolvedImage> {
        self.entries.get(&key(display_name, brand_name))
    }

    pub fn insert(&mut self, display_name: &str, brand_name: Option<&str>, resolved: ResolvedImage) {
        self.entries.insert(key(display_name, brand_name), resolved);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) counted by [`ResolutionCache::get_or_resolve`]
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// Return the cached result, or resolve and remember it.
    pub fn get_or_resolve(
        &mut self,
        resolver: &ImageResolver,
        display_name: &str,
        brand_name: Option<&str>,
        candidates: &CandidateSet,
    ) -> ResolvedImage {
        if let Some(hit) = self.lookup(display_name, brand_name) {
            let hit = hit.clone();
            self.hits += 1;
            return hit;
        }

        self.misses += 1;
        let resolved = resolver.resolve(display_name, brand_name, candidates);
        tracing::debug!(display_name, ?brand_name, path = %resolved.path, found = resolved.found, "resolved image");
        self.insert(display_name, brand_name, resolved.clone());
        resolved
    }
}

fn key(display_name: &str, brand_name: Option<&str>) -> (String, Option<String>) {
    (display_name.to_string(), brand_name.map(str::to_string))
}
