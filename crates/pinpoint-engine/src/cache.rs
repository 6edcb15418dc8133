use pinpoint_common::NodeHandle;
use pinpoint_common::text::normalize_text;
use std::collections::HashMap;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct CacheEntry {
    pub node: NodeHandle,
    pub inserted_at: Instant,
}

/// Resolved nodes keyed by (page identity, normalized phrase).
///
/// Lookups are exact. Entries never expire on their own.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<(String, String), CacheEntry>,
}

fn key(page: &str, phrase: &str) -> (String, String) {
    (page.to_string(), normalize_text(phrase))
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page: &str, phrase: &str) -> Option<NodeHandle> {
        self.entry(page, phrase).map(|e| e.node)
    }

    pub fn entry(&self, page: &str, phrase: &str) -> Option<&CacheEntry> {
        self.entries.get(&key(page, phrase))
    }

    pub fn put(&mut self, page: &str, phrase: &str, node: NodeHandle) {
        self.entries.insert(
            key(page, phrase),
            CacheEntry {
                node,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn remove(&mut self, page: &str, phrase: &str) -> Option<CacheEntry> {
        self.entries.remove(&key(page, phrase))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_scoped_to_page() {
        let mut cache = ResultCache::new();
        cache.put("https://a.test/", "Click Submit", NodeHandle(4));
        assert_eq!(cache.get("https://a.test/", "Click Submit"), Some(NodeHandle(4)));
        assert_eq!(cache.get("https://b.test/", "Click Submit"), None);
    }

    #[test]
    fn phrase_is_normalized_but_not_fuzzy() {
        let mut cache = ResultCache::new();
        cache.put("p", "Click  the Submit button", NodeHandle(1));
        assert_eq!(cache.get("p", "click the submit button!"), Some(NodeHandle(1)));
        assert_eq!(cache.get("p", "click the submit buton"), None);
    }

    #[test]
    fn remove_and_clear() {
        let mut cache = ResultCache::new();
        cache.put("p", "a", NodeHandle(1));
        cache.put("p", "b", NodeHandle(2));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.remove("p", "a").map(|e| e.node), Some(NodeHandle(1)));
        assert!(cache.get("p", "a").is_none());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn overwrite_replaces_entry() {
        let mut cache = ResultCache::new();
        cache.put("p", "a", NodeHandle(1));
        cache.put("p", "A", NodeHandle(9));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("p", "a"), Some(NodeHandle(9)));
    }
}
