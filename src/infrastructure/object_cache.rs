// src/infrastructure/object_cache.rs
//
// In-memory object cache keyed by identifier
//
// RULES:
// - First writer wins: a cached key is never overwritten
// - No eviction: entries live as long as the owning service
// - Not synchronized: mutation needs `&mut self`, so the owner decides who writes

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::ArticleStatus;

/// Anything that can live in an `ObjectCache`
pub trait Cacheable {
    fn cache_key(&self) -> &str;
}

impl Cacheable for ArticleStatus {
    fn cache_key(&self) -> &str {
        self.article_id()
    }
}

/// Keyed store of shared objects
#[derive(Debug)]
pub struct ObjectCache<T: Cacheable> {
    objects: HashMap<String, Arc<T>>,
}

impl<T: Cacheable> ObjectCache<T> {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }

    pub fn lookup(&self, key: &str) -> Option<Arc<T>> {
        self.objects.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Insert every object whose key is not cached yet.
    /// Objects for keys that are already present are dropped.
    pub fn insert_missing<I>(&mut self, objects: I)
    where
        I: IntoIterator<Item = Arc<T>>,
    {
        for object in objects {
            self.objects
                .entry(object.cache_key().to_string())
                .or_insert(object);
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<T: Cacheable> Default for ObjectCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatusFlag;
    use chrono::Utc;

    fn status(id: &str) -> Arc<ArticleStatus> {
        Arc::new(ArticleStatus::new(id, Utc::now()))
    }

    #[test]
    fn test_lookup_missing_key() {
        let cache: ObjectCache<ArticleStatus> = ObjectCache::new();
        assert!(cache.lookup("a1").is_none());
        assert!(!cache.contains("a1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_missing_adds_new_keys() {
        let mut cache = ObjectCache::new();
        cache.insert_missing(vec![status("a1"), status("a2")]);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a1"));
        assert_eq!(cache.lookup("a2").unwrap().article_id(), "a2");
    }

    #[test]
    fn test_first_writer_wins() {
        let mut cache = ObjectCache::new();
        let original = status("a1");
        cache.insert_missing(vec![Arc::clone(&original)]);

        let replacement = status("a1");
        replacement.set_flag(&StatusFlag::read(), true);
        cache.insert_missing(vec![replacement]);

        let cached = cache.lookup("a1").unwrap();
        assert!(Arc::ptr_eq(&cached, &original));
        assert!(!cached.is_read());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_duplicates_within_one_batch_keep_the_first() {
        let mut cache = ObjectCache::new();
        let first = status("a1");
        let second = status("a1");
        cache.insert_missing(vec![Arc::clone(&first), second]);

        assert!(Arc::ptr_eq(&cache.lookup("a1").unwrap(), &first));
    }
}
