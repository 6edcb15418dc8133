use crate::accessor::PageAccessor;
use crate::cache::ResultCache;

/// One live page plus the cache namespace that belongs to it.
///
/// Resolution borrows the context mutably, so a context never has two
/// resolutions in flight. Independent contexts share nothing.
pub struct PageContext<A> {
    pub(crate) accessor: A,
    pub(crate) cache: ResultCache,
}

impl<A: PageAccessor> PageContext<A> {
    pub fn new(accessor: A) -> Self {
        Self {
            accessor,
            cache: ResultCache::new(),
        }
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn into_accessor(self) -> A {
        self.accessor
    }
}
