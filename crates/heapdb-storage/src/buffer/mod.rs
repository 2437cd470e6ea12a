//! Read cache of decoded heap pages.
//!
//! Repeated scans of a table reuse decoded pages instead of re-reading them.
//! Cached pages are shared read-only. Each entry remembers the
//! [`HeapFile::generation`] it was decoded at and is reloaded once the file
//! has been written since.

use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use heapdb_catalog::{TableId, TableSchema};
use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use crate::{heap_file::HeapFile, identity::PageId, page::HeapPage, StorageError};

/// Number of pages cached when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 50;

/// Hit, miss and eviction counts for a [`BufferPool`].
#[derive(Debug, Default)]
pub struct BufferPoolStats {
    hits: AtomicU64,
    /// Lookups that had to read and decode, including stale entries.
    misses: AtomicU64,
    /// Pages dropped to make room or by [`BufferPool::evict`].
    evictions: AtomicU64,
}

impl BufferPoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// `hits / (hits + misses)`, or 0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug)]
struct CachedPage {
    page: Arc<HeapPage>,
    generation: u64,
}

/// LRU cache of decoded pages keyed by page id.
#[derive(Debug)]
pub struct BufferPool {
    cache: Mutex<LruCache<PageId, CachedPage>>,
    capacity: usize,
    stats: BufferPoolStats,
}

impl BufferPool {
    /// Create a new buffer pool holding at most `capacity` pages.
    ///
    /// A capacity of 0 falls back to [`DEFAULT_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 { DEFAULT_CAPACITY } else { capacity };
        let cache = LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN));

        BufferPool { cache: Mutex::new(cache), capacity, stats: BufferPoolStats::new() }
    }

    /// Get a page from the cache, or read and decode it from `file`.
    pub fn get_page(
        &self,
        page_id: PageId,
        file: &HeapFile,
        schema: &Arc<TableSchema>,
    ) -> Result<Arc<HeapPage>, StorageError> {
        // Taken before the read so a concurrent write leaves the entry stale.
        let generation = file.generation();
        if let Some(cached) = self.cache.lock().get(&page_id) {
            if cached.generation == generation {
                self.stats.record_hit();
                return Ok(Arc::clone(&cached.page));
            }
            trace!(%page_id, "buffer pool entry is stale");
        }

        // Decode outside the lock; a concurrent miss on the same page just
        // decodes it twice.
        self.stats.record_miss();
        trace!(%page_id, "buffer pool miss");
        let bytes = file.read_page(page_id.page_number)?;
        let page = Arc::new(HeapPage::decode(page_id, &bytes, Arc::clone(schema))?);
        self.insert(Arc::clone(&page), generation);
        Ok(page)
    }

    /// Cache `page` as current for the present contents of `file`, evicting
    /// the least recently used page if full.
    pub fn put_page(&self, page: Arc<HeapPage>, file: &HeapFile) {
        self.insert(page, file.generation());
    }

    fn insert(&self, page: Arc<HeapPage>, generation: u64) {
        let page_id = page.id();
        if let Some((evicted_id, _)) =
            self.cache.lock().push(page_id, CachedPage { page, generation })
        {
            // push also returns the old value when replacing the same key
            if evicted_id != page_id {
                trace!(page_id = %evicted_id, "buffer pool eviction");
                self.stats.record_eviction();
            }
        }
    }

    /// Drop a page from the cache.
    pub fn evict(&self, page_id: PageId) {
        if self.cache.lock().pop(&page_id).is_some() {
            self.stats.record_eviction();
        }
    }

    /// Drop every cached page of `table_id`, e.g. after its file was rewritten.
    pub fn discard_table(&self, table_id: TableId) {
        let mut cache = self.cache.lock();
        let stale: Vec<PageId> =
            cache.iter().map(|(id, _)| *id).filter(|id| id.table_id == table_id).collect();
        for page_id in stale {
            cache.pop(&page_id);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached pages, stale ones included.
    pub fn size(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }
}
