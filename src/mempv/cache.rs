use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        RwLock,
    },
};

use linked_hash_map::LinkedHashMap;
use log::debug;

use crate::{
    error::Error,
    lsn::Lsn,
    page::PageBuffer,
    types::{FileId, PageNo, SnapResult},
    utils::HandyRwLock,
};

pub const DEFAULT_CACHE_CAPACITY: usize = 50;
static CACHE_CAPACITY: AtomicUsize = AtomicUsize::new(DEFAULT_CACHE_CAPACITY);

type PageKey = (FileId, PageNo);
type VersionKey = (FileId, PageNo, Lsn);

/// Bounded cache of materialized page versions.
///
/// Two-level index: an outer bucket per (file id, page number) holding the
/// page's cached versions keyed by snapshot LSN, plus one recency list
/// threading every version across all buckets (front = least recent).
/// Every entry is in its outer bucket, its inner map, and the recency list
/// at all times; the three are updated together under the lock.
///
/// Reads take the write lock too, because a hit reorders the recency list.
pub struct VersionCache {
    inner: RwLock<VersionCacheInner>,
    capacity: usize,
}

struct VersionCacheInner {
    pages: HashMap<PageKey, HashMap<Lsn, PageBuffer>>,
    lru: LinkedHashMap<VersionKey, ()>,
}

impl VersionCache {
    /// A cache with the capacity configured at construction time.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(VersionCacheInner {
                pages: HashMap::new(),
                lru: LinkedHashMap::new(),
            }),
            capacity: Self::get_capacity(),
        }
    }

    pub fn set_capacity(capacity: usize) {
        CACHE_CAPACITY.store(capacity, Ordering::Relaxed);
    }

    pub fn get_capacity() -> usize {
        CACHE_CAPACITY.load(Ordering::Relaxed)
    }

    /// Cache a materialized version of a page under its snapshot LSN.
    /// Duplicate keys coalesce silently; at capacity the least-recent entry
    /// is evicted first.
    pub fn put(
        &self,
        file_id: FileId,
        pgno: PageNo,
        buffer: &PageBuffer,
        snapshot_lsn: Lsn,
    ) -> SnapResult {
        let mut inner = self.inner.wl();
        let page_key = (file_id, pgno);

        if let Some(versions) = inner.pages.get(&page_key) {
            if versions.contains_key(&snapshot_lsn) {
                // an equal version is already cached
                return Ok(());
            }
        }

        if inner.lru.len() >= self.capacity {
            inner.evict_one(&page_key)?;
        }

        inner
            .pages
            .entry(page_key)
            .or_insert_with(HashMap::new)
            .insert(snapshot_lsn, buffer.clone());
        inner.lru.insert((file_id, pgno, snapshot_lsn), ());

        debug!(
            "cached page {} of file {} at snapshot {}",
            pgno, file_id, snapshot_lsn
        );
        Ok(())
    }

    /// Copy the cached version into `out` and mark it most recent. Misses
    /// are `NotFound`.
    pub fn get(
        &self,
        file_id: FileId,
        pgno: PageNo,
        snapshot_lsn: Lsn,
        out: &mut PageBuffer,
    ) -> SnapResult {
        let mut inner = self.inner.wl();
        let page_key = (file_id, pgno);

        let cached = match inner
            .pages
            .get(&page_key)
            .and_then(|versions| versions.get(&snapshot_lsn))
        {
            Some(entry) => entry.clone(),
            None => return Err(Error::NotFound),
        };
        out.copy_from(&cached);

        // refresh recency
        inner.lru.get_refresh(&(file_id, pgno, snapshot_lsn));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.rl().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn contains(&self, file_id: FileId, pgno: PageNo, snapshot_lsn: Lsn) -> bool {
        let inner = self.inner.rl();
        let in_bucket = inner
            .pages
            .get(&(file_id, pgno))
            .map(|versions| versions.contains_key(&snapshot_lsn))
            .unwrap_or(false);
        let in_lru = inner.lru.contains_key(&(file_id, pgno, snapshot_lsn));
        assert_eq!(in_bucket, in_lru);
        in_bucket
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.inner.rl().pages.len()
    }
}

impl Default for VersionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionCacheInner {
    /// Drop the least-recent entry. Its outer bucket goes too when this
    /// empties it, unless it is the bucket the caller is about to insert
    /// into.
    fn evict_one(&mut self, inserting_into: &PageKey) -> SnapResult {
        let (file_id, pgno, snapshot_lsn) = match self.lru.pop_front() {
            Some((key, ())) => key,
            None => return Err(Error::fatal("version cache has nothing to evict")),
        };

        let page_key = (file_id, pgno);
        let emptied = {
            let versions = self.pages.get_mut(&page_key).ok_or_else(|| {
                Error::fatal(format!(
                    "evicted version of page {} has no bucket",
                    pgno
                ))
            })?;
            versions.remove(&snapshot_lsn);
            versions.is_empty()
        };

        if emptied && page_key != *inserting_into {
            self.pages.remove(&page_key);
        }

        debug!(
            "evicted page {} of file {} at snapshot {}",
            pgno, file_id, snapshot_lsn
        );
        Ok(())
    }
}
