use std::{
    path::Path,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::{
    error::Error,
    lsn::Lsn,
    mempool::{BufferPool, DEFAULT_DRAIN_POLL_MS, DEFAULT_DRAIN_RETRIES},
    mempv::{self, cache::VersionCache, PageHandle, SnapStats},
    page::DEFAULT_PAGE_SIZE,
    tx_log::{LogCursor, LogStore},
    txn::CommitMap,
    types::{DbRegId, FileId, PageNo, Pod, SnapResult},
    utils::HandyRwLock,
};

/// Environment tunables, fixed at construction.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub page_size: usize,

    /// Cross-check the file id logged in add/remove records against the
    /// file a page was fetched from.
    pub verify_fileid: bool,

    /// Verbose per-iteration tracing in the reconstruction loop.
    pub debug_pages: bool,

    /// Bounded poll budget for the snapshot-pin writer-drain wait.
    pub drain_retries: u32,
    pub drain_poll_ms: u64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            verify_fileid: false,
            debug_pages: false,
            drain_retries: DEFAULT_DRAIN_RETRIES,
            drain_poll_ms: DEFAULT_DRAIN_POLL_MS,
        }
    }
}

/// Identity of an open file: its stable unique id plus the small registry
/// id its log records carry.
#[derive(Debug, Clone, Copy)]
pub struct FileHandle {
    pub id: FileId,
    pub regid: DbRegId,
}

impl FileHandle {
    pub fn new(id: FileId, regid: DbRegId) -> Self {
        Self { id, regid }
    }
}

/// Process-wide state of the reconstruction engine: the log, the buffer
/// pool of current pages, the transaction commit map, the version cache,
/// and the statistics counters.
pub struct Env {
    config: EnvConfig,
    log: Pod<LogStore>,
    buffer_pool: BufferPool,
    commit_map: CommitMap,
    cache: VersionCache,
    stats: SnapStats,
}

impl Env {
    /// Create an environment over a fresh log directory.
    pub fn create<P: AsRef<Path>>(dir: P, config: EnvConfig) -> Result<Arc<Self>, Error> {
        let log = LogStore::create(dir)?;
        Ok(Self::with_log(log, config))
    }

    /// Reopen an environment over an existing log directory. Caches and
    /// maps start empty; they are in-memory only and rebuilt from the log
    /// by higher layers.
    pub fn open<P: AsRef<Path>>(dir: P, config: EnvConfig) -> Result<Arc<Self>, Error> {
        let log = LogStore::open(dir)?;
        Ok(Self::with_log(log, config))
    }

    fn with_log(log: LogStore, config: EnvConfig) -> Arc<Self> {
        let buffer_pool = BufferPool::new(
            config.drain_retries,
            Duration::from_millis(config.drain_poll_ms),
        );
        Arc::new(Self {
            config,
            log: Arc::new(RwLock::new(log)),
            buffer_pool,
            commit_map: CommitMap::new(),
            cache: VersionCache::new(),
            stats: SnapStats::new(),
        })
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn log(&self) -> RwLockReadGuard<LogStore> {
        self.log.rl()
    }

    pub fn mut_log(&self) -> RwLockWriteGuard<LogStore> {
        self.log.wl()
    }

    /// A positioned log reader; takes no lock.
    pub fn log_cursor(&self) -> LogCursor {
        self.log.rl().cursor()
    }

    pub fn buffer_pool(&self) -> &BufferPool {
        &self.buffer_pool
    }

    pub fn commit_map(&self) -> &CommitMap {
        &self.commit_map
    }

    pub fn cache(&self) -> &VersionCache {
        &self.cache
    }

    pub fn stats(&self) -> &SnapStats {
        &self.stats
    }

    /// See `mempv::fget`.
    pub fn fget(
        &self,
        file: &FileHandle,
        pgno: PageNo,
        target_lsn: Lsn,
        ckpt_commit_frontier: Lsn,
    ) -> Result<PageHandle, Error> {
        mempv::fget(self, file, pgno, target_lsn, ckpt_commit_frontier)
    }

    /// See `mempv::fput`.
    pub fn fput(&self, handle: PageHandle, flags: u32) -> SnapResult {
        mempv::fput(self, handle, flags)
    }
}
