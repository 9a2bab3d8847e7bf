//! Modification-snapshot page reconstruction.
//!
//! `fget` returns a logical page as it stood at a historical LSN: it pins
//! the current image, and when that is not already guaranteed to be the
//! requested version, rolls a private copy back through the chain of
//! per-page log records until the last edit visible at the snapshot point,
//! caching the materialized result for future requests.

pub mod cache;

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::{
    env::{Env, FileHandle},
    error::Error,
    lsn::Lsn,
    mempool::PageRef,
    page::{PageBuffer, PageImage},
    tx_log::{CursorOp, DecodedRecord},
    types::{PageNo, SnapResult},
    undo::{self, UndoContext},
};

/// All three counters reset together when the total reaches this threshold.
pub const STATS_WRAP_THRESHOLD: u64 = 1_000_000_000;

/// Monotone reconstruction counters, carried on the environment handle.
pub struct SnapStats {
    hits: AtomicU64,
    misses: AtomicU64,
    total: AtomicU64,
}

impl SnapStats {
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    fn record_total(&self) {
        let total = self.total.fetch_add(1, Ordering::Relaxed) + 1;
        if total >= STATS_WRAP_THRESHOLD {
            // documented reset at the wrap threshold
            self.hits.store(0, Ordering::Relaxed);
            self.misses.store(0, Ordering::Relaxed);
            self.total.store(0, Ordering::Relaxed);
        }
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// (hits, misses, total), read without mutual consistency guarantees.
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}

impl Default for SnapStats {
    fn default() -> Self {
        Self::new()
    }
}

/// What `fget` hands back. The fast path returns the pinned current page;
/// reconstruction returns a private copy owned by the caller until `fput`.
pub enum PageHandle {
    Pinned(PageRef),
    Owned(Box<PageBuffer>),
}

impl PageHandle {
    pub fn lsn(&self) -> Lsn {
        match self {
            PageHandle::Pinned(pin) => pin.lsn(),
            PageHandle::Owned(buffer) => buffer.page().lsn(),
        }
    }

    pub fn is_pinned(&self) -> bool {
        matches!(self, PageHandle::Pinned(_))
    }

    /// Materialize the page image behind this handle.
    pub fn image(&self) -> PageImage {
        match self {
            PageHandle::Pinned(pin) => pin.image(),
            PageHandle::Owned(buffer) => buffer.page().clone(),
        }
    }
}

/// True when the current physical page already equals the page as of the
/// target snapshot:
///
/// - its edits predate logging discipline entirely, or
/// - it was last edited below the commit map's smallest logfile, under
///   which no uncommitted work exists and no younger commit is recorded, or
/// - it is at or before the last relevant checkpoint's commit frontier and
///   the snapshot is at or after it.
pub fn is_guaranteed_target(
    page_lsn: Lsn,
    target_lsn: Lsn,
    ckpt_commit_frontier: Lsn,
    smallest_logfile: i64,
) -> bool {
    if page_lsn.is_not_logged() {
        return true;
    }

    if smallest_logfile >= 0 && (page_lsn.file as i64) < smallest_logfile {
        return true;
    }

    // a zero frontier means no checkpoint has completed yet
    if !ckpt_commit_frontier.is_zero()
        && target_lsn >= ckpt_commit_frontier
        && ckpt_commit_frontier >= page_lsn
    {
        return true;
    }

    false
}

/// Return `pgno` of `file` in the version it had at `target_lsn`.
///
/// The handle must be released with `fput` exactly once.
pub fn fget(
    env: &Env,
    file: &FileHandle,
    pgno: PageNo,
    target_lsn: Lsn,
    ckpt_commit_frontier: Lsn,
) -> Result<PageHandle, Error> {
    env.stats().record_total();

    // lock order: buffer-pool bucket, frame latch, then (after both are
    // released) log cursor, commit-map mutex, version-cache rwlock
    let pin = env.buffer_pool().snap_get(file.id, pgno)?;

    // one atomic snapshot of the reclamation frontier per call
    let smallest_logfile = env.commit_map().smallest_logfile();
    let debug_pages = env.config().debug_pages;

    if is_guaranteed_target(pin.lsn(), target_lsn, ckpt_commit_frontier, smallest_logfile) {
        if debug_pages {
            debug!(
                "page {} at {} is already a guaranteed target of {}",
                pgno,
                pin.lsn(),
                target_lsn
            );
        }
        return Ok(PageHandle::Pinned(pin));
    }

    let mut buffer = PageBuffer::alloc(env.config().page_size, pgno);

    match env.cache().get(file.id, pgno, target_lsn, &mut buffer) {
        Ok(()) => {
            env.stats().record_hit();
            env.buffer_pool().snap_put(pin);
            return Ok(PageHandle::Owned(buffer));
        }
        Err(Error::NotFound) => {}
        Err(e) => {
            env.buffer_pool().snap_put(pin);
            return Err(e);
        }
    }

    pin.copy_into(&mut buffer);
    env.buffer_pool().snap_put(pin);
    env.stats().record_miss();

    let mut cursor = env.log_cursor();
    let ctx = UndoContext::new(env.config().verify_fileid, file.regid);

    loop {
        let page_lsn = buffer.page().lsn();
        if debug_pages {
            debug!(
                "rolling back page {} with lsn {} toward target {}",
                pgno, page_lsn, target_lsn
            );
        }

        if is_guaranteed_target(page_lsn, target_lsn, ckpt_commit_frontier, smallest_logfile) {
            break;
        }

        if page_lsn.is_zero() {
            return Err(Error::NonReconstructible(format!(
                "rollback of page {} reached a zero lsn before {}",
                pgno, target_lsn
            )));
        }

        let raw = cursor.get(page_lsn, CursorOp::Set)?;
        let record = DecodedRecord::decode(&raw)?;
        if debug_pages {
            debug!("decoded {:?} record written by utxnid {}", record.rectype(), record.utxnid());
        }

        // the record must name this page; a mismatch is a dispatch bug
        record.prior_lsn_for(pgno)?;

        // a transaction absent from the commit map is still in progress,
        // so its edits are invisible to every snapshot; one that committed
        // at or before the target is visible and stays
        match env.commit_map().get(record.utxnid()) {
            Err(e) if e.is_not_found() => break,
            Err(e) => return Err(e),
            Ok(commit_lsn) if commit_lsn <= target_lsn => break,
            Ok(_) => {}
        }

        undo::undo(&record, buffer.page_mut(), &ctx)?;
    }

    env.cache().put(file.id, pgno, &buffer, target_lsn)?;
    Ok(PageHandle::Owned(buffer))
}

/// Release a handle returned by `fget`. `flags` is reserved and must be
/// zero.
pub fn fput(env: &Env, handle: PageHandle, flags: u32) -> SnapResult {
    if flags != 0 {
        return Err(Error::fatal(format!(
            "fput flags are reserved and must be zero, got {:#x}",
            flags
        )));
    }

    match handle {
        PageHandle::Pinned(pin) => env.buffer_pool().snap_put(pin),
        PageHandle::Owned(buffer) => drop(buffer),
    }
    Ok(())
}
