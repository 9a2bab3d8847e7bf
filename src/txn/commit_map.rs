use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use itertools::Itertools;
use log::{debug, info, warn};

use crate::{
    error::Error,
    lsn::Lsn,
    types::{SnapResult, Utxnid},
};

/// Maps the utxnid of every uniquely-identified committed transaction to its
/// commit LSN.
///
/// A transaction with utxnid 0 is NOT uniquely identified (this is a dummy
/// id used for internal transactions) and is never added to the map.
///
/// Entries are reverse-indexed by the logfile their commit LSN falls in, so
/// that all transactions that committed in a reclaimed logfile can be
/// dropped in one sweep at a checkpoint boundary.
///
/// All operations are linearizable under the single map mutex.
pub struct CommitMap {
    inner: Mutex<CommitMapInner>,
}

struct CommitMapInner {
    transactions: HashMap<Utxnid, Lsn>,

    /// Reverse index: logfile number -> utxnids whose commit LSN falls in
    /// that logfile. An entry lives in exactly one bucket.
    logfile_buckets: HashMap<u32, HashSet<Utxnid>>,

    highest_checkpoint_lsn: Lsn,

    /// The largest commit LSN currently in the map. Monotone under
    /// insertion; callers that delete the entry holding it must supply a
    /// replacement through `set_modsnap_start_lsn`.
    modsnap_start_lsn: Lsn,

    /// Extremes of the populated buckets, -1 when the map is empty.
    smallest_logfile: i64,
    highest_logfile: i64,
}

impl CommitMap {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CommitMapInner {
                transactions: HashMap::new(),
                logfile_buckets: HashMap::new(),
                highest_checkpoint_lsn: Lsn::ZERO,
                modsnap_start_lsn: Lsn::ZERO,
                smallest_logfile: -1,
                highest_logfile: -1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<CommitMapInner> {
        self.inner.lock().unwrap()
    }

    /// Record that `utxnid` committed at `commit_lsn`. A zero utxnid, a zero
    /// commit LSN or an already-present entry makes this a no-op.
    pub fn add(&self, utxnid: Utxnid, commit_lsn: Lsn) -> SnapResult {
        self.lock().add_nolock(utxnid, commit_lsn)
    }

    /// Delete one transaction. Fails with `NotFound` when the entry is
    /// absent; leaves no side effects in that case.
    ///
    /// If this deletes the transaction with the highest commit LSN, it is
    /// the caller's responsibility to follow up with
    /// `set_modsnap_start_lsn` carrying the next highest commit LSN.
    pub fn remove(&self, utxnid: Utxnid) -> SnapResult {
        self.lock().remove_nolock(utxnid, true)
    }

    /// Commit LSN of `utxnid`, or `NotFound` when the transaction is absent
    /// (still in progress, or already reclaimed).
    pub fn get(&self, utxnid: Utxnid) -> Result<Lsn, Error> {
        self.lock()
            .transactions
            .get(&utxnid)
            .copied()
            .ok_or(Error::NotFound)
    }

    /// Drop every transaction that committed in `logfile`, then drop the
    /// bucket itself. One mutex acquisition for the whole sweep.
    ///
    /// The caller contract on the highest commit LSN is the same as for
    /// `remove`.
    pub fn delete_logfile_txns(&self, logfile: u32) -> SnapResult {
        let mut inner = self.lock();
        debug!("deleting commit-map entries of logfile {}", logfile);

        let bucket = match inner.logfile_buckets.get(&logfile) {
            Some(bucket) => bucket.clone(),
            None => return Err(Error::NotFound),
        };

        for utxnid in bucket {
            // the bucket itself goes away below; skip per-entry unlinking
            inner.remove_nolock(utxnid, false)?;
        }
        inner.delete_logfile_bucket(logfile);

        Ok(())
    }

    pub fn get_highest_checkpoint_lsn(&self) -> Lsn {
        self.lock().highest_checkpoint_lsn
    }

    pub fn set_highest_checkpoint_lsn(&self, lsn: Lsn) {
        self.lock().highest_checkpoint_lsn = lsn;
    }

    pub fn get_modsnap_start_lsn(&self) -> Lsn {
        self.lock().modsnap_start_lsn
    }

    pub fn set_modsnap_start_lsn(&self, lsn: Lsn) {
        self.lock().modsnap_start_lsn = lsn;
    }

    /// Smallest logfile with any committed transaction, or -1. The
    /// reconstruction loop reads this once per `fget` under the map mutex
    /// to guard against concurrent reclamation.
    pub fn smallest_logfile(&self) -> i64 {
        self.lock().smallest_logfile
    }

    pub fn highest_logfile(&self) -> i64 {
        self.lock().highest_logfile
    }

    pub fn len(&self) -> usize {
        self.lock().transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().transactions.is_empty()
    }

    /// Log the map's global state, one line per field group.
    pub fn print_info(&self) {
        let inner = self.lock();
        info!(
            "modsnap start lsn: {}; highest checkpoint lsn: {}; highest logfile: {}; smallest logfile: {}",
            inner.modsnap_start_lsn,
            inner.highest_checkpoint_lsn,
            inner.highest_logfile,
            inner.smallest_logfile
        );
        for file_num in inner.logfile_buckets.keys().sorted() {
            info!(
                "logfile {}: {} committed transactions",
                file_num,
                inner.logfile_buckets[file_num].len()
            );
        }
    }

    #[cfg(test)]
    fn bucket_of(&self, utxnid: Utxnid) -> Option<u32> {
        let inner = self.lock();
        inner
            .logfile_buckets
            .iter()
            .find(|(_, bucket)| bucket.contains(&utxnid))
            .map(|(file_num, _)| *file_num)
    }
}

impl Default for CommitMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitMapInner {
    fn add_nolock(&mut self, utxnid: Utxnid, commit_lsn: Lsn) -> SnapResult {
        debug!(
            "trying to add utxnid {} commit lsn {} to the map",
            utxnid, commit_lsn
        );

        if utxnid == 0 || commit_lsn.is_zero() {
            debug!("transaction is not eligible to be added to the map");
            return Ok(());
        }

        if self.transactions.contains_key(&utxnid) {
            debug!("transaction already exists in the map, not adding it again");
            return Ok(());
        }

        if !self.logfile_buckets.contains_key(&commit_lsn.file) {
            self.logfile_buckets
                .insert(commit_lsn.file, HashSet::new());

            if (commit_lsn.file as i64) < self.smallest_logfile || self.smallest_logfile == -1 {
                self.smallest_logfile = commit_lsn.file as i64;
            }
        }

        if self.modsnap_start_lsn <= commit_lsn {
            self.modsnap_start_lsn = commit_lsn;
            self.highest_logfile = commit_lsn.file as i64;
        }

        self.transactions.insert(utxnid, commit_lsn);
        self.logfile_buckets
            .get_mut(&commit_lsn.file)
            .unwrap()
            .insert(utxnid);

        Ok(())
    }

    fn remove_nolock(&mut self, utxnid: Utxnid, unlink_from_bucket: bool) -> SnapResult {
        debug!("deleting utxnid {}", utxnid);

        let commit_lsn = match self.transactions.get(&utxnid) {
            Some(lsn) => *lsn,
            None => return Err(Error::NotFound),
        };

        if unlink_from_bucket {
            let emptied = {
                let bucket =
                    self.logfile_buckets
                        .get_mut(&commit_lsn.file)
                        .ok_or_else(|| {
                            Error::fatal(format!(
                                "no logfile bucket {} for utxnid {}",
                                commit_lsn.file, utxnid
                            ))
                        })?;

                if !bucket.remove(&utxnid) {
                    return Err(Error::fatal(format!(
                        "utxnid {} missing from logfile bucket {}",
                        utxnid, commit_lsn.file
                    )));
                }
                bucket.is_empty()
            };

            if emptied {
                self.delete_logfile_bucket(commit_lsn.file);
            }
        } else if !self.logfile_buckets.contains_key(&commit_lsn.file) {
            return Err(Error::fatal(format!(
                "no logfile bucket {} for utxnid {}",
                commit_lsn.file, utxnid
            )));
        }

        self.transactions.remove(&utxnid);
        Ok(())
    }

    /// Drop a (now unneeded) logfile bucket and shift the extremes past it.
    fn delete_logfile_bucket(&mut self, file_num: u32) {
        let del_log = file_num as i64;
        let i_am_highest = del_log == self.highest_logfile;
        let i_am_smallest = del_log == self.smallest_logfile;

        if i_am_highest && i_am_smallest {
            warn!("deleting the only logfile ({}) in the commit map", file_num);

            self.highest_logfile = -1;
            self.smallest_logfile = -1;
        } else if i_am_highest {
            warn!("deleting the highest logfile ({}) in the commit map", file_num);

            self.highest_logfile -= 1;
            while self.highest_logfile >= 0
                && !self
                    .logfile_buckets
                    .contains_key(&(self.highest_logfile as u32))
            {
                self.highest_logfile -= 1;
            }
        } else if i_am_smallest {
            self.smallest_logfile += 1;
            while self.smallest_logfile <= self.modsnap_start_lsn.file as i64
                && !self
                    .logfile_buckets
                    .contains_key(&(self.smallest_logfile as u32))
            {
                self.smallest_logfile += 1;
            }
        }

        self.logfile_buckets.remove(&file_num);
    }
}
