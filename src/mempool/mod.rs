//! In-memory pool of current page images, hash-bucketed with per-bucket
//! locks.
//!
//! The reconstruction engine takes *snapshot pins*: read-only pins that
//! promise not to mutate the frame and that tolerate concurrent writers by
//! waiting, with a bounded poll, for in-flight writers to drain before the
//! page is copied under the frame latch. Lock order is bucket lock, then
//! frame latch; both are released before a pin is returned.

use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex, RwLock,
    },
    thread,
    time::Duration,
};

use log::{debug, warn};

use crate::{
    error::Error,
    lsn::Lsn,
    page::PageBuffer,
    types::{FileId, PageNo, SnapResult},
    utils::HandyRwLock,
};

const BUCKET_COUNT: usize = 37;

pub const DEFAULT_DRAIN_RETRIES: u32 = 4;
pub const DEFAULT_DRAIN_POLL_MS: u64 = 250;

type PoolKey = (FileId, PageNo);

struct Frame {
    buf: RwLock<PageBuffer>,
    pins: AtomicU32,
    writers: AtomicU32,
}

pub struct BufferPool {
    buckets: Vec<Mutex<HashMap<PoolKey, Arc<Frame>>>>,
    drain_retries: u32,
    drain_poll: Duration,
}

impl BufferPool {
    pub fn new(drain_retries: u32, drain_poll: Duration) -> Self {
        let mut buckets = Vec::with_capacity(BUCKET_COUNT);
        for _ in 0..BUCKET_COUNT {
            buckets.push(Mutex::new(HashMap::new()));
        }
        Self {
            buckets,
            drain_retries,
            drain_poll,
        }
    }

    fn bucket(&self, key: &PoolKey) -> &Mutex<HashMap<PoolKey, Arc<Frame>>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.buckets[hasher.finish() as usize % BUCKET_COUNT]
    }

    /// Make a page current in the pool, replacing any existing frame.
    pub fn install(&self, file_id: FileId, buffer: PageBuffer) {
        let key = (file_id, buffer.header().pgno);
        let frame = Arc::new(Frame {
            buf: RwLock::new(buffer),
            pins: AtomicU32::new(0),
            writers: AtomicU32::new(0),
        });
        self.bucket(&key).lock().unwrap().insert(key, frame);
    }

    /// Take a snapshot-read pin on the current version of a page.
    ///
    /// Waits for in-flight writers to drain before returning; exhausting
    /// the retry budget is fatal to the caller's reconstruction.
    pub fn snap_get(&self, file_id: FileId, pgno: PageNo) -> Result<PageRef, Error> {
        let key = (file_id, pgno);
        let frame = {
            let bucket = self.bucket(&key).lock().unwrap();
            match bucket.get(&key) {
                Some(frame) => Arc::clone(frame),
                None => {
                    return Err(Error::IoError(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("page {} of file {} is not in the pool", pgno, file_id),
                    )))
                }
            }
        };

        let mut iteration = 0;
        while frame.writers.load(Ordering::Acquire) > 0 {
            if iteration == self.drain_retries {
                warn!(
                    "writers on page {} of file {} did not drain after {} polls",
                    pgno, file_id, iteration
                );
                return Err(Error::fatal(format!(
                    "snapshot pin on page {} timed out waiting for writers",
                    pgno
                )));
            }
            iteration += 1;
            thread::sleep(self.drain_poll);
        }

        frame.pins.fetch_add(1, Ordering::AcqRel);
        debug!("snapshot pin on page {} of file {}", pgno, file_id);
        Ok(PageRef { frame })
    }

    /// Release a snapshot pin.
    pub fn snap_put(&self, page_ref: PageRef) {
        page_ref.frame.pins.fetch_sub(1, Ordering::AcqRel);
    }

    /// Outstanding snapshot pins on a page; for resource accounting.
    pub fn pin_count(&self, file_id: FileId, pgno: PageNo) -> u32 {
        let key = (file_id, pgno);
        let bucket = self.bucket(&key).lock().unwrap();
        bucket
            .get(&key)
            .map(|frame| frame.pins.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Mark a writer as in flight on a page and hand back edit access.
    /// Snapshot pins block until `end_write`.
    pub fn begin_write(&self, file_id: FileId, pgno: PageNo) -> Result<WriteTicket, Error> {
        let key = (file_id, pgno);
        let frame = {
            let bucket = self.bucket(&key).lock().unwrap();
            match bucket.get(&key) {
                Some(frame) => Arc::clone(frame),
                None => {
                    return Err(Error::IoError(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("page {} of file {} is not in the pool", pgno, file_id),
                    )))
                }
            }
        };
        frame.writers.fetch_add(1, Ordering::AcqRel);
        Ok(WriteTicket { frame })
    }

    pub fn end_write(&self, ticket: WriteTicket) {
        ticket.frame.writers.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A held snapshot pin. The frame stays shared; accessors copy what they
/// need out from under the frame latch.
pub struct PageRef {
    frame: Arc<Frame>,
}

impl PageRef {
    pub fn lsn(&self) -> Lsn {
        self.frame.buf.rl().page().lsn()
    }

    pub fn pgno(&self) -> PageNo {
        self.frame.buf.rl().header().pgno
    }

    /// Copy the pinned page into a private buffer under the frame latch.
    pub fn copy_into(&self, out: &mut PageBuffer) {
        out.copy_from(&self.frame.buf.rl());
    }

    /// Clone the pinned page image out from under the frame latch.
    pub fn image(&self) -> crate::page::PageImage {
        self.frame.buf.rl().page().clone()
    }
}

/// An in-flight write marker, closed by `BufferPool::end_write`.
pub struct WriteTicket {
    frame: Arc<Frame>,
}

impl WriteTicket {
    /// Edit the current page image under the frame latch.
    pub fn update<F>(&self, edit: F) -> SnapResult
    where
        F: FnOnce(&mut PageBuffer) -> SnapResult,
    {
        edit(&mut self.frame.buf.wl())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PageImage, PageType};

    const PAGE_SIZE: usize = 256;

    fn pool() -> BufferPool {
        BufferPool::new(2, Duration::from_millis(5))
    }

    fn page(pgno: PageNo, lsn: Lsn) -> PageBuffer {
        let mut image = PageImage::init(PAGE_SIZE, pgno, PageType::LBtree, 0);
        image.set_lsn(lsn);
        PageBuffer::from_image(image)
    }

    #[test]
    fn test_pin_and_copy() {
        let pool = pool();
        let f = FileId::from_name("t");
        pool.install(f, page(3, Lsn::new(2, 20)));

        let pin = pool.snap_get(f, 3).unwrap();
        assert_eq!(pin.lsn(), Lsn::new(2, 20));
        assert_eq!(pin.pgno(), 3);
        assert_eq!(pool.pin_count(f, 3), 1);

        let mut copy = PageBuffer::alloc(PAGE_SIZE, 3);
        pin.copy_into(&mut copy);
        assert_eq!(copy.page().lsn(), Lsn::new(2, 20));

        pool.snap_put(pin);
        assert_eq!(pool.pin_count(f, 3), 0);
    }

    #[test]
    fn test_missing_page_is_io_error() {
        let pool = pool();
        let ret = pool.snap_get(FileId::from_name("t"), 3);
        assert!(matches!(ret, Err(Error::IoError(_))));
    }

    #[test]
    fn test_pin_waits_for_writer_drain() {
        let pool = BufferPool::new(100, Duration::from_millis(1));
        let f = FileId::from_name("t");
        pool.install(f, page(3, Lsn::new(2, 20)));

        let ticket = pool.begin_write(f, 3).unwrap();

        crossbeam::scope(|scope| {
            let handle = scope.spawn(|_| {
                let pin = pool.snap_get(f, 3).unwrap();
                let lsn = pin.lsn();
                pool.snap_put(pin);
                lsn
            });

            // the writer publishes its edit, then drains
            ticket
                .update(|buffer| {
                    buffer.page_mut().set_lsn(Lsn::new(2, 99));
                    Ok(())
                })
                .unwrap();
            std::thread::sleep(Duration::from_millis(10));
            pool.end_write(ticket);

            assert_eq!(handle.join().unwrap(), Lsn::new(2, 99));
        })
        .unwrap();
    }

    #[test]
    fn test_pin_times_out_when_writer_never_drains() {
        let pool = BufferPool::new(2, Duration::from_millis(1));
        let f = FileId::from_name("t");
        pool.install(f, page(3, Lsn::new(2, 20)));

        let _ticket = pool.begin_write(f, 3).unwrap();
        let ret = pool.snap_get(f, 3);
        assert!(matches!(ret, Err(Error::Fatal(_))));
    }
}
