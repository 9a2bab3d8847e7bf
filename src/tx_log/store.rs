use std::{
    convert::TryInto,
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    error::Error,
    lsn::Lsn,
    types::SnapResult,
};

/// Records larger than this are assumed to be framing corruption.
const MAX_RECORD_SIZE: u32 = 1 << 24;

fn logfile_name(file_num: u32) -> String {
    format!("log.{:010}", file_num)
}

/// Multi-file append log. Each record is framed as a 4-byte length followed
/// by the record bytes; an LSN names (logfile number, byte offset of the
/// frame). Logfile numbering starts at 1 so that the zero and not-logged
/// sentinels never collide with a real position.
///
/// The engine only reads the log; the append path exists so that commit
/// records and page edits can be written into a log the engine then
/// reconstructs from.
pub struct LogStore {
    dir: PathBuf,
    cur_file_num: u32,
    file: File,
    offset: u64,
}

impl LogStore {
    /// Start a fresh log in `dir`, beginning at logfile 1.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        fs::create_dir_all(&dir)?;
        let dir = dir.as_ref().to_path_buf();
        let file = Self::open_logfile(&dir, 1)?;
        Ok(Self {
            dir,
            cur_file_num: 1,
            file,
            offset: 0,
        })
    }

    /// Reopen an existing log directory, continuing after the highest
    /// logfile present.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();
        let mut highest = 0;
        for entry in fs::read_dir(&dir)? {
            let name = entry?.file_name();
            if let Some(num) = name
                .to_str()
                .and_then(|n| n.strip_prefix("log."))
                .and_then(|n| n.parse::<u32>().ok())
            {
                highest = highest.max(num);
            }
        }
        if highest == 0 {
            return Self::create(dir);
        }

        let mut file = Self::open_logfile(&dir, highest)?;
        let offset = file.seek(SeekFrom::End(0))?;
        Ok(Self {
            dir,
            cur_file_num: highest,
            file,
            offset,
        })
    }

    fn open_logfile(dir: &Path, file_num: u32) -> Result<File, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(dir.join(logfile_name(file_num)))?;
        Ok(file)
    }

    pub fn current_logfile(&self) -> u32 {
        self.cur_file_num
    }

    /// Append one record, returning the LSN of its frame.
    pub fn append(&mut self, record: &[u8]) -> Result<Lsn, Error> {
        let lsn = Lsn::new(self.cur_file_num, self.offset as u32);

        let len = record.len() as u32;
        self.file.write_all(&len.to_le_bytes())?;
        self.file.write_all(record)?;
        self.offset += 4 + record.len() as u64;

        debug!("appended {} record bytes at {}", record.len(), lsn);
        Ok(lsn)
    }

    /// Close the current logfile and begin the next one. Returns the new
    /// logfile number.
    pub fn switch_file(&mut self) -> Result<u32, Error> {
        self.file.flush()?;
        self.cur_file_num += 1;
        self.file = Self::open_logfile(&self.dir, self.cur_file_num)?;
        self.offset = 0;
        Ok(self.cur_file_num)
    }

    /// Reclaim a logfile that is no longer needed for reconstruction.
    pub fn delete_logfile(&self, file_num: u32) -> SnapResult {
        if file_num == self.cur_file_num {
            return Err(Error::fatal(format!(
                "cannot reclaim the active logfile {}",
                file_num
            )));
        }

        let path = self.dir.join(logfile_name(file_num));
        if !path.exists() {
            return Err(Error::NotFound);
        }
        fs::remove_file(path)?;
        debug!("reclaimed logfile {}", file_num);
        Ok(())
    }

    /// Open a read cursor over the log. Cursors hold no lock and see every
    /// record that was fully appended before the read.
    pub fn cursor(&self) -> LogCursor {
        LogCursor::new(self.dir.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorOp {
    /// Positioned, exact read at the given LSN.
    Set,
}

/// Sequential log reader with positioned access. Keeps the most recently
/// read logfile open.
pub struct LogCursor {
    dir: PathBuf,
    open_file: Option<(u32, File)>,
}

impl LogCursor {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            open_file: None,
        }
    }

    /// Read the record framed at `lsn`.
    pub fn get(&mut self, lsn: Lsn, op: CursorOp) -> Result<Vec<u8>, Error> {
        let CursorOp::Set = op;

        if lsn.is_zero() || lsn.is_not_logged() {
            return Err(Error::corrupt(format!(
                "cursor positioned at sentinel lsn {}",
                lsn
            )));
        }

        let reuse = matches!(&self.open_file, Some((num, _)) if *num == lsn.file);
        if !reuse {
            let path = self.dir.join(logfile_name(lsn.file));
            let file = File::open(&path).map_err(|e| {
                Error::corrupt(format!("logfile {} unreadable: {}", lsn.file, e))
            })?;
            self.open_file = Some((lsn.file, file));
        }
        let (_, file) = self.open_file.as_mut().unwrap();

        file.seek(SeekFrom::Start(lsn.offset as u64))?;

        let mut len_bytes = [0u8; 4];
        file.read_exact(&mut len_bytes)
            .map_err(|_| Error::corrupt(format!("no record frame at {}", lsn)))?;
        let len = u32::from_le_bytes(len_bytes[..].try_into().unwrap());

        if len < 4 {
            return Err(Error::corrupt(format!(
                "record at {} is {} bytes, shorter than a type code",
                lsn, len
            )));
        }
        if len > MAX_RECORD_SIZE {
            return Err(Error::corrupt(format!(
                "record at {} claims {} bytes",
                lsn, len
            )));
        }

        let mut record = vec![0u8; len as usize];
        file.read_exact(&mut record)
            .map_err(|_| Error::corrupt(format!("truncated record at {}", lsn)))?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_append_and_positioned_read() {
        let dir = scratch();
        let mut store = LogStore::create(dir.path()).unwrap();

        let a = store.append(b"record-a").unwrap();
        let b = store.append(b"record-bb").unwrap();
        assert_eq!(a, Lsn::new(1, 0));
        assert_eq!(b, Lsn::new(1, 12));

        let mut cursor = store.cursor();
        assert_eq!(cursor.get(b, CursorOp::Set).unwrap(), b"record-bb");
        assert_eq!(cursor.get(a, CursorOp::Set).unwrap(), b"record-a");
    }

    #[test]
    fn test_switch_file_restarts_offsets() {
        let dir = scratch();
        let mut store = LogStore::create(dir.path()).unwrap();

        store.append(b"in file one").unwrap();
        assert_eq!(store.switch_file().unwrap(), 2);

        let lsn = store.append(b"in file two").unwrap();
        assert_eq!(lsn, Lsn::new(2, 0));

        let mut cursor = store.cursor();
        assert_eq!(cursor.get(lsn, CursorOp::Set).unwrap(), b"in file two");
    }

    #[test]
    fn test_reopen_continues_numbering() {
        let dir = scratch();
        let first;
        {
            let mut store = LogStore::create(dir.path()).unwrap();
            store.switch_file().unwrap();
            first = store.append(b"persisted").unwrap();
        }

        let mut store = LogStore::open(dir.path()).unwrap();
        assert_eq!(store.current_logfile(), 2);
        let second = store.append(b"appended later").unwrap();
        assert!(first < second);

        let mut cursor = store.cursor();
        assert_eq!(cursor.get(first, CursorOp::Set).unwrap(), b"persisted");
    }

    #[test]
    fn test_delete_logfile() {
        let dir = scratch();
        let mut store = LogStore::create(dir.path()).unwrap();
        let old = store.append(b"doomed").unwrap();
        store.switch_file().unwrap();

        store.delete_logfile(1).unwrap();
        assert!(store.delete_logfile(1).unwrap_err().is_not_found());

        let mut cursor = store.cursor();
        assert!(cursor.get(old, CursorOp::Set).is_err());
    }

    #[test]
    fn test_bad_position_is_log_corrupt() {
        let dir = scratch();
        let mut store = LogStore::create(dir.path()).unwrap();
        store.append(b"one").unwrap();

        let mut cursor = store.cursor();
        let ret = cursor.get(Lsn::new(1, 999), CursorOp::Set);
        assert!(matches!(ret, Err(Error::LogCorrupt(_))));

        let ret = cursor.get(Lsn::new(9, 0), CursorOp::Set);
        assert!(matches!(ret, Err(Error::LogCorrupt(_))));
    }

    #[test]
    fn test_sentinel_position_is_rejected() {
        let dir = scratch();
        let store = LogStore::create(dir.path()).unwrap();
        let mut cursor = store.cursor();
        assert!(cursor.get(Lsn::ZERO, CursorOp::Set).is_err());
        assert!(cursor.get(Lsn::NOT_LOGGED, CursorOp::Set).is_err());
    }
}
