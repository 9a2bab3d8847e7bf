use std::{error, fmt, io};

use backtrace::Backtrace;

/// Crate-wide error type.
///
/// `NotFound` is an expected miss (cache probe, commit-map lookup) and is
/// treated as a value by callers. Everything else aborts the operation that
/// produced it.
#[derive(Debug)]
pub enum Error {
    /// Expected miss; callers treat this as input to the next step.
    NotFound,

    /// The page cannot be rolled back to the requested snapshot (e.g. the
    /// rollback chain reached a zero LSN).
    NonReconstructible(String),

    /// The log returned bytes that do not frame a record.
    LogCorrupt(String),

    /// A record type code outside the closed dispatch table.
    UnknownRecord(u32),

    /// Allocation failure surfaced by a collaborator.
    OutOfMemory,

    /// An I/O failure from the log or the buffer pool.
    IoError(io::Error),

    /// A broken invariant: corruption or a dispatcher bug. Never swallowed.
    Fatal(FatalError),
}

pub struct FatalError {
    message: String,
    backtrace: Backtrace,
}

impl Error {
    /// Build a `Fatal` error, capturing the backtrace at the failure site.
    pub fn fatal(msg: impl Into<String>) -> Self {
        Error::Fatal(FatalError {
            message: msg.into(),
            backtrace: Backtrace::new(),
        })
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::LogCorrupt(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "not found"),
            Error::NonReconstructible(msg) => {
                write!(f, "page is not reconstructible: {}", msg)
            }
            Error::LogCorrupt(msg) => write!(f, "log corrupt: {}", msg),
            Error::UnknownRecord(rectype) => {
                write!(f, "unknown log record type: {}", rectype)
            }
            Error::OutOfMemory => write!(f, "out of memory"),
            Error::IoError(e) => write!(f, "io error: {}", e),
            Error::Fatal(e) => write!(f, "fatal: {}", e.message),
        }
    }
}

impl fmt::Debug for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n{:?}", self.message, self.backtrace)
    }
}

impl error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}
