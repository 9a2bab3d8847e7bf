use std::{
    fmt,
    sync::{Arc, RwLock},
};

use crate::error::Error;

// Type alias, not a new type, cannot define methods on it
pub type Pod<T> = Arc<RwLock<T>>;

pub type SnapResult = Result<(), Error>;

/// Unique 64-bit transaction identifier. The value 0 is reserved for
/// internal transactions and never appears in the commit map.
pub type Utxnid = u64;

pub type PageNo = u32;

/// Small integer id a file gets when it is registered with the log;
/// used by the add/remove undo verification step.
pub type DbRegId = i32;

pub const FILE_ID_LEN: usize = 20;

/// Fixed-width unique file identifier, stable across opens of the same file.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub [u8; FILE_ID_LEN]);

impl FileId {
    /// Derive a deterministic id from a short name; the name bytes are
    /// repeated to fill the fixed width.
    pub fn from_name(name: &str) -> Self {
        let src = name.as_bytes();
        let mut id = [0u8; FILE_ID_LEN];
        if !src.is_empty() {
            for (i, slot) in id.iter_mut().enumerate() {
                *slot = src[i % src.len()];
            }
        }
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_id_from_name_is_deterministic() {
        assert_eq!(FileId::from_name("orders"), FileId::from_name("orders"));
        assert_ne!(FileId::from_name("orders"), FileId::from_name("lines"));
    }

    #[test]
    fn test_file_id_displays_as_hex() {
        let id = FileId([0xab; FILE_ID_LEN]);
        assert_eq!(format!("{}", id), "ab".repeat(FILE_ID_LEN));
    }
}
