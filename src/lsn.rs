use std::fmt;

use crate::{
    error::Error,
    io::{Decodeable, Encodeable},
};

/// Log sequence number: a totally ordered (logfile, byte offset) pair.
///
/// Two sentinel values exist. The *zero* LSN marks a position that was never
/// written. The *not-logged* LSN marks a page whose edits predate logging
/// discipline. Both order below every real LSN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lsn {
    pub file: u32,
    pub offset: u32,
}

impl Lsn {
    pub const ZERO: Lsn = Lsn { file: 0, offset: 0 };
    pub const NOT_LOGGED: Lsn = Lsn { file: 0, offset: 1 };

    pub fn new(file: u32, offset: u32) -> Self {
        Self { file, offset }
    }

    pub fn is_zero(&self) -> bool {
        *self == Lsn::ZERO
    }

    pub fn is_not_logged(&self) -> bool {
        *self == Lsn::NOT_LOGGED
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.offset)
    }
}

/// # Format
///
/// - 4 bytes: logfile number
/// - 4 bytes: byte offset
impl Encodeable for Lsn {
    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8);
        buf.extend_from_slice(&self.file.to_le_bytes());
        buf.extend_from_slice(&self.offset.to_le_bytes());
        buf
    }
}

impl Decodeable for Lsn {
    fn decode_from<R: std::io::Read>(reader: &mut R) -> Result<Self, Error> {
        let file = u32::decode_from(reader)?;
        let offset = u32::decode_from(reader)?;
        Ok(Self { file, offset })
    }
}
