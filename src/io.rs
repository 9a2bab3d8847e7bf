use std::{convert::TryInto, mem::size_of};

use crate::error::Error;

/// Byte-level codec used by the page and log-record formats. Everything is
/// little-endian.
pub trait Encodeable {
    fn encode(&self) -> Vec<u8>;
}

pub trait Decodeable: Sized {
    fn decode_from<R: std::io::Read>(reader: &mut R) -> Result<Self, Error>;
}

pub fn read_into<T: Decodeable, R: std::io::Read>(reader: &mut R) -> Result<T, Error> {
    T::decode_from(reader)
}

pub fn read_exact<R: std::io::Read>(
    reader: &mut R,
    bytes_count: usize,
) -> Result<Vec<u8>, Error> {
    let mut buffer = vec![0u8; bytes_count];
    reader
        .read_exact(&mut buffer)
        .map_err(|_| Error::corrupt(format!("expect {} more bytes", bytes_count)))?;
    Ok(buffer)
}

/// Append-only byte buffer used to assemble a log record before it is handed
/// to the log store.
pub struct RecordWriter {
    buf: Vec<u8>,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn write<T: Encodeable>(&mut self, obj: &T) {
        self.buf.extend_from_slice(obj.encode().as_slice());
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for RecordWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// # Format
///
/// - 1 byte (0 for false, 1 for true)
impl Encodeable for bool {
    fn encode(&self) -> Vec<u8> {
        vec![*self as u8]
    }
}

impl Decodeable for bool {
    fn decode_from<R: std::io::Read>(reader: &mut R) -> Result<Self, Error> {
        Ok(u8::decode_from(reader)? == 1)
    }
}

/// # Format
///
/// - 4 bytes: payload size
/// - n bytes: payload
impl Encodeable for Vec<u8> {
    fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(4 + self.len());

        // write size
        let len = self.len() as u32;
        buffer.extend_from_slice(&len.to_le_bytes());

        // write payload
        buffer.extend_from_slice(self);

        buffer
    }
}

impl Decodeable for Vec<u8> {
    fn decode_from<R: std::io::Read>(reader: &mut R) -> Result<Self, Error> {
        // read size
        let size = u32::decode_from(reader)?;

        // read payload
        read_exact(reader, size as usize)
    }
}

macro_rules! impl_serialization {
    (for $($t:ty),+) => {
        $(
            impl Encodeable for $t {
                fn encode(&self) -> Vec<u8> {
                    self.to_le_bytes().to_vec()
                }
            }

            impl Decodeable for $t {
                fn decode_from<R: std::io::Read>(reader: &mut R) -> Result<Self, Error> {
                    let bytes = read_exact(reader, size_of::<Self>())?;
                    Ok(Self::from_le_bytes(bytes.try_into().unwrap()))
                }
            }
        )*
    }
}

impl_serialization!(for u8, u16, u32, u64, i8, i16, i32, i64);

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_scalar_round_trip() {
        let mut w = RecordWriter::new();
        w.write(&42u32);
        w.write(&(-7i32));
        w.write(&u64::MAX);

        let bytes = w.into_bytes();
        let mut reader = Cursor::new(bytes);
        assert_eq!(read_into::<u32, _>(&mut reader).unwrap(), 42);
        assert_eq!(read_into::<i32, _>(&mut reader).unwrap(), -7);
        assert_eq!(read_into::<u64, _>(&mut reader).unwrap(), u64::MAX);
    }

    #[test]
    fn test_bytes_round_trip() {
        let payload: Vec<u8> = vec![1, 2, 3, 4, 5];
        let encoded = payload.encode();
        assert_eq!(encoded.len(), 4 + payload.len());

        let mut reader = Cursor::new(encoded);
        let decoded: Vec<u8> = read_into(&mut reader).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_truncated_read_is_an_error() {
        let mut reader = Cursor::new(vec![0u8; 2]);
        assert!(read_into::<u32, _>(&mut reader).is_err());
    }
}
