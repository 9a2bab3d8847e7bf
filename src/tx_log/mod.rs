pub mod record;
pub mod store;

pub use record::{DecodedRecord, Opcode, RecType, RecordBody};
pub use store::{CursorOp, LogCursor, LogStore};
