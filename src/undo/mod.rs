//! Undo handlers, one per log-record family.
//!
//! Every handler has the same shape: given the post-image page and the
//! decoded record, mutate the page in place so that it becomes the
//! pre-image, and overwrite its page LSN with the record's prior LSN for
//! that page. Handlers never perform I/O.
//!
//! A record that names no page matching the supplied page is a broken
//! dispatch invariant (the caller promised a page this record edited) and
//! fails `Fatal`.

pub mod btree;
pub mod db;

use crate::{
    error::Error,
    page::PageImage,
    tx_log::{DecodedRecord, RecordBody},
    types::{DbRegId, PageNo, SnapResult},
};

/// Per-call state the handlers need beyond the record itself.
pub struct UndoContext {
    /// When set, the add/remove handler cross-checks the record's file id
    /// against the file the page was fetched from.
    pub verify_fileid: bool,
    pub fileid: DbRegId,
}

impl UndoContext {
    pub fn new(verify_fileid: bool, fileid: DbRegId) -> Self {
        Self {
            verify_fileid,
            fileid,
        }
    }
}

/// Route a decoded record to its family handler.
pub fn undo(record: &DecodedRecord, page: &mut PageImage, ctx: &UndoContext) -> SnapResult {
    match &record.body {
        RecordBody::AddRem(args) => db::undo_addrem(args, page, ctx),
        RecordBody::Big(args) => db::undo_big(args, page),
        RecordBody::OvRef(args) => db::undo_ovref(args, page),
        RecordBody::Relink(args) => db::undo_relink(args, page),
        RecordBody::PgAlloc(args) => db::undo_pg_alloc(args, page),
        RecordBody::PgFree(args) => db::undo_pg_free(args, page),
        RecordBody::PgFreedata(args) => db::undo_pg_freedata(args, page),
        RecordBody::Split(args) => btree::undo_split(args, page),
        RecordBody::RSplit(args) => btree::undo_rsplit(args, page),
        RecordBody::Repl(args) => btree::undo_repl(args, page),
        RecordBody::Adj(args) => btree::undo_adj(args, page),
        RecordBody::CAdjust(args) => btree::undo_cadjust(args, page),
        RecordBody::CDel(args) => btree::undo_cdel(args, page),
        RecordBody::Prefix(args) => btree::undo_prefix(args, page),
    }
}

pub(crate) fn unroutable(family: &str, pgno: PageNo) -> Error {
    Error::fatal(format!("{} record does not name page {}", family, pgno))
}
