use std::{convert::TryInto, io::Cursor};

use crate::{
    error::Error,
    io::{read_into, RecordWriter},
    lsn::Lsn,
    page::{META_PGNO, PGNO_INVALID},
    types::{DbRegId, PageNo, Utxnid},
};

/// Record type codes at or above this value carry a file id and a UTXNID in
/// their framing; subtracting it yields the canonical type code.
pub const FILEID_LOGGING_BASE: u32 = 1000;

/// Strip the file-id-logging bias from a raw type code. Returns the
/// canonical code and whether the record carries a UTXNID.
pub fn normalize_rectype(raw: u32) -> (u32, bool) {
    if raw >= FILEID_LOGGING_BASE {
        (raw - FILEID_LOGGING_BASE, true)
    } else {
        (raw, false)
    }
}

/// Closed table of log-record families the reconstruction loop understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecType {
    DbAddRem,
    DbBig,
    DbOvRef,
    DbRelink,
    DbPgAlloc,
    DbPgFree,
    DbPgFreedata,
    BamAdj,
    BamCAdjust,
    BamCDel,
    BamRepl,
    BamPrefix,
    BamSplit,
    BamRSplit,
}

impl RecType {
    pub fn to_u32(self) -> u32 {
        match self {
            RecType::DbAddRem => 41,
            RecType::DbBig => 43,
            RecType::DbOvRef => 44,
            RecType::DbRelink => 45,
            RecType::DbPgAlloc => 49,
            RecType::DbPgFree => 50,
            RecType::DbPgFreedata => 51,
            RecType::BamAdj => 55,
            RecType::BamCAdjust => 56,
            RecType::BamCDel => 57,
            RecType::BamRepl => 58,
            RecType::BamPrefix => 59,
            RecType::BamSplit => 62,
            RecType::BamRSplit => 63,
        }
    }

    pub fn from_u32(value: u32) -> Result<Self, Error> {
        match value {
            41 => Ok(RecType::DbAddRem),
            43 => Ok(RecType::DbBig),
            44 => Ok(RecType::DbOvRef),
            45 => Ok(RecType::DbRelink),
            49 => Ok(RecType::DbPgAlloc),
            50 => Ok(RecType::DbPgFree),
            51 => Ok(RecType::DbPgFreedata),
            55 => Ok(RecType::BamAdj),
            56 => Ok(RecType::BamCAdjust),
            57 => Ok(RecType::BamCDel),
            58 => Ok(RecType::BamRepl),
            59 => Ok(RecType::BamPrefix),
            62 => Ok(RecType::BamSplit),
            63 => Ok(RecType::BamRSplit),
            _ => Err(Error::UnknownRecord(value)),
        }
    }
}

/// Sub-operation discriminator shared by the add/remove, big-record and
/// relink families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    AddDup,
    RemDup,
    AddBig,
    RemBig,
    AddPage,
    RemPage,
}

impl Opcode {
    pub fn to_u32(self) -> u32 {
        match self {
            Opcode::AddDup => 1,
            Opcode::RemDup => 2,
            Opcode::AddBig => 3,
            Opcode::RemBig => 4,
            Opcode::AddPage => 5,
            Opcode::RemPage => 6,
        }
    }

    pub fn from_u32(value: u32) -> Result<Self, Error> {
        match value {
            1 => Ok(Opcode::AddDup),
            2 => Ok(Opcode::RemDup),
            3 => Ok(Opcode::AddBig),
            4 => Ok(Opcode::RemBig),
            5 => Ok(Opcode::AddPage),
            6 => Ok(Opcode::RemPage),
            _ => Err(Error::corrupt(format!("invalid opcode: {}", value))),
        }
    }

    pub fn is_remove(self) -> bool {
        self.to_u32() % 2 == 0
    }
}

// ----------------------------------------------------------------------
// Per-family payloads. Every LSN field is the named page's LSN before the
// logged edit, which is what the undo handler restores.
// ----------------------------------------------------------------------

/// Item added to / removed from a slot on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct AddRemArgs {
    pub opcode: Opcode,
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub indx: u32,
    pub item_type: u8,
    pub item: Vec<u8>,
    pub pagelsn: Lsn,
}

/// One overflow page added to or removed from a big-record chain.
#[derive(Debug, Clone, PartialEq)]
pub struct BigArgs {
    pub opcode: Opcode,
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub prev_pgno: PageNo,
    pub next_pgno: PageNo,
    pub pagelsn: Lsn,
    pub prevlsn: Lsn,
    pub nextlsn: Lsn,
    pub data: Vec<u8>,
}

/// Overflow-page reference count adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct OvRefArgs {
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub adjust: i32,
    pub lsn: Lsn,
}

/// Page linked into / unlinked from a sibling chain.
#[derive(Debug, Clone, PartialEq)]
pub struct RelinkArgs {
    pub opcode: Opcode,
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub lsn: Lsn,
    pub prev: PageNo,
    pub lsn_prev: Lsn,
    pub next: PageNo,
    pub lsn_next: Lsn,
}

/// Page popped off the free list.
#[derive(Debug, Clone, PartialEq)]
pub struct PgAllocArgs {
    pub fileid: DbRegId,
    pub meta_lsn: Lsn,
    pub page_lsn: Lsn,
    pub pgno: PageNo,
    pub ptype: u8,
    /// Free-list successor of the allocated page, which became the new
    /// free-list head.
    pub next: PageNo,
}

/// Page pushed onto the free list. `header` is the page header before the
/// free; `next` the free-list head it displaced.
#[derive(Debug, Clone, PartialEq)]
pub struct PgFreeArgs {
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub meta_lsn: Lsn,
    pub page_lsn: Lsn,
    pub header: Vec<u8>,
    pub next: PageNo,
}

/// Like `PgFreeArgs`, with the freed page's body preserved too.
#[derive(Debug, Clone, PartialEq)]
pub struct PgFreedataArgs {
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub meta_lsn: Lsn,
    pub page_lsn: Lsn,
    pub header: Vec<u8>,
    pub next: PageNo,
    pub data: Vec<u8>,
}

/// Btree page split. `pg` is the full pre-split image of the split page
/// (the old root for a root split, the left page otherwise). `root_pgno`
/// is `PGNO_INVALID` for a non-root split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitArgs {
    pub fileid: DbRegId,
    pub left: PageNo,
    pub llsn: Lsn,
    pub right: PageNo,
    pub rlsn: Lsn,
    pub npgno: PageNo,
    pub nlsn: Lsn,
    pub root_pgno: PageNo,
    pub pg: Vec<u8>,
}

/// Btree reverse split: the root absorbed its only child. `pgdbt` is the
/// absorbed child's full image, `rootent` the root's single internal entry
/// that pointed at it.
#[derive(Debug, Clone, PartialEq)]
pub struct RSplitArgs {
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub pgdbt: Vec<u8>,
    pub root_pgno: PageNo,
    pub nrec: u32,
    pub rootent_type: u8,
    pub rootent: Vec<u8>,
    pub rootlsn: Lsn,
}

/// Item replacement; `orig` is the complete prior item.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplArgs {
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub lsn: Lsn,
    pub indx: u32,
    pub isdeleted: bool,
    pub orig_type: u8,
    pub orig: Vec<u8>,
}

/// Slot-index shift made on behalf of a cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjArgs {
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub lsn: Lsn,
    pub indx: u32,
    pub indx_copy: u32,
    pub is_insert: bool,
}

/// Record-count adjustment of an internal-page entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CAdjustArgs {
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub lsn: Lsn,
    pub indx: u32,
    pub adjust: i32,
}

/// Cursor intent-to-delete mark.
#[derive(Debug, Clone, PartialEq)]
pub struct CDelArgs {
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub lsn: Lsn,
    pub indx: u32,
}

/// Prefix compression rewrote the item area; `saved` is the full prior
/// image.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixArgs {
    pub fileid: DbRegId,
    pub pgno: PageNo,
    pub pagelsn: Lsn,
    pub saved: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordBody {
    AddRem(AddRemArgs),
    Big(BigArgs),
    OvRef(OvRefArgs),
    Relink(RelinkArgs),
    PgAlloc(PgAllocArgs),
    PgFree(PgFreeArgs),
    PgFreedata(PgFreedataArgs),
    Split(SplitArgs),
    RSplit(RSplitArgs),
    Repl(ReplArgs),
    Adj(AdjArgs),
    CAdjust(CAdjustArgs),
    CDel(CDelArgs),
    Prefix(PrefixArgs),
}

impl RecordBody {
    pub fn rectype(&self) -> RecType {
        match self {
            RecordBody::AddRem(_) => RecType::DbAddRem,
            RecordBody::Big(_) => RecType::DbBig,
            RecordBody::OvRef(_) => RecType::DbOvRef,
            RecordBody::Relink(_) => RecType::DbRelink,
            RecordBody::PgAlloc(_) => RecType::DbPgAlloc,
            RecordBody::PgFree(_) => RecType::DbPgFree,
            RecordBody::PgFreedata(_) => RecType::DbPgFreedata,
            RecordBody::Split(_) => RecType::BamSplit,
            RecordBody::RSplit(_) => RecType::BamRSplit,
            RecordBody::Repl(_) => RecType::BamRepl,
            RecordBody::Adj(_) => RecType::BamAdj,
            RecordBody::CAdjust(_) => RecType::BamCAdjust,
            RecordBody::CDel(_) => RecType::BamCDel,
            RecordBody::Prefix(_) => RecType::BamPrefix,
        }
    }
}

/// Read the page LSN out of a saved full-page image.
pub fn lsn_of_image(bytes: &[u8]) -> Result<Lsn, Error> {
    if bytes.len() < 8 {
        return Err(Error::corrupt(format!(
            "saved page image of {} bytes has no lsn",
            bytes.len()
        )));
    }
    let file = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
    let offset = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    Ok(Lsn::new(file, offset))
}

/// A fully decoded log record: common framing plus the typed family
/// payload. Built once per loop iteration; the reconstruction loop matches
/// on the body instead of going through function pointers.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub txnid: u32,
    pub prev_lsn: Lsn,
    pub utxnid: Utxnid,
    pub body: RecordBody,
}

impl DecodedRecord {
    pub fn new(txnid: u32, prev_lsn: Lsn, utxnid: Utxnid, body: RecordBody) -> Self {
        Self {
            txnid,
            prev_lsn,
            utxnid,
            body,
        }
    }

    pub fn rectype(&self) -> RecType {
        self.body.rectype()
    }

    pub fn utxnid(&self) -> Utxnid {
        self.utxnid
    }

    /// Decode a raw record as handed back by the log cursor.
    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        if data.len() < 4 {
            return Err(Error::corrupt(format!(
                "record of {} bytes is shorter than a type code",
                data.len()
            )));
        }

        let mut reader = Cursor::new(data);
        let raw: u32 = read_into(&mut reader)?;
        let (canonical, utxnid_logged) = normalize_rectype(raw);
        if !utxnid_logged {
            return Err(Error::NonReconstructible(format!(
                "record type {} predates unique transaction-id logging",
                raw
            )));
        }
        let rectype = RecType::from_u32(canonical)?;

        let txnid: u32 = read_into(&mut reader)?;
        let prev_lsn: Lsn = read_into(&mut reader)?;
        let utxnid: Utxnid = read_into(&mut reader)?;

        let body = match rectype {
            RecType::DbAddRem => RecordBody::AddRem(AddRemArgs {
                opcode: Opcode::from_u32(read_into(&mut reader)?)?,
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                indx: read_into(&mut reader)?,
                item_type: read_into(&mut reader)?,
                item: read_into(&mut reader)?,
                pagelsn: read_into(&mut reader)?,
            }),
            RecType::DbBig => RecordBody::Big(BigArgs {
                opcode: Opcode::from_u32(read_into(&mut reader)?)?,
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                prev_pgno: read_into(&mut reader)?,
                next_pgno: read_into(&mut reader)?,
                pagelsn: read_into(&mut reader)?,
                prevlsn: read_into(&mut reader)?,
                nextlsn: read_into(&mut reader)?,
                data: read_into(&mut reader)?,
            }),
            RecType::DbOvRef => RecordBody::OvRef(OvRefArgs {
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                adjust: read_into(&mut reader)?,
                lsn: read_into(&mut reader)?,
            }),
            RecType::DbRelink => RecordBody::Relink(RelinkArgs {
                opcode: Opcode::from_u32(read_into(&mut reader)?)?,
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                lsn: read_into(&mut reader)?,
                prev: read_into(&mut reader)?,
                lsn_prev: read_into(&mut reader)?,
                next: read_into(&mut reader)?,
                lsn_next: read_into(&mut reader)?,
            }),
            RecType::DbPgAlloc => RecordBody::PgAlloc(PgAllocArgs {
                fileid: read_into(&mut reader)?,
                meta_lsn: read_into(&mut reader)?,
                page_lsn: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                ptype: read_into(&mut reader)?,
                next: read_into(&mut reader)?,
            }),
            RecType::DbPgFree => RecordBody::PgFree(PgFreeArgs {
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                meta_lsn: read_into(&mut reader)?,
                page_lsn: read_into(&mut reader)?,
                header: read_into(&mut reader)?,
                next: read_into(&mut reader)?,
            }),
            RecType::DbPgFreedata => RecordBody::PgFreedata(PgFreedataArgs {
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                meta_lsn: read_into(&mut reader)?,
                page_lsn: read_into(&mut reader)?,
                header: read_into(&mut reader)?,
                next: read_into(&mut reader)?,
                data: read_into(&mut reader)?,
            }),
            RecType::BamSplit => RecordBody::Split(SplitArgs {
                fileid: read_into(&mut reader)?,
                left: read_into(&mut reader)?,
                llsn: read_into(&mut reader)?,
                right: read_into(&mut reader)?,
                rlsn: read_into(&mut reader)?,
                npgno: read_into(&mut reader)?,
                nlsn: read_into(&mut reader)?,
                root_pgno: read_into(&mut reader)?,
                pg: read_into(&mut reader)?,
            }),
            RecType::BamRSplit => RecordBody::RSplit(RSplitArgs {
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                pgdbt: read_into(&mut reader)?,
                root_pgno: read_into(&mut reader)?,
                nrec: read_into(&mut reader)?,
                rootent_type: read_into(&mut reader)?,
                rootent: read_into(&mut reader)?,
                rootlsn: read_into(&mut reader)?,
            }),
            RecType::BamRepl => RecordBody::Repl(ReplArgs {
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                lsn: read_into(&mut reader)?,
                indx: read_into(&mut reader)?,
                isdeleted: read_into(&mut reader)?,
                orig_type: read_into(&mut reader)?,
                orig: read_into(&mut reader)?,
            }),
            RecType::BamAdj => RecordBody::Adj(AdjArgs {
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                lsn: read_into(&mut reader)?,
                indx: read_into(&mut reader)?,
                indx_copy: read_into(&mut reader)?,
                is_insert: read_into(&mut reader)?,
            }),
            RecType::BamCAdjust => RecordBody::CAdjust(CAdjustArgs {
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                lsn: read_into(&mut reader)?,
                indx: read_into(&mut reader)?,
                adjust: read_into(&mut reader)?,
            }),
            RecType::BamCDel => RecordBody::CDel(CDelArgs {
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                lsn: read_into(&mut reader)?,
                indx: read_into(&mut reader)?,
            }),
            RecType::BamPrefix => RecordBody::Prefix(PrefixArgs {
                fileid: read_into(&mut reader)?,
                pgno: read_into(&mut reader)?,
                pagelsn: read_into(&mut reader)?,
                saved: read_into(&mut reader)?,
            }),
        };

        Ok(Self {
            txnid,
            prev_lsn,
            utxnid,
            body,
        })
    }

    /// Encode this record for appending to the log; the exact inverse of
    /// `decode`.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = RecordWriter::new();
        w.write(&(self.rectype().to_u32() + FILEID_LOGGING_BASE));
        w.write(&self.txnid);
        w.write(&self.prev_lsn);
        w.write(&self.utxnid);

        match &self.body {
            RecordBody::AddRem(a) => {
                w.write(&a.opcode.to_u32());
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.indx);
                w.write(&a.item_type);
                w.write(&a.item);
                w.write(&a.pagelsn);
            }
            RecordBody::Big(a) => {
                w.write(&a.opcode.to_u32());
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.prev_pgno);
                w.write(&a.next_pgno);
                w.write(&a.pagelsn);
                w.write(&a.prevlsn);
                w.write(&a.nextlsn);
                w.write(&a.data);
            }
            RecordBody::OvRef(a) => {
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.adjust);
                w.write(&a.lsn);
            }
            RecordBody::Relink(a) => {
                w.write(&a.opcode.to_u32());
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.lsn);
                w.write(&a.prev);
                w.write(&a.lsn_prev);
                w.write(&a.next);
                w.write(&a.lsn_next);
            }
            RecordBody::PgAlloc(a) => {
                w.write(&a.fileid);
                w.write(&a.meta_lsn);
                w.write(&a.page_lsn);
                w.write(&a.pgno);
                w.write(&a.ptype);
                w.write(&a.next);
            }
            RecordBody::PgFree(a) => {
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.meta_lsn);
                w.write(&a.page_lsn);
                w.write(&a.header);
                w.write(&a.next);
            }
            RecordBody::PgFreedata(a) => {
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.meta_lsn);
                w.write(&a.page_lsn);
                w.write(&a.header);
                w.write(&a.next);
                w.write(&a.data);
            }
            RecordBody::Split(a) => {
                w.write(&a.fileid);
                w.write(&a.left);
                w.write(&a.llsn);
                w.write(&a.right);
                w.write(&a.rlsn);
                w.write(&a.npgno);
                w.write(&a.nlsn);
                w.write(&a.root_pgno);
                w.write(&a.pg);
            }
            RecordBody::RSplit(a) => {
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.pgdbt);
                w.write(&a.root_pgno);
                w.write(&a.nrec);
                w.write(&a.rootent_type);
                w.write(&a.rootent);
                w.write(&a.rootlsn);
            }
            RecordBody::Repl(a) => {
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.lsn);
                w.write(&a.indx);
                w.write(&a.isdeleted);
                w.write(&a.orig_type);
                w.write(&a.orig);
            }
            RecordBody::Adj(a) => {
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.lsn);
                w.write(&a.indx);
                w.write(&a.indx_copy);
                w.write(&a.is_insert);
            }
            RecordBody::CAdjust(a) => {
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.lsn);
                w.write(&a.indx);
                w.write(&a.adjust);
            }
            RecordBody::CDel(a) => {
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.lsn);
                w.write(&a.indx);
            }
            RecordBody::Prefix(a) => {
                w.write(&a.fileid);
                w.write(&a.pgno);
                w.write(&a.pagelsn);
                w.write(&a.saved);
            }
        }

        w.into_bytes()
    }

    /// The LSN the target page carried before the edit this record logs.
    /// Routing is by which of the pages named in the record matches; a
    /// record that names no matching page is a dispatch-invariant failure.
    pub fn prior_lsn_for(&self, pgno: PageNo) -> Result<Lsn, Error> {
        let found = match &self.body {
            RecordBody::AddRem(a) if pgno == a.pgno => Some(a.pagelsn),
            RecordBody::Big(a) => {
                if pgno == a.pgno {
                    Some(a.pagelsn)
                } else if pgno == a.prev_pgno && a.prev_pgno != PGNO_INVALID {
                    Some(a.prevlsn)
                } else if pgno == a.next_pgno && a.next_pgno != PGNO_INVALID {
                    Some(a.nextlsn)
                } else {
                    None
                }
            }
            RecordBody::OvRef(a) if pgno == a.pgno => Some(a.lsn),
            RecordBody::Relink(a) => {
                if pgno == a.pgno {
                    Some(a.lsn)
                } else if pgno == a.prev && a.prev != PGNO_INVALID {
                    Some(a.lsn_prev)
                } else if pgno == a.next && a.next != PGNO_INVALID {
                    Some(a.lsn_next)
                } else {
                    None
                }
            }
            RecordBody::PgAlloc(a) => {
                if pgno == a.pgno {
                    Some(a.page_lsn)
                } else if pgno == META_PGNO {
                    Some(a.meta_lsn)
                } else {
                    None
                }
            }
            RecordBody::PgFree(a) => {
                if pgno == a.pgno {
                    Some(a.page_lsn)
                } else if pgno == META_PGNO {
                    Some(a.meta_lsn)
                } else {
                    None
                }
            }
            RecordBody::PgFreedata(a) => {
                if pgno == a.pgno {
                    Some(a.page_lsn)
                } else if pgno == META_PGNO {
                    Some(a.meta_lsn)
                } else {
                    None
                }
            }
            RecordBody::Split(a) => {
                if pgno == a.left {
                    Some(a.llsn)
                } else if pgno == a.npgno && a.npgno != PGNO_INVALID {
                    Some(a.nlsn)
                } else if pgno == a.right {
                    Some(a.rlsn)
                } else if pgno == a.root_pgno && a.root_pgno != PGNO_INVALID {
                    Some(lsn_of_image(&a.pg)?)
                } else {
                    None
                }
            }
            RecordBody::RSplit(a) => {
                if pgno == a.pgno {
                    Some(lsn_of_image(&a.pgdbt)?)
                } else if pgno == a.root_pgno {
                    Some(a.rootlsn)
                } else {
                    None
                }
            }
            RecordBody::Repl(a) if pgno == a.pgno => Some(a.lsn),
            RecordBody::Adj(a) if pgno == a.pgno => Some(a.lsn),
            RecordBody::CAdjust(a) if pgno == a.pgno => Some(a.lsn),
            RecordBody::CDel(a) if pgno == a.pgno => Some(a.lsn),
            RecordBody::Prefix(a) if pgno == a.pgno => Some(a.pagelsn),
            _ => None,
        };

        found.ok_or_else(|| {
            Error::fatal(format!(
                "{:?} record does not name page {}",
                self.rectype(),
                pgno
            ))
        })
    }
}
