pub mod buffer;

use std::{convert::TryInto, fmt};

use crate::{
    error::Error,
    lsn::Lsn,
    types::{PageNo, SnapResult},
};

pub use buffer::{BufferHeader, PageBuffer};

pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Size of the on-page header common to every page type.
pub const PAGE_HEADER_SIZE: usize = 26;

/// Page number of the per-file metadata page.
pub const META_PGNO: PageNo = 0;

/// "No page" marker in prev/next link fields.
pub const PGNO_INVALID: PageNo = 0;

// Header field offsets.
const OFF_LSN: usize = 0;
const OFF_PGNO: usize = 8;
const OFF_PREV_PGNO: usize = 12;
const OFF_NEXT_PGNO: usize = 16;
const OFF_ENTRIES: usize = 20;
const OFF_HF_OFFSET: usize = 22;
const OFF_LEVEL: usize = 24;
const OFF_TYPE: usize = 25;

// Metadata-page body offsets.
const OFF_META_FREE: usize = 26;
const OFF_META_LAST_PGNO: usize = 30;

/// Delete mark carried in the high bit of an item's type byte.
pub const ITEM_DELETE_MARK: u8 = 0x80;

/// Byte cost of an item beyond its payload: 2-byte length plus 1-byte type.
const ITEM_OVERHEAD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Invalid,
    /// Internal btree page.
    IBtree,
    /// Leaf btree page.
    LBtree,
    /// Leaf page of an off-page duplicate tree.
    LDup,
    Overflow,
    DbMeta,
}

impl PageType {
    pub fn to_u8(self) -> u8 {
        match self {
            PageType::Invalid => 0,
            PageType::IBtree => 3,
            PageType::LBtree => 5,
            PageType::Overflow => 7,
            PageType::DbMeta => 9,
            PageType::LDup => 13,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(PageType::Invalid),
            3 => Ok(PageType::IBtree),
            5 => Ok(PageType::LBtree),
            7 => Ok(PageType::Overflow),
            9 => Ok(PageType::DbMeta),
            13 => Ok(PageType::LDup),
            _ => Err(Error::fatal(format!("invalid page type: {}", value))),
        }
    }

    pub fn is_btree(self) -> bool {
        matches!(self, PageType::IBtree | PageType::LBtree | PageType::LDup)
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PageType::Invalid => write!(f, "INVALID"),
            PageType::IBtree => write!(f, "IBTREE"),
            PageType::LBtree => write!(f, "LBTREE"),
            PageType::LDup => write!(f, "LDUP"),
            PageType::Overflow => write!(f, "OVERFLOW"),
            PageType::DbMeta => write!(f, "DBMETA"),
        }
    }
}

/// A materialized page: one fixed-size byte buffer carrying its header at
/// well-known offsets and a slotted item area.
///
/// The slot index (`inp`) grows up from the end of the header; item bytes
/// grow down from the end of the page, with `hf_offset` marking the low
/// watermark of the item area. Undo handlers edit the image in place.
///
/// Item layout at a slot's offset: `len: u16 | type: u8 | payload[len]`.
///
/// Two page families reinterpret header fields: overflow pages keep their
/// reference count in the prev-link word and their data length in
/// `hf_offset`; the metadata page stores the free-list head and `last_pgno`
/// at the start of its body.
#[derive(Clone, PartialEq, Eq)]
pub struct PageImage {
    data: Vec<u8>,
}

impl PageImage {
    /// A zeroed page of the given size. `hf_offset` starts at the page end.
    pub fn new(page_size: usize) -> Self {
        assert!(
            page_size >= PAGE_HEADER_SIZE + 8 && page_size <= u16::MAX as usize,
            "unsupported page size: {}",
            page_size
        );
        let mut page = Self {
            data: vec![0; page_size],
        };
        page.set_hf_offset(page_size as u16);
        page
    }

    pub fn init(page_size: usize, pgno: PageNo, ptype: PageType, level: u8) -> Self {
        let mut page = Self::new(page_size);
        page.set_pgno(pgno);
        page.set_page_type(ptype);
        page.set_level(level);
        page
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, Error> {
        if data.len() < PAGE_HEADER_SIZE {
            return Err(Error::corrupt(format!(
                "page image of {} bytes is shorter than the header",
                data.len()
            )));
        }
        Ok(Self { data })
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Overwrite this image with another of the same size.
    pub fn copy_from(&mut self, other: &PageImage) {
        assert_eq!(self.data.len(), other.data.len());
        self.data.copy_from_slice(&other.data);
    }

    /// Wipe the page back to a freshly initialized state, keeping only its
    /// page number.
    pub fn reinit(&mut self, ptype: PageType, level: u8) {
        let pgno = self.pgno();
        let size = self.data.len();
        for byte in self.data.iter_mut() {
            *byte = 0;
        }
        self.set_pgno(pgno);
        self.set_hf_offset(size as u16);
        self.set_page_type(ptype);
        self.set_level(level);
    }

    pub fn header_bytes(&self) -> &[u8] {
        &self.data[..PAGE_HEADER_SIZE]
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.data[PAGE_HEADER_SIZE..]
    }

    /// Overwrite the header from saved bytes.
    pub fn restore_header(&mut self, bytes: &[u8]) -> SnapResult {
        if bytes.len() != PAGE_HEADER_SIZE {
            return Err(Error::corrupt(format!(
                "saved page header is {} bytes, expected {}",
                bytes.len(),
                PAGE_HEADER_SIZE
            )));
        }
        self.data[..PAGE_HEADER_SIZE].copy_from_slice(bytes);
        Ok(())
    }

    /// Overwrite the body from saved bytes, zero-filling any remainder.
    pub fn restore_body(&mut self, bytes: &[u8]) -> SnapResult {
        if bytes.len() > self.data.len() - PAGE_HEADER_SIZE {
            return Err(Error::corrupt(format!(
                "saved page body of {} bytes does not fit a {}-byte page",
                bytes.len(),
                self.data.len()
            )));
        }
        for byte in self.data[PAGE_HEADER_SIZE..].iter_mut() {
            *byte = 0;
        }
        self.data[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Header accessors
    // ------------------------------------------------------------------

    fn get_u32(&self, off: usize) -> u32 {
        u32::from_le_bytes(self.data[off..off + 4].try_into().unwrap())
    }

    fn set_u32(&mut self, off: usize, value: u32) {
        self.data[off..off + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn get_u16(&self, off: usize) -> u16 {
        u16::from_le_bytes(self.data[off..off + 2].try_into().unwrap())
    }

    fn set_u16(&mut self, off: usize, value: u16) {
        self.data[off..off + 2].copy_from_slice(&value.to_le_bytes());
    }

    pub fn lsn(&self) -> Lsn {
        Lsn::new(self.get_u32(OFF_LSN), self.get_u32(OFF_LSN + 4))
    }

    pub fn set_lsn(&mut self, lsn: Lsn) {
        self.set_u32(OFF_LSN, lsn.file);
        self.set_u32(OFF_LSN + 4, lsn.offset);
    }

    pub fn pgno(&self) -> PageNo {
        self.get_u32(OFF_PGNO)
    }

    pub fn set_pgno(&mut self, pgno: PageNo) {
        self.set_u32(OFF_PGNO, pgno);
    }

    pub fn prev_pgno(&self) -> PageNo {
        self.get_u32(OFF_PREV_PGNO)
    }

    pub fn set_prev_pgno(&mut self, pgno: PageNo) {
        self.set_u32(OFF_PREV_PGNO, pgno);
    }

    pub fn next_pgno(&self) -> PageNo {
        self.get_u32(OFF_NEXT_PGNO)
    }

    pub fn set_next_pgno(&mut self, pgno: PageNo) {
        self.set_u32(OFF_NEXT_PGNO, pgno);
    }

    pub fn entries(&self) -> usize {
        self.get_u16(OFF_ENTRIES) as usize
    }

    fn set_entries(&mut self, entries: usize) {
        self.set_u16(OFF_ENTRIES, entries as u16);
    }

    pub fn hf_offset(&self) -> usize {
        self.get_u16(OFF_HF_OFFSET) as usize
    }

    fn set_hf_offset(&mut self, offset: u16) {
        self.set_u16(OFF_HF_OFFSET, offset);
    }

    pub fn level(&self) -> u8 {
        self.data[OFF_LEVEL]
    }

    pub fn set_level(&mut self, level: u8) {
        self.data[OFF_LEVEL] = level;
    }

    pub fn page_type(&self) -> Result<PageType, Error> {
        PageType::from_u8(self.data[OFF_TYPE])
    }

    pub fn set_page_type(&mut self, ptype: PageType) {
        self.data[OFF_TYPE] = ptype.to_u8();
    }

    // ------------------------------------------------------------------
    // Slotted item area
    // ------------------------------------------------------------------

    fn slot_pos(indx: usize) -> usize {
        PAGE_HEADER_SIZE + 2 * indx
    }

    fn slot(&self, indx: usize) -> usize {
        self.get_u16(Self::slot_pos(indx)) as usize
    }

    fn set_slot(&mut self, indx: usize, offset: usize) {
        self.set_u16(Self::slot_pos(indx), offset as u16);
    }

    fn item_size_at(&self, offset: usize) -> usize {
        ITEM_OVERHEAD + self.get_u16(offset) as usize
    }

    fn free_space(&self) -> usize {
        self.hf_offset() - (PAGE_HEADER_SIZE + 2 * self.entries())
    }

    fn check_index(&self, indx: usize) -> SnapResult {
        if indx >= self.entries() {
            return Err(Error::fatal(format!(
                "item index {} out of range on page {} with {} entries",
                indx,
                self.pgno(),
                self.entries()
            )));
        }
        Ok(())
    }

    /// Borrow item `indx` as (type byte, payload).
    pub fn item(&self, indx: usize) -> Result<(u8, &[u8]), Error> {
        self.check_index(indx)?;
        let off = self.slot(indx);
        let len = self.get_u16(off) as usize;
        let typ = self.data[off + 2];
        Ok((typ, &self.data[off + ITEM_OVERHEAD..off + ITEM_OVERHEAD + len]))
    }

    /// Place a new item at slot `indx`, shifting later slots right. The
    /// payload lands at the new high-free watermark.
    pub fn insert_item(&mut self, indx: usize, typ: u8, payload: &[u8]) -> SnapResult {
        let entries = self.entries();
        if indx > entries {
            return Err(Error::fatal(format!(
                "insert index {} out of range on page {} with {} entries",
                indx,
                self.pgno(),
                entries
            )));
        }

        let item_size = ITEM_OVERHEAD + payload.len();
        if item_size + 2 > self.free_space() {
            return Err(Error::fatal(format!(
                "page {} is full: {} bytes needed, {} free",
                self.pgno(),
                item_size + 2,
                self.free_space()
            )));
        }

        // write the item below the current watermark
        let new_hf = self.hf_offset() - item_size;
        self.set_u16(new_hf, payload.len() as u16);
        self.data[new_hf + 2] = typ;
        self.data[new_hf + ITEM_OVERHEAD..new_hf + item_size].copy_from_slice(payload);

        // open the slot
        let start = Self::slot_pos(indx);
        let end = Self::slot_pos(entries);
        self.data.copy_within(start..end, start + 2);
        self.set_slot(indx, new_hf);

        self.set_entries(entries + 1);
        self.set_hf_offset(new_hf as u16);
        Ok(())
    }

    /// Remove the item at slot `indx` and compact the item area, the exact
    /// inverse of `insert_item`.
    pub fn delete_item(&mut self, indx: usize) -> SnapResult {
        self.check_index(indx)?;

        let off = self.slot(indx);
        let size = self.item_size_at(off);
        let hf = self.hf_offset();

        // close the hole: slide the item area below `off` up by `size`
        self.data.copy_within(hf..off, hf + size);

        let entries = self.entries();
        for j in 0..entries {
            if j != indx && self.slot(j) < off {
                let moved = self.slot(j) + size;
                self.set_slot(j, moved);
            }
        }

        // close the slot
        let start = Self::slot_pos(indx + 1);
        let end = Self::slot_pos(entries);
        self.data.copy_within(start..end, start - 2);

        self.set_entries(entries - 1);
        self.set_hf_offset((hf + size) as u16);
        Ok(())
    }

    /// Replace the item at slot `indx`. Same-size replacements are done in
    /// place; otherwise the item is deleted and re-inserted.
    pub fn replace_item(&mut self, indx: usize, typ: u8, payload: &[u8]) -> SnapResult {
        self.check_index(indx)?;

        let off = self.slot(indx);
        let old_len = self.get_u16(off) as usize;
        if old_len == payload.len() {
            self.data[off + 2] = typ;
            self.data[off + ITEM_OVERHEAD..off + ITEM_OVERHEAD + payload.len()]
                .copy_from_slice(payload);
            return Ok(());
        }

        self.delete_item(indx)?;
        self.insert_item(indx, typ, payload)
    }

    /// Duplicate the slot at `indx_copy` into a new slot opened at `indx`,
    /// without touching the item area. `indx_copy` names a slot position in
    /// the post-shift index.
    pub fn dup_slot(&mut self, indx: usize, indx_copy: usize) -> SnapResult {
        let entries = self.entries();
        if indx > entries || indx_copy > entries {
            return Err(Error::fatal(format!(
                "slot dup {} <- {} out of range on page {} with {} entries",
                indx,
                indx_copy,
                self.pgno(),
                entries
            )));
        }
        if 2 > self.free_space() {
            return Err(Error::fatal(format!("page {} slot index is full", self.pgno())));
        }

        let start = Self::slot_pos(indx);
        let end = Self::slot_pos(entries);
        self.data.copy_within(start..end, start + 2);
        self.set_entries(entries + 1);

        let src = self.slot(indx_copy);
        self.set_slot(indx, src);
        Ok(())
    }

    /// Close the slot at `indx` without touching the item area, the inverse
    /// of `dup_slot`.
    pub fn remove_slot(&mut self, indx: usize) -> SnapResult {
        self.check_index(indx)?;

        let entries = self.entries();
        let start = Self::slot_pos(indx + 1);
        let end = Self::slot_pos(entries);
        self.data.copy_within(start..end, start - 2);
        self.set_entries(entries - 1);
        Ok(())
    }

    pub fn is_deleted(&self, indx: usize) -> Result<bool, Error> {
        let (typ, _) = self.item(indx)?;
        Ok(typ & ITEM_DELETE_MARK != 0)
    }

    pub fn set_delete_mark(&mut self, indx: usize, deleted: bool) -> SnapResult {
        self.check_index(indx)?;
        let off = self.slot(indx);
        if deleted {
            self.data[off + 2] |= ITEM_DELETE_MARK;
        } else {
            self.data[off + 2] &= !ITEM_DELETE_MARK;
        }
        Ok(())
    }

    /// Drop every item, leaving the rest of the header untouched.
    pub fn clear_items(&mut self) {
        let size = self.data.len();
        self.set_entries(0);
        self.set_hf_offset(size as u16);
    }

    // ------------------------------------------------------------------
    // Internal-page entries
    // ------------------------------------------------------------------

    /// Internal-page item payload layout: `child_pgno: u32 | nrecs: u32 |
    /// key bytes`.
    pub fn internal_entry_count(&self, indx: usize) -> Result<u32, Error> {
        self.check_index(indx)?;
        let off = self.slot(indx);
        Ok(self.get_u32(off + ITEM_OVERHEAD + 4))
    }

    pub fn adjust_internal_entry_count(&mut self, indx: usize, delta: i32) -> SnapResult {
        self.check_index(indx)?;
        let off = self.slot(indx);
        let count = self.get_u32(off + ITEM_OVERHEAD + 4);
        let adjusted = (count as i64 + delta as i64) as u32;
        self.set_u32(off + ITEM_OVERHEAD + 4, adjusted);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Metadata-page view
    // ------------------------------------------------------------------

    pub fn meta_free(&self) -> PageNo {
        self.get_u32(OFF_META_FREE)
    }

    pub fn set_meta_free(&mut self, pgno: PageNo) {
        self.set_u32(OFF_META_FREE, pgno);
    }

    pub fn meta_last_pgno(&self) -> PageNo {
        self.get_u32(OFF_META_LAST_PGNO)
    }

    pub fn set_meta_last_pgno(&mut self, pgno: PageNo) {
        self.set_u32(OFF_META_LAST_PGNO, pgno);
    }

    // ------------------------------------------------------------------
    // Overflow-page view
    // ------------------------------------------------------------------

    /// Overflow pages keep their reference count in the prev-link word.
    pub fn ov_ref(&self) -> u32 {
        self.get_u32(OFF_PREV_PGNO)
    }

    pub fn set_ov_ref(&mut self, count: u32) {
        self.set_u32(OFF_PREV_PGNO, count);
    }

    /// Overflow pages keep their data length in the `hf_offset` word and
    /// their bytes at the start of the body.
    pub fn ov_data(&self) -> &[u8] {
        let len = self.get_u16(OFF_HF_OFFSET) as usize;
        &self.data[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + len]
    }

    pub fn set_ov_data(&mut self, bytes: &[u8]) {
        self.set_u16(OFF_HF_OFFSET, bytes.len() as u16);
        self.data[PAGE_HEADER_SIZE..PAGE_HEADER_SIZE + bytes.len()].copy_from_slice(bytes);
    }
}

impl fmt::Debug for PageImage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "page {{ pgno: {}, lsn: {}, type: {:?}, entries: {} }}",
            self.pgno(),
            self.lsn(),
            self.data[OFF_TYPE],
            self.entries()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_SIZE: usize = 512;

    fn leaf(pgno: PageNo) -> PageImage {
        PageImage::init(PAGE_SIZE, pgno, PageType::LBtree, 0)
    }

    #[test]
    fn test_header_round_trip() {
        let mut page = leaf(9);
        page.set_lsn(Lsn::new(3, 200));
        page.set_prev_pgno(8);
        page.set_next_pgno(10);

        assert_eq!(page.pgno(), 9);
        assert_eq!(page.lsn(), Lsn::new(3, 200));
        assert_eq!(page.prev_pgno(), 8);
        assert_eq!(page.next_pgno(), 10);
        assert_eq!(page.page_type().unwrap(), PageType::LBtree);
        assert_eq!(page.entries(), 0);
    }

    #[test]
    fn test_insert_then_delete_restores_image() {
        let mut page = leaf(1);
        page.insert_item(0, 1, b"alpha").unwrap();
        page.insert_item(1, 1, b"bravo").unwrap();
        let before = page.clone();

        page.insert_item(1, 1, b"inserted").unwrap();
        assert_eq!(page.entries(), 3);
        assert_eq!(page.item(1).unwrap().1, b"inserted");

        page.delete_item(1).unwrap();
        assert_eq!(page.as_bytes(), before.as_bytes());
    }

    #[test]
    fn test_delete_compacts_lower_items() {
        let mut page = leaf(1);
        page.insert_item(0, 1, b"first").unwrap();
        page.insert_item(1, 1, b"second").unwrap();
        page.insert_item(2, 1, b"third").unwrap();

        // deleting the middle item must leave the others readable
        page.delete_item(1).unwrap();
        assert_eq!(page.entries(), 2);
        assert_eq!(page.item(0).unwrap().1, b"first");
        assert_eq!(page.item(1).unwrap().1, b"third");

        // watermark reclaimed the deleted bytes
        assert_eq!(
            page.hf_offset(),
            PAGE_SIZE - 2 * (ITEM_OVERHEAD + 5)
        );
    }

    #[test]
    fn test_replace_item_both_paths() {
        let mut page = leaf(1);
        page.insert_item(0, 1, b"aaaa").unwrap();

        // same-size path
        page.replace_item(0, 1, b"bbbb").unwrap();
        assert_eq!(page.item(0).unwrap().1, b"bbbb");

        // resize path
        page.replace_item(0, 1, b"cccccccc").unwrap();
        assert_eq!(page.item(0).unwrap().1, b"cccccccc");
        assert_eq!(page.entries(), 1);
    }

    #[test]
    fn test_dup_and_remove_slot_do_not_touch_items() {
        let mut page = leaf(1);
        page.insert_item(0, 1, b"shared").unwrap();
        let hf = page.hf_offset();

        page.dup_slot(1, 0).unwrap();
        assert_eq!(page.entries(), 2);
        assert_eq!(page.hf_offset(), hf);
        assert_eq!(page.item(1).unwrap().1, b"shared");

        page.remove_slot(1).unwrap();
        assert_eq!(page.entries(), 1);
        assert_eq!(page.hf_offset(), hf);
        assert_eq!(page.item(0).unwrap().1, b"shared");
    }

    #[test]
    fn test_delete_mark() {
        let mut page = leaf(1);
        page.insert_item(0, 1, b"row").unwrap();
        assert!(!page.is_deleted(0).unwrap());

        page.set_delete_mark(0, true).unwrap();
        assert!(page.is_deleted(0).unwrap());
        // payload survives the mark
        assert_eq!(page.item(0).unwrap().1, b"row");

        page.set_delete_mark(0, false).unwrap();
        assert!(!page.is_deleted(0).unwrap());
    }

    #[test]
    fn test_internal_entry_count_adjust() {
        let mut page = PageImage::init(PAGE_SIZE, 4, PageType::IBtree, 1);
        let mut payload = Vec::new();
        payload.extend_from_slice(&7u32.to_le_bytes()); // child pgno
        payload.extend_from_slice(&40u32.to_le_bytes()); // nrecs
        payload.extend_from_slice(b"key");
        page.insert_item(0, 1, &payload).unwrap();

        assert_eq!(page.internal_entry_count(0).unwrap(), 40);
        page.adjust_internal_entry_count(0, -3).unwrap();
        assert_eq!(page.internal_entry_count(0).unwrap(), 37);
    }

    #[test]
    fn test_meta_view() {
        let mut meta = PageImage::init(PAGE_SIZE, META_PGNO, PageType::DbMeta, 0);
        meta.set_meta_free(17);
        meta.set_meta_last_pgno(90);
        assert_eq!(meta.meta_free(), 17);
        assert_eq!(meta.meta_last_pgno(), 90);
    }

    #[test]
    fn test_overflow_view() {
        let mut ov = PageImage::init(PAGE_SIZE, 6, PageType::Overflow, 0);
        ov.set_ov_ref(2);
        ov.set_ov_data(b"big record bytes");
        ov.set_next_pgno(7);

        assert_eq!(ov.ov_ref(), 2);
        assert_eq!(ov.ov_data(), b"big record bytes");
        assert_eq!(ov.next_pgno(), 7);
    }

    #[test]
    fn test_random_edit_stack_unwinds_byte_exact() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut page = leaf(1);
        page.insert_item(0, 1, b"base").unwrap();
        let before = page.clone();

        // a stack of random inserts, unwound in reverse order, must leave
        // the image byte-identical (this is what chained undo relies on)
        let mut stack = Vec::new();
        for _ in 0..16 {
            let indx = rng.gen_range(0, page.entries() + 1);
            let len = rng.gen_range(1, 24);
            let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            page.insert_item(indx, 1, &payload).unwrap();
            stack.push(indx);
        }
        for indx in stack.into_iter().rev() {
            page.delete_item(indx).unwrap();
        }

        assert_eq!(page.as_bytes(), before.as_bytes());
    }

    #[test]
    fn test_page_full_is_an_error() {
        let mut page = leaf(1);
        let big = vec![0u8; PAGE_SIZE];
        assert!(page.insert_item(0, 1, &big).is_err());
    }

    #[test]
    fn test_out_of_range_index_is_fatal() {
        let page = leaf(1);
        assert!(page.item(0).is_err());
    }
}
