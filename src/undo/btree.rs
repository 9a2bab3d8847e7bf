//! Undo handlers for the btree record families: splits, reverse splits,
//! item replacement, cursor adjustments, count adjustments, cursor delete
//! marks, and prefix compression.

use super::unroutable;
use crate::{
    error::Error,
    page::{PageImage, PageType, PGNO_INVALID},
    tx_log::record::{AdjArgs, CAdjustArgs, CDelArgs, PrefixArgs, ReplArgs, RSplitArgs, SplitArgs},
    types::SnapResult,
};

/// Overwrite a page from a full image saved in a log record. The saved
/// image carries the page's prior LSN, so no separate LSN restore is
/// needed afterwards.
fn restore_saved_image(page: &mut PageImage, bytes: &[u8]) -> SnapResult {
    if bytes.len() != page.size() {
        return Err(Error::corrupt(format!(
            "saved page image is {} bytes, page is {}",
            bytes.len(),
            page.size()
        )));
    }
    let saved = PageImage::from_bytes(bytes.to_vec())?;
    page.copy_from(&saved);
    Ok(())
}

/// Invert a btree page split.
///
/// A root split names {root, left, right}: the root gets its saved
/// pre-split image back, and both children vanish. A non-root split names
/// {left, next, right}: the left page gets its saved image back, the old
/// right-sibling's back-link is repaired, and the new right page vanishes.
pub fn undo_split(args: &SplitArgs, page: &mut PageImage) -> SnapResult {
    let pgno = page.pgno();
    let rootsplit = args.root_pgno != PGNO_INVALID;

    if rootsplit {
        if pgno == args.root_pgno {
            restore_saved_image(page, &args.pg)?;
        } else if pgno == args.left {
            page.reinit(PageType::Invalid, 0);
            page.set_lsn(args.llsn);
        } else if pgno == args.right {
            page.reinit(PageType::Invalid, 0);
            page.set_lsn(args.rlsn);
        } else {
            return Err(unroutable("split(root)", pgno));
        }
    } else {
        if pgno == args.left {
            restore_saved_image(page, &args.pg)?;
        } else if pgno == args.npgno {
            page.set_prev_pgno(args.left);
            page.set_lsn(args.nlsn);
        } else if pgno == args.right {
            page.reinit(PageType::Invalid, 0);
            page.set_lsn(args.rlsn);
        } else {
            return Err(unroutable("split", pgno));
        }
    }

    Ok(())
}

/// Invert a reverse split. The shrunken (absorbed) page gets its saved
/// image back; the root goes back to holding the single entry that pointed
/// at it, one level above the absorbed child.
pub fn undo_rsplit(args: &RSplitArgs, page: &mut PageImage) -> SnapResult {
    let pgno = page.pgno();

    if pgno == args.pgno {
        restore_saved_image(page, &args.pgdbt)?;
    } else if pgno == args.root_pgno {
        let child_level = page.level();
        page.clear_items();
        page.set_page_type(PageType::IBtree);
        page.set_level(child_level + 1);
        page.insert_item(0, args.rootent_type, &args.rootent)?;
        page.set_lsn(args.rootlsn);
    } else {
        return Err(unroutable("rsplit", pgno));
    }

    Ok(())
}

/// Re-materialize the prior item from the record's saved bytes.
pub fn undo_repl(args: &ReplArgs, page: &mut PageImage) -> SnapResult {
    if page.pgno() != args.pgno {
        return Err(unroutable("repl", page.pgno()));
    }

    page.replace_item(args.indx as usize, args.orig_type, &args.orig)?;
    if args.isdeleted {
        page.set_delete_mark(args.indx as usize, true)?;
    }
    page.set_lsn(args.lsn);
    Ok(())
}

/// Revert a cursor-driven slot-index shift. The forward edit only moved
/// slots, so the inverse is slot surgery with the item area untouched.
pub fn undo_adj(args: &AdjArgs, page: &mut PageImage) -> SnapResult {
    if page.pgno() != args.pgno {
        return Err(unroutable("adj", page.pgno()));
    }

    if args.is_insert {
        page.remove_slot(args.indx as usize)?;
    } else {
        page.dup_slot(args.indx as usize, args.indx_copy as usize)?;
    }
    page.set_lsn(args.lsn);
    Ok(())
}

/// Revert a record-count delta on an internal-page entry.
pub fn undo_cadjust(args: &CAdjustArgs, page: &mut PageImage) -> SnapResult {
    if page.pgno() != args.pgno {
        return Err(unroutable("cadjust", page.pgno()));
    }

    page.adjust_internal_entry_count(args.indx as usize, -args.adjust)?;
    page.set_lsn(args.lsn);
    Ok(())
}

/// Clear the cursor intent-to-delete mark at the recorded index.
///
/// Snapshot rollback works on a private copy, so this variant never
/// adjusts other live cursors.
pub fn undo_cdel(args: &CDelArgs, page: &mut PageImage) -> SnapResult {
    if page.pgno() != args.pgno {
        return Err(unroutable("cdel", page.pgno()));
    }

    page.set_delete_mark(args.indx as usize, false)?;
    page.set_lsn(args.lsn);
    Ok(())
}

/// Invert a prefix-compression rewrite by restoring the saved image.
pub fn undo_prefix(args: &PrefixArgs, page: &mut PageImage) -> SnapResult {
    if page.pgno() != args.pgno {
        return Err(unroutable("prefix", page.pgno()));
    }

    restore_saved_image(page, &args.saved)?;
    page.set_lsn(args.pagelsn);
    Ok(())
}
