//! Undo handlers for the db record families: item add/remove, big-record
//! overflow chains, overflow reference counts, sibling relinks, and page
//! allocation / free.

use log::debug;

use super::{unroutable, UndoContext};
use crate::{
    error::Error,
    page::{PageImage, PageType, META_PGNO},
    tx_log::record::{
        AddRemArgs, BigArgs, OvRefArgs, PgAllocArgs, PgFreeArgs, PgFreedataArgs, RelinkArgs,
    },
    types::SnapResult,
};

/// Invert an item add or remove. A remove is undone by re-inserting the
/// saved item at its slot; an add-dup by deleting the slot.
pub fn undo_addrem(args: &AddRemArgs, page: &mut PageImage, ctx: &UndoContext) -> SnapResult {
    if ctx.verify_fileid && args.fileid != ctx.fileid {
        return Err(Error::fatal(format!(
            "addrem record for file {} applied against file {}",
            args.fileid, ctx.fileid
        )));
    }

    if page.pgno() != args.pgno {
        return Err(unroutable("addrem", page.pgno()));
    }

    if args.opcode.is_remove() {
        page.insert_item(args.indx as usize, args.item_type, &args.item)?;
    } else {
        page.delete_item(args.indx as usize)?;
    }

    page.set_lsn(args.pagelsn);
    Ok(())
}

/// Invert a big-record overflow-chain edit. The handler further dispatches
/// on whether the supplied page is the logged overflow page itself or one
/// of its neighbors; neighbors only need link repair.
pub fn undo_big(args: &BigArgs, page: &mut PageImage) -> SnapResult {
    let pgno = page.pgno();

    if pgno == args.pgno {
        if args.opcode.is_remove() {
            // the remove dropped this page from the chain: put it back
            page.reinit(PageType::Overflow, 0);
            page.set_prev_pgno(args.prev_pgno);
            page.set_next_pgno(args.next_pgno);
            page.set_ov_data(&args.data);
        } else {
            // the add created this page: it did not exist before
            page.reinit(PageType::Invalid, 0);
        }
        page.set_lsn(args.pagelsn);
    } else if pgno == args.prev_pgno {
        if args.opcode.is_remove() {
            page.set_next_pgno(args.pgno);
        } else {
            page.set_next_pgno(args.next_pgno);
        }
        page.set_lsn(args.prevlsn);
    } else if pgno == args.next_pgno {
        if args.opcode.is_remove() {
            page.set_prev_pgno(args.pgno);
        } else {
            page.set_prev_pgno(args.prev_pgno);
        }
        page.set_lsn(args.nextlsn);
    } else {
        return Err(unroutable("big", pgno));
    }

    Ok(())
}

/// Restore an overflow page's prior reference count.
pub fn undo_ovref(args: &OvRefArgs, page: &mut PageImage) -> SnapResult {
    if page.pgno() != args.pgno {
        return Err(unroutable("ovref", page.pgno()));
    }

    let restored = (page.ov_ref() as i64 - args.adjust as i64) as u32;
    page.set_ov_ref(restored);
    page.set_lsn(args.lsn);
    Ok(())
}

/// Reverse a sibling-chain link edit on whichever of {target, prev, next}
/// was supplied. An added page (or its predecessor) has no pre-image to
/// roll back to, so those combinations are dispatch failures.
pub fn undo_relink(args: &RelinkArgs, page: &mut PageImage) -> SnapResult {
    let pgno = page.pgno();

    if args.opcode.is_remove() {
        if pgno == args.pgno {
            page.set_prev_pgno(args.prev);
            page.set_next_pgno(args.next);
            page.set_lsn(args.lsn);
        } else if pgno == args.next {
            page.set_prev_pgno(args.pgno);
            page.set_lsn(args.lsn_next);
        } else if pgno == args.prev {
            page.set_next_pgno(args.pgno);
            page.set_lsn(args.lsn_prev);
        } else {
            return Err(unroutable("relink", pgno));
        }
    } else {
        if pgno == args.next {
            page.set_prev_pgno(args.prev);
            page.set_lsn(args.lsn_next);
        } else {
            // the added page and its predecessor have no pre-link state
            return Err(unroutable("relink(add)", pgno));
        }
    }

    Ok(())
}

/// Invert a page allocation: the target page goes back to the free list,
/// the metadata page gets its prior free-list head back.
pub fn undo_pg_alloc(args: &PgAllocArgs, page: &mut PageImage) -> SnapResult {
    let pgno = page.pgno();

    if pgno == args.pgno {
        page.reinit(PageType::Invalid, 0);
        page.set_next_pgno(args.next);
        page.set_lsn(args.page_lsn);
    } else if pgno == META_PGNO {
        page.set_meta_free(args.pgno);
        if args.pgno > page.meta_last_pgno() {
            debug!(
                "alloc undo bumps last_pgno forward to {}",
                args.pgno
            );
            page.set_meta_last_pgno(args.pgno);
        }
        page.set_lsn(args.meta_lsn);
    } else {
        return Err(unroutable("pg_alloc", pgno));
    }

    Ok(())
}

/// Invert a page free: the target page gets its saved header back, the
/// metadata page its prior free-list head.
pub fn undo_pg_free(args: &PgFreeArgs, page: &mut PageImage) -> SnapResult {
    let pgno = page.pgno();

    if pgno == args.pgno {
        page.restore_header(&args.header)?;
        page.set_lsn(args.page_lsn);
    } else if pgno == META_PGNO {
        page.set_meta_free(args.next);
        page.set_lsn(args.meta_lsn);
    } else {
        return Err(unroutable("pg_free", pgno));
    }

    Ok(())
}

/// Like `undo_pg_free`, with the freed page's body restored too.
pub fn undo_pg_freedata(args: &PgFreedataArgs, page: &mut PageImage) -> SnapResult {
    let pgno = page.pgno();

    if pgno == args.pgno {
        page.restore_header(&args.header)?;
        page.restore_body(&args.data)?;
        page.set_lsn(args.page_lsn);
    } else if pgno == META_PGNO {
        page.set_meta_free(args.next);
        page.set_lsn(args.meta_lsn);
    } else {
        return Err(unroutable("pg_freedata", pgno));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lsn::Lsn, tx_log::Opcode};

    const PAGE_SIZE: usize = 512;

    fn ctx() -> UndoContext {
        UndoContext::new(false, 0)
    }

    #[test]
    fn test_addrem_remove_undo_reinserts() {
        let mut page = PageImage::init(PAGE_SIZE, 9, PageType::LBtree, 0);
        page.insert_item(0, 1, b"keep").unwrap();
        page.insert_item(1, 1, b"victim").unwrap();
        page.set_lsn(Lsn::new(3, 100));
        let before = page.clone();

        // forward edit: remove item 1, page moves to a newer lsn
        page.delete_item(1).unwrap();
        page.set_lsn(Lsn::new(3, 200));

        let args = AddRemArgs {
            opcode: Opcode::RemDup,
            fileid: 4,
            pgno: 9,
            indx: 1,
            item_type: 1,
            item: b"victim".to_vec(),
            pagelsn: Lsn::new(3, 100),
        };
        undo_addrem(&args, &mut page, &ctx()).unwrap();

        assert_eq!(page.as_bytes(), before.as_bytes());
    }

    #[test]
    fn test_addrem_add_undo_deletes() {
        let mut page = PageImage::init(PAGE_SIZE, 9, PageType::LBtree, 0);
        page.insert_item(0, 1, b"keep").unwrap();
        page.set_lsn(Lsn::new(3, 100));
        let before = page.clone();

        page.insert_item(1, 1, b"added").unwrap();
        page.set_lsn(Lsn::new(3, 200));

        let args = AddRemArgs {
            opcode: Opcode::AddDup,
            fileid: 4,
            pgno: 9,
            indx: 1,
            item_type: 1,
            item: b"added".to_vec(),
            pagelsn: Lsn::new(3, 100),
        };
        undo_addrem(&args, &mut page, &ctx()).unwrap();

        assert_eq!(page.as_bytes(), before.as_bytes());
    }

    #[test]
    fn test_addrem_fileid_verification() {
        let mut page = PageImage::init(PAGE_SIZE, 9, PageType::LBtree, 0);
        page.insert_item(0, 1, b"x").unwrap();

        let args = AddRemArgs {
            opcode: Opcode::AddDup,
            fileid: 4,
            pgno: 9,
            indx: 0,
            item_type: 1,
            item: b"x".to_vec(),
            pagelsn: Lsn::new(1, 0),
        };

        // ignored when the configuration bit is off
        undo_addrem(&args, &mut page, &UndoContext::new(false, 8)).unwrap();

        page.insert_item(0, 1, b"x").unwrap();
        let ret = undo_addrem(&args, &mut page, &UndoContext::new(true, 8));
        assert!(matches!(ret, Err(Error::Fatal(_))));
    }

    #[test]
    fn test_addrem_wrong_page_is_fatal() {
        let mut page = PageImage::init(PAGE_SIZE, 10, PageType::LBtree, 0);
        let args = AddRemArgs {
            opcode: Opcode::AddDup,
            fileid: 4,
            pgno: 9,
            indx: 0,
            item_type: 1,
            item: vec![],
            pagelsn: Lsn::ZERO,
        };
        assert!(matches!(
            undo_addrem(&args, &mut page, &ctx()),
            Err(Error::Fatal(_))
        ));
    }

    fn big_args(opcode: Opcode) -> BigArgs {
        BigArgs {
            opcode,
            fileid: 1,
            pgno: 6,
            prev_pgno: 5,
            next_pgno: 7,
            pagelsn: Lsn::new(2, 10),
            prevlsn: Lsn::new(2, 20),
            nextlsn: Lsn::new(2, 30),
            data: b"overflow bytes".to_vec(),
        }
    }

    #[test]
    fn test_big_remove_undo_restores_chain_page() {
        let mut page = PageImage::init(PAGE_SIZE, 6, PageType::Invalid, 0);
        undo_big(&big_args(Opcode::RemBig), &mut page).unwrap();

        assert_eq!(page.page_type().unwrap(), PageType::Overflow);
        assert_eq!(page.prev_pgno(), 5);
        assert_eq!(page.next_pgno(), 7);
        assert_eq!(page.ov_data(), b"overflow bytes");
        assert_eq!(page.lsn(), Lsn::new(2, 10));
    }

    #[test]
    fn test_big_add_undo_clears_page() {
        let mut page = PageImage::init(PAGE_SIZE, 6, PageType::Overflow, 0);
        page.set_ov_data(b"overflow bytes");

        undo_big(&big_args(Opcode::AddBig), &mut page).unwrap();
        assert_eq!(page.page_type().unwrap(), PageType::Invalid);
        assert_eq!(page.lsn(), Lsn::new(2, 10));
    }

    #[test]
    fn test_big_neighbor_link_repair() {
        // predecessor of an added page points back past it
        let mut prev = PageImage::init(PAGE_SIZE, 5, PageType::Overflow, 0);
        prev.set_next_pgno(6);
        undo_big(&big_args(Opcode::AddBig), &mut prev).unwrap();
        assert_eq!(prev.next_pgno(), 7);
        assert_eq!(prev.lsn(), Lsn::new(2, 20));

        // successor of a removed page points back at it
        let mut next = PageImage::init(PAGE_SIZE, 7, PageType::Overflow, 0);
        next.set_prev_pgno(5);
        undo_big(&big_args(Opcode::RemBig), &mut next).unwrap();
        assert_eq!(next.prev_pgno(), 6);
        assert_eq!(next.lsn(), Lsn::new(2, 30));
    }

    #[test]
    fn test_ovref_restores_prior_count() {
        let mut page = PageImage::init(PAGE_SIZE, 6, PageType::Overflow, 0);
        page.set_ov_ref(3);

        let args = OvRefArgs {
            fileid: 1,
            pgno: 6,
            adjust: 1,
            lsn: Lsn::new(4, 40),
        };
        undo_ovref(&args, &mut page).unwrap();
        assert_eq!(page.ov_ref(), 2);
        assert_eq!(page.lsn(), Lsn::new(4, 40));
    }

    fn relink_args(opcode: Opcode) -> RelinkArgs {
        RelinkArgs {
            opcode,
            fileid: 1,
            pgno: 6,
            lsn: Lsn::new(3, 10),
            prev: 5,
            lsn_prev: Lsn::new(3, 20),
            next: 7,
            lsn_next: Lsn::new(3, 30),
        }
    }

    #[test]
    fn test_relink_remove_undo() {
        let mut target = PageImage::init(PAGE_SIZE, 6, PageType::LBtree, 0);
        undo_relink(&relink_args(Opcode::RemPage), &mut target).unwrap();
        assert_eq!(target.prev_pgno(), 5);
        assert_eq!(target.next_pgno(), 7);
        assert_eq!(target.lsn(), Lsn::new(3, 10));

        let mut prev = PageImage::init(PAGE_SIZE, 5, PageType::LBtree, 0);
        prev.set_next_pgno(7);
        undo_relink(&relink_args(Opcode::RemPage), &mut prev).unwrap();
        assert_eq!(prev.next_pgno(), 6);

        let mut next = PageImage::init(PAGE_SIZE, 7, PageType::LBtree, 0);
        next.set_prev_pgno(5);
        undo_relink(&relink_args(Opcode::RemPage), &mut next).unwrap();
        assert_eq!(next.prev_pgno(), 6);
    }

    #[test]
    fn test_relink_add_undo_only_repairs_successor() {
        let mut next = PageImage::init(PAGE_SIZE, 7, PageType::LBtree, 0);
        next.set_prev_pgno(6);
        undo_relink(&relink_args(Opcode::AddPage), &mut next).unwrap();
        assert_eq!(next.prev_pgno(), 5);

        let mut target = PageImage::init(PAGE_SIZE, 6, PageType::LBtree, 0);
        assert!(matches!(
            undo_relink(&relink_args(Opcode::AddPage), &mut target),
            Err(Error::Fatal(_))
        ));
    }

    fn alloc_args() -> PgAllocArgs {
        PgAllocArgs {
            fileid: 1,
            meta_lsn: Lsn::new(5, 10),
            page_lsn: Lsn::new(5, 20),
            pgno: 9,
            ptype: PageType::LBtree.to_u8(),
            next: 12,
        }
    }

    #[test]
    fn test_pg_alloc_target_undo() {
        let mut page = PageImage::init(PAGE_SIZE, 9, PageType::LBtree, 0);
        page.insert_item(0, 1, b"row").unwrap();

        undo_pg_alloc(&alloc_args(), &mut page).unwrap();
        assert_eq!(page.page_type().unwrap(), PageType::Invalid);
        assert_eq!(page.next_pgno(), 12);
        assert_eq!(page.entries(), 0);
        assert_eq!(page.lsn(), Lsn::new(5, 20));
    }

    #[test]
    fn test_pg_alloc_meta_undo_restores_free_head_and_bumps_last_pgno() {
        let mut meta = PageImage::init(PAGE_SIZE, META_PGNO, PageType::DbMeta, 0);
        meta.set_meta_free(12);
        meta.set_meta_last_pgno(8);

        undo_pg_alloc(&alloc_args(), &mut meta).unwrap();
        assert_eq!(meta.meta_free(), 9);
        assert_eq!(meta.meta_last_pgno(), 9);
        assert_eq!(meta.lsn(), Lsn::new(5, 10));
    }

    #[test]
    fn test_pg_free_undo_round_trip() {
        // a live page about to be freed
        let mut page = PageImage::init(PAGE_SIZE, 9, PageType::LBtree, 0);
        page.insert_item(0, 1, b"survivor").unwrap();
        page.set_lsn(Lsn::new(6, 5));
        let header = page.header_bytes().to_vec();
        let body = page.body_bytes().to_vec();
        let before = page.clone();

        // forward edit: the free wipes it onto the free list
        page.reinit(PageType::Invalid, 0);
        page.set_next_pgno(4);
        page.set_lsn(Lsn::new(6, 50));

        let args = PgFreedataArgs {
            fileid: 1,
            pgno: 9,
            meta_lsn: Lsn::new(6, 10),
            page_lsn: Lsn::new(6, 5),
            header,
            next: 4,
            data: body,
        };
        undo_pg_freedata(&args, &mut page).unwrap();
        assert_eq!(page.as_bytes(), before.as_bytes());

        // meta side: free head back to its prior value
        let mut meta = PageImage::init(PAGE_SIZE, META_PGNO, PageType::DbMeta, 0);
        meta.set_meta_free(9);
        undo_pg_freedata(&args, &mut meta).unwrap();
        assert_eq!(meta.meta_free(), 4);
        assert_eq!(meta.lsn(), Lsn::new(6, 10));
    }

    #[test]
    fn test_pg_free_header_only() {
        let mut page = PageImage::init(PAGE_SIZE, 9, PageType::LBtree, 0);
        page.set_lsn(Lsn::new(6, 5));
        let header = page.header_bytes().to_vec();

        page.reinit(PageType::Invalid, 0);

        let args = PgFreeArgs {
            fileid: 1,
            pgno: 9,
            meta_lsn: Lsn::new(6, 10),
            page_lsn: Lsn::new(6, 5),
            header,
            next: 4,
        };
        undo_pg_free(&args, &mut page).unwrap();
        assert_eq!(page.page_type().unwrap(), PageType::LBtree);
        assert_eq!(page.lsn(), Lsn::new(6, 5));
    }
}
