use crate::{page::PageImage, types::PageNo};

/// Bookkeeping prefix carried in front of every materialized page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferHeader {
    pub pgno: PageNo,
}

/// A buffer header and its page image as one allocation, exposing the two as
/// distinct views. This is the unit the version cache stores and the unit a
/// private reconstruction copy lives in.
#[derive(Debug, Clone)]
pub struct PageBuffer {
    hdr: BufferHeader,
    page: PageImage,
}

impl PageBuffer {
    /// A zeroed buffer for a page of the given size.
    pub fn alloc(page_size: usize, pgno: PageNo) -> Box<PageBuffer> {
        let mut page = PageImage::new(page_size);
        page.set_pgno(pgno);
        Box::new(PageBuffer {
            hdr: BufferHeader { pgno },
            page,
        })
    }

    pub fn from_image(page: PageImage) -> PageBuffer {
        PageBuffer {
            hdr: BufferHeader { pgno: page.pgno() },
            page,
        }
    }

    pub fn header(&self) -> &BufferHeader {
        &self.hdr
    }

    pub fn page(&self) -> &PageImage {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut PageImage {
        &mut self.page
    }

    /// Overwrite both views from another buffer of the same page size.
    pub fn copy_from(&mut self, other: &PageBuffer) {
        self.hdr = other.hdr;
        self.page.copy_from(&other.page);
    }
}
