use std::sync::Arc;

use modsnap::{
    tx_log::{
        record::{AddRemArgs, RecordBody},
        DecodedRecord, Opcode,
    },
    utils, Env, EnvConfig, FileHandle, FileId, Lsn, PageBuffer, PageImage, PageType,
};

pub const PAGE_SIZE: usize = 512;

/// Set up log output. Safe to call from every test.
pub fn setup() {
    utils::init_log();
}

/// An environment over a scratch log directory plus one registered file.
pub struct TestDb {
    pub env: Arc<Env>,
    pub file: FileHandle,
    _dir: tempfile::TempDir,
}

pub fn new_test_db() -> TestDb {
    setup();

    let dir = tempfile::tempdir().unwrap();
    let config = EnvConfig {
        page_size: PAGE_SIZE,
        ..EnvConfig::default()
    };
    let env = Env::create(dir.path(), config).unwrap();
    let file = FileHandle::new(FileId::from_name("test_table"), 1);

    TestDb {
        env,
        file,
        _dir: dir,
    }
}

impl TestDb {
    /// Make a page the current version in the buffer pool.
    pub fn install_page(&self, image: PageImage) {
        self.env
            .buffer_pool()
            .install(self.file.id, PageBuffer::from_image(image));
    }

    pub fn append(&self, record: &DecodedRecord) -> Lsn {
        self.env.mut_log().append(&record.encode()).unwrap()
    }

    pub fn append_raw(&self, bytes: &[u8]) -> Lsn {
        self.env.mut_log().append(bytes).unwrap()
    }

    pub fn switch_logfile(&self) -> u32 {
        self.env.mut_log().switch_file().unwrap()
    }
}

/// A leaf page holding one base item.
pub fn base_leaf(pgno: u32, lsn: Lsn) -> PageImage {
    let mut page = PageImage::init(PAGE_SIZE, pgno, PageType::LBtree, 0);
    page.insert_item(0, 1, b"base-row").unwrap();
    page.set_lsn(lsn);
    page
}

/// An add-item record: the item at `indx` was added by `utxnid`, and the
/// page's LSN before the add was `pagelsn`.
pub fn add_record(utxnid: u64, pgno: u32, indx: u32, item: &[u8], pagelsn: Lsn) -> DecodedRecord {
    DecodedRecord::new(
        utxnid as u32,
        Lsn::ZERO,
        utxnid,
        RecordBody::AddRem(AddRemArgs {
            opcode: Opcode::AddDup,
            fileid: 1,
            pgno,
            indx,
            item_type: 1,
            item: item.to_vec(),
            pagelsn,
        }),
    )
}
