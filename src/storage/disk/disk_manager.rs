use crate::buffer::replacer::PageId;
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

pub const PAGE_SIZE: usize = 4096;

/// Block-device abstraction consumed by the buffer pool manager.
/// Allocation/deallocation of page ids and the actual file I/O live here,
/// outside the pool's own responsibilities.
pub trait DiskManager {
    fn allocate_page(&self) -> PageId;
    fn deallocate_page(&self, page_id: PageId);
    fn read_page(&self, page_id: PageId, page: &mut [u8; PAGE_SIZE]);
    fn write_page(&self, page_id: PageId, page: &[u8; PAGE_SIZE]);
}

#[derive(Debug)]
pub struct DiskManagerInstance {
    file: File,
    next_page_id: AtomicU32,
    freed_page_ids: Mutex<Vec<u32>>,
}

impl DiskManager for DiskManagerInstance {
    fn allocate_page(&self) -> PageId {
        if let Some(id) = self.freed_page_ids.lock().unwrap().pop() {
            return PageId(id);
        }
        PageId(self.next_page_id.fetch_add(1, Ordering::SeqCst))
    }

    fn deallocate_page(&self, page_id: PageId) {
        self.freed_page_ids.lock().unwrap().push(page_id.0);
    }

    fn read_page(&self, page_id: PageId, page: &mut [u8; PAGE_SIZE]) {
        self.file
            .read_at(page, page_id.0 as u64 * PAGE_SIZE as u64)
            .unwrap();
    }

    fn write_page(&self, page_id: PageId, page: &[u8; PAGE_SIZE]) {
        self.file
            .write_at(page, page_id.0 as u64 * PAGE_SIZE as u64)
            .unwrap();
    }
}

impl DiskManagerInstance {
    pub fn new(dbname: &str) -> Self {
        let file_name = format!("{}.db", dbname);
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .open(file_name)
            .unwrap();
        Self {
            file,
            next_page_id: AtomicU32::new(0),
            freed_page_ids: Mutex::new(Vec::new()),
        }
    }
}
