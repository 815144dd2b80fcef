use crate::buffer::replacer::{FrameId, LruReplacer, PageId, Replacer};
use crate::container::extendible_hash_table::ExtendibleHashTable;
use crate::storage::disk::disk_manager::DiskManager;
use crate::storage::pages::page::{Data, Page};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Bucket size used for the pool's internal `PageId -> FrameId` directory.
/// Unrelated to any bucket size a client picks for its own hash index.
const PAGE_TABLE_BUCKET_SIZE: usize = 4;

struct PoolState {
    frames: Vec<Page>,
    free_list: VecDeque<FrameId>,
}

/// Owns a fixed array of page frames and brokers all access to them.
///
/// `frames`/`free_list` live under `state`; `page_table` and `replacer` are
/// independently thread-safe components held directly, so every public
/// pool operation holds exactly one external lock (`state`) for its full
/// duration while delegating to those components. That gives linearizable
/// pool operations: no other pool call can interleave while `state` is
/// held, regardless of how many internal locks get taken along the way.
pub struct BufferPoolManager<D: DiskManager> {
    pool_size: usize,
    disk_manager: Arc<D>,
    page_table: ExtendibleHashTable<PageId, FrameId>,
    replacer: LruReplacer<FrameId>,
    state: Mutex<PoolState>,
}

impl<D: DiskManager> BufferPoolManager<D> {
    pub fn new(pool_size: usize, disk_manager: Arc<D>) -> Self {
        let frames = vec![Page::new(); pool_size];
        let free_list = (0..pool_size).map(FrameId).collect();
        BufferPoolManager {
            pool_size,
            disk_manager,
            page_table: ExtendibleHashTable::new(PAGE_TABLE_BUCKET_SIZE),
            replacer: LruReplacer::new(pool_size),
            state: Mutex::new(PoolState { frames, free_list }),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Picks a frame to reuse: free list first, then the LRU's victim.
    /// Writes the victim back if dirty and evicts its old page table entry.
    /// Returns `None` if every frame is pinned and the free list is empty.
    fn recruit_frame(&self, state: &mut PoolState) -> Option<FrameId> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Some(frame_id);
        }
        let frame_id = self.replacer.victim()?;
        let frame = &mut state.frames[frame_id.0];
        if frame.is_dirty() {
            if let Some(old_id) = frame.get_page_id() {
                self.disk_manager
                    .write_page(old_id, &frame.get_data().read().unwrap().0);
            }
        }
        if let Some(old_id) = frame.get_page_id() {
            self.page_table.remove(&old_id);
            log::debug!("evicted page {:?} from frame {:?}", old_id, frame_id);
        }
        Some(frame_id)
    }

    /// Returns a frame pinned to the caller whose data reflects `page_id`'s
    /// on-disk (or most recently written) content, or `None` if `page_id`
    /// is invalid or every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> Option<Data> {
        if !page_id.is_valid() {
            return None;
        }
        let mut state = self.state.lock().unwrap();

        if let Some(frame_id) = self.page_table.find(&page_id) {
            let frame = &mut state.frames[frame_id.0];
            frame.increase_pin_count();
            self.replacer.erase(frame_id);
            return Some(frame.get_data());
        }

        let frame_id = self.recruit_frame(&mut state)?;
        {
            let frame = &mut state.frames[frame_id.0];
            self.disk_manager
                .read_page(page_id, &mut frame.get_data().write().unwrap().0);
            frame.set_page_id(page_id);
            frame.set_is_dirty(false);
            frame.set_pin_count(1);
        }
        self.page_table.insert(page_id, frame_id);
        Some(state.frames[frame_id.0].get_data())
    }

    /// Allocates a fresh page through the disk manager and returns a pinned,
    /// zeroed frame for it, or `None` if every frame is pinned and the free
    /// list is empty.
    pub fn new_page(&self) -> Option<(PageId, Data)> {
        let mut state = self.state.lock().unwrap();
        let frame_id = self.recruit_frame(&mut state)?;
        let page_id = self.disk_manager.allocate_page();
        {
            let frame = &mut state.frames[frame_id.0];
            frame.reset_data();
            frame.set_page_id(page_id);
            frame.set_is_dirty(true);
            frame.set_pin_count(1);
        }
        self.page_table.insert(page_id, frame_id);
        Some((page_id, state.frames[frame_id.0].get_data()))
    }

    /// Decrements `page_id`'s pin count, inserting its frame into the LRU
    /// once the count reaches zero. A clean unpin (`is_dirty == false`)
    /// never clears a prior dirty mark. Returns `false` if the page is
    /// absent or its pin count is already zero.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let frame = &mut state.frames[frame_id.0];
        if is_dirty {
            frame.set_is_dirty(true);
        }
        if frame.get_pin_count() == 0 {
            return false;
        }
        frame.decrease_pin_count();
        if frame.get_pin_count() == 0 {
            self.replacer.insert(frame_id);
        }
        true
    }

    /// Writes `page_id`'s frame to disk if resident. Does not touch the
    /// dirty flag.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        if !page_id.is_valid() {
            return false;
        }
        let state = self.state.lock().unwrap();
        let Some(frame_id) = self.page_table.find(&page_id) else {
            return false;
        };
        let frame = &state.frames[frame_id.0];
        self.disk_manager
            .write_page(page_id, &frame.get_data().read().unwrap().0);
        true
    }

    /// Removes a resident, unpinned page from the pool and asks the disk
    /// manager to deallocate it. Refuses (returns `false`) while the page
    /// is still pinned.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock().unwrap();
        if let Some(frame_id) = self.page_table.find(&page_id) {
            if state.frames[frame_id.0].get_pin_count() != 0 {
                return false;
            }
            self.replacer.erase(frame_id);
            self.page_table.remove(&page_id);
            let frame = &mut state.frames[frame_id.0];
            frame.clear_page_id();
            frame.set_is_dirty(false);
            frame.reset_data();
            state.free_list.push_back(frame_id);
        }
        self.disk_manager.deallocate_page(page_id);
        true
    }

    /// Writes every dirty resident frame to disk. Ambient housekeeping for
    /// graceful shutdown; not one of the five spec'd operations, but pure
    /// bookkeeping over state the spec already defines.
    pub fn flush_all_pages(&self) {
        let state = self.state.lock().unwrap();
        for frame in state.frames.iter() {
            if frame.is_dirty() {
                if let Some(page_id) = frame.get_page_id() {
                    self.disk_manager
                        .write_page(page_id, &frame.get_data().read().unwrap().0);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::disk::disk_manager::DiskManagerInstance;

    fn temp_pool(name: &str, pool_size: usize) -> BufferPoolManager<DiskManagerInstance> {
        let _ = std::fs::remove_file(format!("{}.db", name));
        let disk_manager = Arc::new(DiskManagerInstance::new(name));
        BufferPoolManager::new(pool_size, disk_manager)
    }

    #[test]
    fn new_page_survives_eviction_round_trip() {
        let bpm = temp_pool("test_bpm_round_trip", 10);
        let (p0, data) = bpm.new_page().unwrap();
        data.write().unwrap()[0] = b'A';
        bpm.unpin_page(p0, true);

        for _ in 0..10 {
            let (pid, data) = bpm.new_page().unwrap();
            bpm.unpin_page(pid, false);
            let _ = data;
        }

        let fetched = bpm.fetch_page(p0).unwrap();
        assert_eq!(fetched.read().unwrap()[0], b'A');
        bpm.unpin_page(p0, false);
        std::fs::remove_file("test_bpm_round_trip.db").unwrap();
    }

    #[test]
    fn new_page_fails_when_pool_exhausted() {
        let bpm = temp_pool("test_bpm_exhausted", 10);
        for _ in 0..10 {
            assert!(bpm.new_page().is_some());
        }
        assert!(bpm.new_page().is_none());
        std::fs::remove_file("test_bpm_exhausted.db").unwrap();
    }

    #[test]
    fn clean_unpin_does_not_clear_prior_dirty_mark() {
        let bpm = temp_pool("test_bpm_dirty_sticky", 4);
        let (p0, _) = bpm.new_page().unwrap();
        bpm.unpin_page(p0, true);
        let data = bpm.fetch_page(p0).unwrap();
        data.write().unwrap()[0] = 7;
        bpm.unpin_page(p0, false);

        for _ in 0..4 {
            let (pid, _) = bpm.new_page().unwrap();
            bpm.unpin_page(pid, false);
        }

        let mut buf = [0u8; crate::storage::disk::disk_manager::PAGE_SIZE];
        let disk_manager = DiskManagerInstance::new("test_bpm_dirty_sticky");
        disk_manager.read_page(p0, &mut buf);
        assert_eq!(buf[0], 7);
        std::fs::remove_file("test_bpm_dirty_sticky.db").unwrap();
    }

    #[test]
    fn delete_pinned_page_is_refused() {
        let bpm = temp_pool("test_bpm_delete_pinned", 4);
        let (p0, _) = bpm.new_page().unwrap();
        assert!(!bpm.delete_page(p0));
        bpm.unpin_page(p0, false);
        assert!(bpm.delete_page(p0));
        std::fs::remove_file("test_bpm_delete_pinned.db").unwrap();
    }

    #[test]
    fn unpin_already_unpinned_page_returns_false() {
        let bpm = temp_pool("test_bpm_double_unpin", 4);
        let (p0, _) = bpm.new_page().unwrap();
        assert!(bpm.unpin_page(p0, false));
        assert!(!bpm.unpin_page(p0, false));
        std::fs::remove_file("test_bpm_double_unpin.db").unwrap();
    }

    #[test]
    fn concurrent_fetch_and_unpin_balance_pin_counts() {
        use std::thread;
        let bpm = Arc::new(temp_pool("test_bpm_concurrent", 16));
        let mut page_ids = Vec::new();
        for _ in 0..16 {
            let (pid, _) = bpm.new_page().unwrap();
            bpm.unpin_page(pid, false);
            page_ids.push(pid);
        }

        let mut handles = Vec::new();
        for &pid in &page_ids {
            let bpm = bpm.clone();
            handles.push(thread::spawn(move || {
                let data = bpm.fetch_page(pid).unwrap();
                let _ = data.read().unwrap()[0];
                bpm.unpin_page(pid, false);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        std::fs::remove_file("test_bpm_concurrent.db").unwrap();
    }
}
