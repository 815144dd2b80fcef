//! B+-tree internal page: a slotted `(key, child_page_id)` array overlaid on
//! a frame's raw byte buffer, plus the split/merge/redistribute operations
//! that keep multiple such pages consistent with each other through the
//! buffer pool.
//!
//! Every operation here is a function of an explicit byte slice (the
//! frame's `data`, obtained by locking the `Page` returned from
//! `fetch_page`/`new_page`) rather than a long-lived borrow, since the pool
//! owns the frame and hands out `Arc<RwLock<_>>` guards with their own
//! lifetimes. The header and slot array are reinterpreted in place via
//! `bytemuck` rather than parsed into an owned struct, so a mutation writes
//! straight back into the frame the pool already owns.

use crate::buffer::buffer_pool_manager::BufferPoolManager;
use crate::buffer::replacer::PageId;
use crate::error::BPlusTreeError;
use crate::storage::disk::disk_manager::{DiskManager, PAGE_SIZE};
use bytemuck::{Pod, Zeroable};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::mem::size_of;

/// `page_type` tag stamped into every internal page's header, distinguishing
/// it from a leaf page sharing the same header layout.
pub const PAGE_TYPE_INTERNAL: u32 = 2;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InternalPageHeader {
    pub page_type: u32,
    pub size: u32,
    pub max_size: u32,
    pub page_id: u32,
    pub parent_page_id: u32,
}

unsafe impl Zeroable for InternalPageHeader {}
unsafe impl Pod for InternalPageHeader {}

const HEADER_SIZE: usize = size_of::<InternalPageHeader>();

/// One `(key, child_page_id)` pair. Slot 0's key is never read by
/// `lookup` — only its child pointer is meaningful, since slot 0 stands for
/// "everything less than the first real separator".
///
/// Never reinterpreted as a single POD blob: its two fields are read and
/// written as independent byte ranges (below) so that `repr(C)`'s
/// alignment-driven padding between a wide `K` and the trailing `u32`
/// never enters the picture — only `K` itself needs to be `Pod`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Slot<K> {
    key: K,
    child_page_id: u32,
}

/// Overwrites just the `parent_page_id` field of any page sharing this
/// common header layout (leaf pages, out of scope here, share the same
/// header convention). Used when re-parenting a child during split/merge.
pub fn set_parent_page_id_raw(data: &mut [u8], parent_page_id: PageId) {
    let mut header: InternalPageHeader = bytemuck::pod_read_unaligned(&data[0..HEADER_SIZE]);
    header.parent_page_id = parent_page_id.0;
    data[0..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
}

/// A namespace of associated functions operating on a page's raw bytes;
/// never instantiated (the page buffer itself, not this type, holds state).
pub struct BPlusTreeInternalPage<K> {
    _marker: PhantomData<K>,
}

impl<K> BPlusTreeInternalPage<K>
where
    K: Pod + Zeroable + Copy + Default,
{
    const KEY_SIZE: usize = size_of::<K>();
    const SLOT_SIZE: usize = Self::KEY_SIZE + size_of::<u32>();

    /// How many slots fit in a page after the header: the largest `size`
    /// this node can reach before it must split.
    pub const fn max_size() -> usize {
        (PAGE_SIZE - HEADER_SIZE) / Self::SLOT_SIZE
    }

    fn header(data: &[u8]) -> InternalPageHeader {
        bytemuck::pod_read_unaligned(&data[0..HEADER_SIZE])
    }

    fn write_header(data: &mut [u8], header: InternalPageHeader) {
        data[0..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
    }

    fn slot_offset(i: usize) -> usize {
        HEADER_SIZE + i * Self::SLOT_SIZE
    }

    fn read_slot(data: &[u8], i: usize) -> Slot<K> {
        let off = Self::slot_offset(i);
        let key: K = bytemuck::pod_read_unaligned(&data[off..off + Self::KEY_SIZE]);
        let child_bytes = &data[off + Self::KEY_SIZE..off + Self::SLOT_SIZE];
        let child_page_id = u32::from_ne_bytes(child_bytes.try_into().unwrap());
        Slot { key, child_page_id }
    }

    fn write_slot(data: &mut [u8], i: usize, slot: Slot<K>) {
        let off = Self::slot_offset(i);
        data[off..off + Self::KEY_SIZE].copy_from_slice(bytemuck::bytes_of(&slot.key));
        data[off + Self::KEY_SIZE..off + Self::SLOT_SIZE]
            .copy_from_slice(&slot.child_page_id.to_ne_bytes());
    }

    fn increase_size(data: &mut [u8], delta: i32) {
        let mut header = Self::header(data);
        header.size = (header.size as i32 + delta) as u32;
        Self::write_header(data, header);
    }

    /// Appends `slot` at the current tail and grows `size` by one. Shared
    /// by every "copy into recipient" step below.
    fn append_slot(data: &mut [u8], slot: Slot<K>) {
        let size = Self::size(data);
        Self::write_slot(data, size, slot);
        Self::increase_size(data, 1);
    }

    pub fn page_id(data: &[u8]) -> PageId {
        PageId(Self::header(data).page_id)
    }

    pub fn parent_page_id(data: &[u8]) -> PageId {
        PageId(Self::header(data).parent_page_id)
    }

    pub fn set_parent_page_id(data: &mut [u8], parent_page_id: PageId) {
        set_parent_page_id_raw(data, parent_page_id)
    }

    pub fn size(data: &[u8]) -> usize {
        Self::header(data).size as usize
    }

    /// Sets `page_type`, `size = 1`, `page_id`, `parent_page_id`, and
    /// `max_size`. Slot 0's child is populated later by `populate_new_root`
    /// or inherited from the caller.
    pub fn init(data: &mut [u8], page_id: PageId, parent_page_id: PageId) {
        Self::write_header(
            data,
            InternalPageHeader {
                page_type: PAGE_TYPE_INTERNAL,
                size: 1,
                max_size: Self::max_size() as u32,
                page_id: page_id.0,
                parent_page_id: parent_page_id.0,
            },
        );
    }

    /// Out-of-range reads return a default-constructed key rather than
    /// panicking, since callers routinely probe one slot past a boundary
    /// (e.g. `lookup`'s binary search) and treat "default" as "don't care".
    pub fn key_at(data: &[u8], i: usize) -> K {
        if i >= Self::size(data) {
            return K::default();
        }
        Self::read_slot(data, i).key
    }

    /// Out-of-range writes are silently dropped; there is nothing to
    /// overwrite past the occupied slot range.
    pub fn set_key_at(data: &mut [u8], i: usize, key: K) {
        if i >= Self::size(data) {
            return;
        }
        let mut slot = Self::read_slot(data, i);
        slot.key = key;
        Self::write_slot(data, i, slot);
    }

    /// Out-of-range reads return `PageId::INVALID` rather than panicking,
    /// matching `key_at`'s tolerance of one-past-the-end probes.
    pub fn value_at(data: &[u8], i: usize) -> PageId {
        if i >= Self::size(data) {
            return PageId::INVALID;
        }
        PageId(Self::read_slot(data, i).child_page_id)
    }

    /// Out-of-range writes are a caller bug — unlike a key, there is no
    /// sensible "do nothing" for overwriting a child pointer that doesn't
    /// exist yet, so this asserts instead of swallowing the mistake.
    pub fn set_value_at(data: &mut [u8], i: usize, value: PageId) {
        assert!(i < Self::size(data), "set_value_at index out of range");
        let mut slot = Self::read_slot(data, i);
        slot.child_page_id = value.0;
        Self::write_slot(data, i, slot);
    }

    /// Linear search for the first slot whose child pointer equals `value`.
    pub fn value_index(data: &[u8], value: PageId) -> Option<usize> {
        (0..Self::size(data)).find(|&i| Self::value_at(data, i) == value)
    }

    /// Binary search over `[1, size)` for the child whose key range
    /// contains `key`: the least `i` with `cmp(key_at(i), key) != Less`
    /// answers `value_at(i - 1)`, since separator `i` marks where child
    /// `i - 1`'s range ends and child `i`'s begins.
    pub fn lookup(data: &[u8], key: &K, cmp: impl Fn(&K, &K) -> Ordering) -> PageId {
        let mut lo = 1usize;
        let mut hi = Self::size(data);
        while lo < hi {
            let mid = (lo + hi) / 2;
            let mid_key = Self::key_at(data, mid);
            if cmp(&mid_key, key) == Ordering::Less {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Self::value_at(data, lo - 1)
    }

    /// Used when a split propagates past the root and a brand-new root must
    /// be created above the two halves: `array[0].child = old_value`,
    /// `array[1] = (new_key, new_value)`, size becomes 2.
    pub fn populate_new_root(data: &mut [u8], old_value: PageId, new_key: K, new_value: PageId) {
        Self::set_value_at(data, 0, old_value);
        Self::append_slot(
            data,
            Slot {
                key: new_key,
                child_page_id: new_value.0,
            },
        );
    }

    /// Scans children right to left, shifting `(key, child)` slots right by
    /// one until the slot whose child equals `old_value` is found, then
    /// writes `(new_key, new_value)` immediately after it. Returns the new
    /// size.
    pub fn insert_node_after(
        data: &mut [u8],
        old_value: PageId,
        new_key: K,
        new_value: PageId,
    ) -> usize {
        let size = Self::size(data);
        let mut i = size;
        while i > 0 {
            if Self::value_at(data, i - 1) == old_value {
                Self::write_slot(
                    data,
                    i,
                    Slot {
                        key: new_key,
                        child_page_id: new_value.0,
                    },
                );
                break;
            }
            let shifted = Self::read_slot(data, i - 1);
            Self::write_slot(data, i, shifted);
            i -= 1;
        }
        Self::increase_size(data, 1);
        Self::size(data)
    }

    /// Re-fetches `child_id` through the pool and overwrites its
    /// `parent_page_id`, unpinning dirty on exit. A child's `parent_page_id`
    /// is stored data, not a cached pointer, so moving a child between
    /// parents during split/merge must update it on disk, not just in the
    /// moving parent's own slot array. Every split/merge operation below
    /// calls this for each child it relocates.
    fn reparent_child<D: DiskManager>(
        bpm: &BufferPoolManager<D>,
        child_id: PageId,
        new_parent: PageId,
    ) -> Result<(), BPlusTreeError> {
        let child = bpm
            .fetch_page(child_id)
            .ok_or(BPlusTreeError::AllPagesArePinned)?;
        {
            let mut guard = child.write().unwrap();
            set_parent_page_id_raw(&mut guard.0, new_parent);
        }
        bpm.unpin_page(child_id, true);
        Ok(())
    }

    /// Moves the upper `(size + 1) / 2` slots to the tail of `recipient`
    /// (an empty-header or empty-body page), re-parenting each moved
    /// child. Used when this node overflows `max_size` and splits in two.
    pub fn move_half_to<D: DiskManager>(
        data: &mut [u8],
        recipient: &mut [u8],
        bpm: &BufferPoolManager<D>,
    ) -> Result<(), BPlusTreeError> {
        let size = Self::size(data);
        let half = (size + 1) / 2;
        let start = size - half;
        let recipient_id = Self::page_id(recipient);

        for offset in 0..half {
            let slot = Self::read_slot(data, start + offset);
            Self::append_slot(recipient, slot);
        }
        for offset in 0..half {
            let child_id = Self::value_at(data, start + offset);
            Self::reparent_child(bpm, child_id, recipient_id)?;
        }
        Self::increase_size(data, -(half as i32));
        Ok(())
    }

    /// Left-shifts slots `(i + 1..size)` by one and decrements size.
    pub fn remove(data: &mut [u8], i: usize) {
        let size = Self::size(data);
        for j in i..size.saturating_sub(1) {
            let next = Self::read_slot(data, j + 1);
            Self::write_slot(data, j, next);
        }
        Self::increase_size(data, -1);
    }

    /// Decrements size and returns `value_at(0)`. Only meaningful when
    /// collapsing a root whose single remaining child becomes the new root:
    /// once merges leave a root with exactly one child, that child is
    /// promoted and this (now-empty) page is deallocated by the caller.
    pub fn remove_and_return_only_child(data: &mut [u8]) -> PageId {
        Self::increase_size(data, -1);
        Self::value_at(data, 0)
    }

    /// Moves every slot to the tail of `recipient`, rewrites the parent's
    /// pointer at `index_in_parent` to `recipient`, and re-parents each
    /// moved child. Used when this node falls below the minimum occupancy
    /// and merges entirely into a sibling rather than redistributing.
    pub fn move_all_to<D: DiskManager>(
        data: &mut [u8],
        recipient: &mut [u8],
        index_in_parent: usize,
        bpm: &BufferPoolManager<D>,
    ) -> Result<(), BPlusTreeError> {
        let parent_id = Self::parent_page_id(data);
        let recipient_id = Self::page_id(recipient);

        let parent = bpm
            .fetch_page(parent_id)
            .ok_or(BPlusTreeError::AllPagesArePinned)?;
        {
            let mut guard = parent.write().unwrap();
            Self::set_value_at(&mut guard.0, index_in_parent, recipient_id);
        }
        bpm.unpin_page(parent_id, true);

        let size = Self::size(data);
        for i in 0..size {
            let slot = Self::read_slot(data, i);
            Self::append_slot(recipient, slot);
        }
        for i in 0..size {
            let child_id = Self::value_at(data, i);
            Self::reparent_child(bpm, child_id, recipient_id)?;
        }
        Self::increase_size(data, -(size as i32));
        Ok(())
    }

    /// Consults the parent to recompute the correct separator key: the key
    /// currently at `index + 1` in the parent (where `index` is the slot
    /// whose child pointer is `recipient`) becomes the new tail slot's key
    /// in `recipient`, and `incoming.key` becomes the parent's new
    /// separator at that slot. The separator has to come from the parent,
    /// not from the moved pair itself — a separator always describes the
    /// boundary between two siblings as the parent currently sees them.
    /// Finding `index` via `value_index(recipient_id)` ("which slot in the
    /// parent points at me") is the only way to locate that boundary
    /// without already knowing the recipient's position among its
    /// siblings.
    fn copy_last_from<D: DiskManager>(
        recipient: &mut [u8],
        incoming: (K, PageId),
        bpm: &BufferPoolManager<D>,
    ) -> Result<(), BPlusTreeError> {
        let parent_id = Self::parent_page_id(recipient);
        let recipient_id = Self::page_id(recipient);
        let parent = bpm
            .fetch_page(parent_id)
            .ok_or(BPlusTreeError::AllPagesArePinned)?;
        {
            let mut guard = parent.write().unwrap();
            let index = Self::value_index(&guard.0, recipient_id)
                .expect("recipient must be referenced by its own parent");
            let separator = Self::key_at(&guard.0, index + 1);
            Self::append_slot(
                recipient,
                Slot {
                    key: separator,
                    child_page_id: incoming.1 .0,
                },
            );
            Self::set_key_at(&mut guard.0, index + 1, incoming.0);
        }
        bpm.unpin_page(parent_id, true);
        Ok(())
    }

    /// Takes `(key, child) = (key_at(1), value_at(0))`, overwrites
    /// `value_at(0)` with `value_at(1)`, removes slot 1, and appends the
    /// detached pair to `recipient`'s tail via `copy_last_from`, then
    /// re-parents the moved child. Used to redistribute one slot from this
    /// node into its left sibling instead of merging the two outright.
    pub fn move_first_to_end_of<D: DiskManager>(
        data: &mut [u8],
        recipient: &mut [u8],
        bpm: &BufferPoolManager<D>,
    ) -> Result<(), BPlusTreeError> {
        let moved_child = Self::value_at(data, 0);
        let key = Self::key_at(data, 1);
        Self::set_value_at(data, 0, Self::value_at(data, 1));
        Self::remove(data, 1);

        Self::copy_last_from(recipient, (key, moved_child), bpm)?;
        Self::reparent_child(bpm, moved_child, Self::page_id(recipient))?;
        Ok(())
    }

    /// Reads the separator currently at `parent_index`, overwrites the
    /// parent's separator with `incoming`'s key, and splices the incoming
    /// pair into the recipient using `insert_node_after(array[0].child,
    /// old_separator, incoming_child)` — the incoming pair's own child is
    /// what must end up inserted after slot 0, since otherwise the
    /// recipient would gain a duplicate of a child it already has instead
    /// of the one actually being redistributed to it.
    fn copy_first_from<D: DiskManager>(
        recipient: &mut [u8],
        incoming: Slot<K>,
        parent_index: usize,
        bpm: &BufferPoolManager<D>,
    ) -> Result<(), BPlusTreeError> {
        let parent_id = Self::parent_page_id(recipient);
        let parent = bpm
            .fetch_page(parent_id)
            .ok_or(BPlusTreeError::AllPagesArePinned)?;
        let old_separator;
        {
            let mut guard = parent.write().unwrap();
            old_separator = Self::key_at(&guard.0, parent_index);
            Self::set_key_at(&mut guard.0, parent_index, incoming.key);
        }
        bpm.unpin_page(parent_id, true);

        let anchor = Self::value_at(recipient, 0);
        Self::insert_node_after(recipient, anchor, old_separator, PageId(incoming.child_page_id));
        Ok(())
    }

    /// Detaches the last slot (decrementing size first, then reading what
    /// is now one past the end) and splices it onto the front of
    /// `recipient` via `copy_first_from`, re-parenting the moved child.
    /// The mirror image of `move_first_to_end_of`, redistributing into a
    /// right sibling instead of a left one.
    pub fn move_last_to_front_of<D: DiskManager>(
        data: &mut [u8],
        recipient: &mut [u8],
        parent_index: usize,
        bpm: &BufferPoolManager<D>,
    ) -> Result<(), BPlusTreeError> {
        Self::increase_size(data, -1);
        let detached_index = Self::size(data);
        let pair = Self::read_slot(data, detached_index);
        let child_id = PageId(pair.child_page_id);

        Self::copy_first_from(recipient, pair, parent_index, bpm)?;
        Self::reparent_child(bpm, child_id, Self::page_id(recipient))?;
        Ok(())
    }

    /// Debug helper: fetches each child through the pool and appends its
    /// id to `queue`. Fails if any page is unfetchable.
    pub fn queue_up_children<D: DiskManager>(
        data: &[u8],
        queue: &mut VecDeque<PageId>,
        bpm: &BufferPoolManager<D>,
    ) -> Result<(), BPlusTreeError> {
        for i in 0..Self::size(data) {
            let child_id = Self::value_at(data, i);
            bpm.fetch_page(child_id)
                .ok_or(BPlusTreeError::AllPagesArePinned)?;
            bpm.unpin_page(child_id, false);
            queue.push_back(child_id);
        }
        Ok(())
    }

    /// Renders a node's slots for test assertions and manual inspection,
    /// ported from the original's `ToString(bool verbose)`.
    pub fn to_debug_string(data: &[u8], verbose: bool) -> String
    where
        K: std::fmt::Debug,
    {
        let size = Self::size(data);
        if size == 0 {
            return String::new();
        }
        let mut out = String::new();
        if verbose {
            out.push_str(&format!(
                "[pageId: {:?} parentId: {:?}]<{}> ",
                Self::page_id(data),
                Self::parent_page_id(data),
                size
            ));
        }
        let start = if verbose { 0 } else { 1 };
        for i in start..size {
            if i > start {
                out.push(' ');
            }
            out.push_str(&format!("{:?}", Self::key_at(data, i)));
            if verbose {
                out.push_str(&format!("({:?})", Self::value_at(data, i)));
            }
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::disk::disk_manager::DiskManagerInstance;
    use std::sync::Arc;

    type Node = BPlusTreeInternalPage<i64>;

    fn page_buf() -> [u8; PAGE_SIZE] {
        [0u8; PAGE_SIZE]
    }

    #[test]
    fn init_sets_header_fields() {
        let mut buf = page_buf();
        Node::init(&mut buf, PageId(1), PageId(0));
        assert_eq!(Node::page_id(&buf), PageId(1));
        assert_eq!(Node::parent_page_id(&buf), PageId(0));
        assert_eq!(Node::size(&buf), 1);
        assert_eq!(Node::max_size(), (PAGE_SIZE - HEADER_SIZE) / Node::SLOT_SIZE);
    }

    #[test]
    fn lookup_finds_containing_child() {
        let mut buf = page_buf();
        Node::init(&mut buf, PageId(1), PageId(0));
        Node::populate_new_root(&mut buf, PageId(1), 5, PageId(5));
        Node::insert_node_after(&mut buf, PageId(5), 9, PageId(9));

        let cmp = |a: &i64, b: &i64| a.cmp(b);
        assert_eq!(Node::lookup(&buf, &4, cmp), PageId(1));
        assert_eq!(Node::lookup(&buf, &5, cmp), PageId(5));
        assert_eq!(Node::lookup(&buf, &100, cmp), PageId(9));
    }

    #[test]
    fn insert_node_after_shifts_and_grows_size() {
        let mut buf = page_buf();
        Node::init(&mut buf, PageId(1), PageId(0));
        Node::populate_new_root(&mut buf, PageId(1), 10, PageId(2));
        let new_size = Node::insert_node_after(&mut buf, PageId(1), 5, PageId(3));
        assert_eq!(new_size, 3);
        assert_eq!(Node::value_at(&buf, 0), PageId(1));
        assert_eq!(Node::key_at(&buf, 1), 5);
        assert_eq!(Node::value_at(&buf, 1), PageId(3));
        assert_eq!(Node::key_at(&buf, 2), 10);
        assert_eq!(Node::value_at(&buf, 2), PageId(2));
    }

    #[test]
    fn keys_stay_strictly_increasing_after_a_sequence_of_inserts() {
        let mut buf = page_buf();
        Node::init(&mut buf, PageId(1), PageId(0));
        Node::populate_new_root(&mut buf, PageId(100), 20, PageId(200));
        // Each insert anchors after the child it's splitting off from, the
        // way a real split propagates a new separator up to its parent —
        // never in key order, since the caller doesn't know the final
        // layout in advance.
        Node::insert_node_after(&mut buf, PageId(200), 30, PageId(300));
        Node::insert_node_after(&mut buf, PageId(100), 10, PageId(150));
        Node::insert_node_after(&mut buf, PageId(150), 15, PageId(175));

        assert_eq!(Node::size(&buf), 5);
        for i in 1..Node::size(&buf) - 1 {
            assert!(
                Node::key_at(&buf, i) < Node::key_at(&buf, i + 1),
                "key_at({i}) = {:?} should be less than key_at({}) = {:?}",
                Node::key_at(&buf, i),
                i + 1,
                Node::key_at(&buf, i + 1),
            );
        }
        assert_eq!(
            (1..Node::size(&buf)).map(|i| Node::key_at(&buf, i)).collect::<Vec<_>>(),
            vec![10, 15, 20, 30],
        );
    }

    #[test]
    fn value_index_finds_child_pointer() {
        let mut buf = page_buf();
        Node::init(&mut buf, PageId(1), PageId(0));
        Node::populate_new_root(&mut buf, PageId(1), 10, PageId(2));
        assert_eq!(Node::value_index(&buf, PageId(2)), Some(1));
        assert_eq!(Node::value_index(&buf, PageId(42)), None);
    }

    #[test]
    fn remove_shifts_left_and_shrinks() {
        let mut buf = page_buf();
        Node::init(&mut buf, PageId(1), PageId(0));
        Node::populate_new_root(&mut buf, PageId(1), 10, PageId(2));
        Node::insert_node_after(&mut buf, PageId(2), 20, PageId(3));
        Node::remove(&mut buf, 1);
        assert_eq!(Node::size(&buf), 2);
        assert_eq!(Node::key_at(&buf, 1), 20);
        assert_eq!(Node::value_at(&buf, 1), PageId(3));
    }

    #[test]
    fn remove_and_return_only_child() {
        let mut buf = page_buf();
        Node::init(&mut buf, PageId(1), PageId(0));
        Node::populate_new_root(&mut buf, PageId(7), 10, PageId(2));
        Node::remove(&mut buf, 1);
        assert_eq!(Node::remove_and_return_only_child(&mut buf), PageId(7));
        assert_eq!(Node::size(&buf), 0);
    }

    #[test]
    fn move_half_to_splits_and_reparents() {
        let _ = std::fs::remove_file("test_internal_move_half.db");
        let disk_manager = Arc::new(DiskManagerInstance::new("test_internal_move_half"));
        let bpm = BufferPoolManager::new(10, disk_manager);

        let (child_a, _) = bpm.new_page().unwrap();
        bpm.unpin_page(child_a, false);
        let (child_b, _) = bpm.new_page().unwrap();
        bpm.unpin_page(child_b, false);
        let (child_c, _) = bpm.new_page().unwrap();
        bpm.unpin_page(child_c, false);

        let (left_id, left_data) = bpm.new_page().unwrap();
        let (right_id, right_data) = bpm.new_page().unwrap();

        {
            let mut left = left_data.write().unwrap();
            Node::init(&mut left.0, left_id, PageId::INVALID);
            Node::populate_new_root(&mut left.0, child_a, 10, child_b);
            Node::insert_node_after(&mut left.0, child_b, 20, child_c);
        }
        {
            let mut right = right_data.write().unwrap();
            Node::init(&mut right.0, right_id, PageId::INVALID);
            // move_half_to expects an empty-body recipient; drop the
            // sentinel slot 0 so the size starts at zero.
            Node::remove(&mut right.0, 0);
        }

        {
            let mut left = left_data.write().unwrap();
            let mut right = right_data.write().unwrap();
            Node::move_half_to(&mut left.0, &mut right.0, &bpm).unwrap();
        }

        let left = left_data.read().unwrap();
        let right = right_data.read().unwrap();
        assert_eq!(Node::size(&left.0) + Node::size(&right.0), 3);
        assert_eq!(Node::parent_page_id(&bpm.fetch_page(child_c).unwrap().read().unwrap().0), right_id);
        bpm.unpin_page(child_c, false);

        drop(left);
        drop(right);
        bpm.unpin_page(left_id, true);
        bpm.unpin_page(right_id, true);
        std::fs::remove_file("test_internal_move_half.db").unwrap();
    }
}
