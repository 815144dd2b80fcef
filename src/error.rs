use thiserror::Error;

/// Errors raised by the buffer pool manager.
///
/// `Find`/`Unpin`/`Flush`/`Delete` of an absent or already-idle page stay
/// `bool`/`Option` per the pool's contract (absence is not exceptional); this
/// type only covers the escalation rungs above that: frame exhaustion and
/// programmer misuse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferPoolError {
    #[error("all frames are pinned and the free list is empty")]
    PoolExhausted,

    #[error("page {0:?} is not resident in the buffer pool")]
    PageNotResident(crate::buffer::replacer::PageId),

    #[error("page {0:?} was unpinned with a pin count of zero")]
    UnpinUnpinnedPage(crate::buffer::replacer::PageId),
}

/// Errors raised while maintaining a B+-tree internal page.
///
/// Internal-page operations fetch sibling/parent/child pages through the
/// buffer pool as they run; any of those fetches can fail if every frame is
/// pinned. That condition is structural, not recoverable by retrying the
/// same operation, so it is surfaced as a typed error rather than a silent
/// `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BPlusTreeError {
    #[error("all pages are pinned right now")]
    AllPagesArePinned,

    #[error("buffer pool error: {0}")]
    BufferPool(#[from] BufferPoolError),
}
