//! Compile-time constants and identifier aliases shared across the crate.

/// Size of a page on disk and of every frame in the buffer pool.
pub const PAGE_SIZE: usize = 1024 * 4;

/// Identifies a page of the underlying store.
pub type PageId = u32;

/// Sentinel for a frame that holds no page.
pub const INVALID_PAGE_ID: PageId = PageId::MAX;

/// Index into the buffer pool's frame array, always in `[0, pool_size)`.
pub type FrameId = usize;

/// One page worth of bytes.
pub type PageData = [u8; PAGE_SIZE];

/// Worker threads the disk scheduler spawns unless configured otherwise.
pub const DEFAULT_SCHEDULER_WORKERS: usize = 4;

/// History depth used by the replacer unless configured otherwise.
pub const DEFAULT_REPLACER_K: usize = 2;
