use std::sync::Arc;

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::buffer::buffer_pool_manager::{BufferPoolManager, FrameHeader};
use crate::buffer::lru_k_replacer::AccessType;
use crate::common::config::{PageData, PageId};

/// Scoped ownership of one pin on a cached frame.
///
/// Constructing a guard wraps a pin the caller already holds (the guarded
/// fetchers on the pool hand frames over pre-pinned); dropping it releases
/// that pin, along with the dirty flag the guard accumulated. Rust's move
/// semantics carry the pin between guards without touching the count, and a
/// moved-from guard is left empty so its drop is a no-op.
pub struct PageGuard {
    bpm: Option<Arc<BufferPoolManager>>,
    frame: Option<Arc<FrameHeader>>,
    is_dirty: bool,
}

impl PageGuard {
    /// Wraps a frame whose pin the caller already owns.
    pub fn new(bpm: Arc<BufferPoolManager>, frame: Arc<FrameHeader>) -> Self {
        Self {
            bpm: Some(bpm),
            frame: Some(frame),
            is_dirty: false,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.frame().page_id()
    }

    pub fn frame(&self) -> &Arc<FrameHeader> {
        self.frame.as_ref().expect("page guard used after drop")
    }

    /// Borrows the page bytes under a short-lived shared latch.
    pub fn read(&self) -> RwLockReadGuard<'_, PageData> {
        self.frame().data().read()
    }

    /// Borrows the page bytes mutably under a short-lived exclusive latch
    /// and marks the guard dirty.
    pub fn write(&mut self) -> RwLockWriteGuard<'_, PageData> {
        self.is_dirty = true;
        self.frame.as_ref().expect("page guard used after drop").data().write()
    }

    /// Trades this guard for one holding the shared latch. The pin moves
    /// over; nothing is unpinned in between.
    pub fn upgrade_read(mut self) -> ReadPageGuard {
        let (bpm, frame, is_dirty) = self.take_parts().expect("page guard used after drop");
        let latch = frame.data().read_arc();
        ReadPageGuard {
            latch,
            guard: Self {
                bpm: Some(bpm),
                frame: Some(frame),
                is_dirty,
            },
        }
    }

    /// Trades this guard for one holding the exclusive latch.
    pub fn upgrade_write(mut self) -> WritePageGuard {
        let (bpm, frame, is_dirty) = self.take_parts().expect("page guard used after drop");
        let latch = frame.data().write_arc();
        WritePageGuard {
            latch,
            guard: Self {
                bpm: Some(bpm),
                frame: Some(frame),
                is_dirty,
            },
        }
    }

    /// Drains the guard, leaving its drop a no-op.
    fn take_parts(&mut self) -> Option<(Arc<BufferPoolManager>, Arc<FrameHeader>, bool)> {
        match (self.bpm.take(), self.frame.take()) {
            (Some(bpm), Some(frame)) => Some((bpm, frame, self.is_dirty)),
            _ => None,
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some((bpm, frame, is_dirty)) = self.take_parts() {
            bpm.unpin_page(frame.page_id(), is_dirty, AccessType::Unknown);
        }
    }
}

/// A page guard that also holds the shared latch on the page bytes for its
/// whole lifetime. Field order releases the latch before the pin.
pub struct ReadPageGuard {
    latch: ArcRwLockReadGuard<RawRwLock, PageData>,
    guard: PageGuard,
}

impl ReadPageGuard {
    /// Latches an already-pinned frame for shared access.
    pub fn new(bpm: Arc<BufferPoolManager>, frame: Arc<FrameHeader>) -> Self {
        PageGuard::new(bpm, frame).upgrade_read()
    }

    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    pub fn data(&self) -> &PageData {
        &self.latch
    }
}

/// A page guard holding the exclusive latch. Dropping it marks the frame
/// dirty, then releases the latch, then the pin.
pub struct WritePageGuard {
    latch: ArcRwLockWriteGuard<RawRwLock, PageData>,
    guard: PageGuard,
}

impl WritePageGuard {
    /// Latches an already-pinned frame for exclusive access.
    pub fn new(bpm: Arc<BufferPoolManager>, frame: Arc<FrameHeader>) -> Self {
        PageGuard::new(bpm, frame).upgrade_write()
    }

    pub fn page_id(&self) -> PageId {
        self.guard.page_id()
    }

    pub fn data(&self) -> &PageData {
        &self.latch
    }

    pub fn data_mut(&mut self) -> &mut PageData {
        &mut self.latch
    }
}

impl Drop for WritePageGuard {
    fn drop(&mut self) {
        self.guard.is_dirty = true;
    }
}
