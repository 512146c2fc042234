use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use hashlink::LinkedHashMap;
use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::buffer::lru_k_replacer::{AccessType, LruKReplacer};
use crate::common::config::{
    FrameId, PageData, PageId, DEFAULT_SCHEDULER_WORKERS, INVALID_PAGE_ID, PAGE_SIZE,
};
use crate::storage::disk::manager::DiskManager;
use crate::storage::disk::scheduler::{DiskData, DiskRequest, DiskScheduler};
use crate::storage::page::page_guard::{PageGuard, ReadPageGuard, WritePageGuard};

/// An in-memory slot holding one page plus its metadata.
///
/// The byte buffer sits behind its own reader/writer latch, acquired by the
/// latched page guards and by scheduler workers filling the frame. The
/// metadata fields are governed by the pool latch; they are atomics so that
/// guards and tests can read them without taking it.
pub struct FrameHeader {
    frame_id: FrameId,
    page_id: AtomicU32,
    pin_count: AtomicU32,
    is_dirty: AtomicBool,
    data: Arc<RwLock<PageData>>,
}

impl FrameHeader {
    fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: AtomicU32::new(INVALID_PAGE_ID),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
            data: Arc::new(RwLock::new([0; PAGE_SIZE])),
        }
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn page_id(&self) -> PageId {
        self.page_id.load(Ordering::Acquire)
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Acquire)
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Acquire)
    }

    /// The page bytes behind their latch.
    pub fn data(&self) -> &Arc<RwLock<PageData>> {
        &self.data
    }

    fn reset(&self) {
        self.page_id.store(INVALID_PAGE_ID, Ordering::Release);
        self.pin_count.store(0, Ordering::Release);
        self.is_dirty.store(false, Ordering::Release);
    }
}

/// Structures the pool latch guards: the resident-page directory and the
/// list of frames holding no page. The directory keeps insertion order so
/// `flush_all_pages` walks residents deterministically.
struct PoolInner {
    page_table: LinkedHashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
}

/// The buffer pool: a bounded cache of disk pages with pin-count lifetimes,
/// LRU-K eviction and write-back of dirty victims.
///
/// Lock order is pool latch, then replacer mutex, then per-frame latches
/// (the latter only after the pool latch is released). Disk I/O issued by
/// the pool is awaited while the pool latch is held, which makes every pool
/// operation linearizable at the cost of stalling the pool for the duration
/// of the transfer. Scheduler workers never take the pool latch.
pub struct BufferPoolManager {
    pool_size: usize,
    frames: Vec<Arc<FrameHeader>>,
    latch: Mutex<PoolInner>,
    replacer: Mutex<LruKReplacer>,
    disk_scheduler: DiskScheduler,
    next_page_id: AtomicU32,
}

impl BufferPoolManager {
    pub fn new(pool_size: usize, disk_manager: Arc<dyn DiskManager>, replacer_k: usize) -> Self {
        Self::with_io_workers(pool_size, disk_manager, replacer_k, DEFAULT_SCHEDULER_WORKERS)
    }

    pub fn with_io_workers(
        pool_size: usize,
        disk_manager: Arc<dyn DiskManager>,
        replacer_k: usize,
        io_workers: usize,
    ) -> Self {
        let frames = (0..pool_size)
            .map(|frame_id| Arc::new(FrameHeader::new(frame_id)))
            .collect();

        Self {
            pool_size,
            frames,
            latch: Mutex::new(PoolInner {
                page_table: LinkedHashMap::with_capacity(pool_size),
                free_list: (0..pool_size).collect(),
            }),
            replacer: Mutex::new(LruKReplacer::new(pool_size, replacer_k)),
            disk_scheduler: DiskScheduler::with_workers(disk_manager, io_workers),
            next_page_id: AtomicU32::new(0),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Allocates a fresh page bound to a frame with `pin_count == 1`.
    /// Returns `None` when every frame is pinned.
    pub fn new_page(&self) -> Option<Arc<FrameHeader>> {
        let mut inner = self.latch.lock();
        let frame_id = self.acquire_victim_frame(&mut inner)?;
        let frame = &self.frames[frame_id];

        let page_id = self.allocate_page();
        frame.data.write().fill(0);
        frame.page_id.store(page_id, Ordering::Release);
        frame.is_dirty.store(false, Ordering::Release);
        frame.pin_count.store(1, Ordering::Release);
        inner.page_table.insert(page_id, frame_id);

        self.pin_in_replacer(frame_id, AccessType::Unknown);
        Some(Arc::clone(frame))
    }

    /// Returns the frame holding `page_id`, reading it from disk on a miss.
    /// The frame comes back pinned; `None` means the page is absent from the
    /// cache and no frame could be freed for it.
    pub fn fetch_page(&self, page_id: PageId, access_type: AccessType) -> Option<Arc<FrameHeader>> {
        let mut inner = self.latch.lock();

        if let Some(&frame_id) = inner.page_table.get(&page_id) {
            let frame = &self.frames[frame_id];
            frame.pin_count.fetch_add(1, Ordering::AcqRel);
            self.pin_in_replacer(frame_id, access_type);
            return Some(Arc::clone(frame));
        }

        let frame_id = self.acquire_victim_frame(&mut inner)?;
        let frame = &self.frames[frame_id];
        frame.page_id.store(page_id, Ordering::Release);
        inner.page_table.insert(page_id, frame_id);

        let (callback, completion) = DiskScheduler::create_promise();
        self.disk_scheduler.schedule(DiskRequest {
            data: DiskData::Read(Arc::clone(&frame.data)),
            page_id,
            callback,
        });
        if !completion.blocking_recv().unwrap_or(false) {
            // Read failure is fatal for this fetch; give the frame back.
            inner.page_table.remove(&page_id);
            frame.reset();
            inner.free_list.push_back(frame_id);
            return None;
        }

        frame.pin_count.store(1, Ordering::Release);
        self.pin_in_replacer(frame_id, access_type);
        Some(Arc::clone(frame))
    }

    /// Releases one pin on `page_id`, folding `is_dirty` into the frame's
    /// dirty flag. The frame becomes evictable when the last pin goes.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool, _access_type: AccessType) -> bool {
        let inner = self.latch.lock();
        let Some(&frame_id) = inner.page_table.get(&page_id) else {
            return false;
        };

        let frame = &self.frames[frame_id];
        if frame.pin_count() == 0 {
            return false;
        }

        let remaining = frame.pin_count.fetch_sub(1, Ordering::AcqRel) - 1;
        if is_dirty {
            frame.is_dirty.store(true, Ordering::Release);
        }
        if remaining == 0 {
            self.replacer
                .lock()
                .set_evictable(frame_id, true)
                .expect("resident frame is tracked by the replacer");
        }
        true
    }

    /// Writes the page out regardless of its dirty state; `false` on a miss.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        let inner = self.latch.lock();
        let Some(&frame_id) = inner.page_table.get(&page_id) else {
            return false;
        };
        self.write_frame_to_disk(&self.frames[frame_id])
    }

    pub fn flush_all_pages(&self) {
        let inner = self.latch.lock();
        for (_, &frame_id) in inner.page_table.iter() {
            self.write_frame_to_disk(&self.frames[frame_id]);
        }
    }

    /// Drops `page_id` from the cache and deallocates it. Idempotent on a
    /// miss; refuses while the page is pinned.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut inner = self.latch.lock();
        let Some(&frame_id) = inner.page_table.get(&page_id) else {
            return true;
        };

        let frame = &self.frames[frame_id];
        if frame.pin_count() > 0 {
            return false;
        }

        inner.page_table.remove(&page_id);
        self.replacer
            .lock()
            .remove(frame_id)
            .expect("unpinned frame is evictable");
        frame.data.write().fill(0);
        frame.reset();
        inner.free_list.push_back(frame_id);
        self.deallocate_page(page_id);
        true
    }

    pub fn fetch_page_basic(self: &Arc<Self>, page_id: PageId) -> Option<PageGuard> {
        let frame = self.fetch_page(page_id, AccessType::Unknown)?;
        Some(PageGuard::new(Arc::clone(self), frame))
    }

    pub fn fetch_page_read(self: &Arc<Self>, page_id: PageId) -> Option<ReadPageGuard> {
        self.fetch_page_basic(page_id).map(PageGuard::upgrade_read)
    }

    pub fn fetch_page_write(self: &Arc<Self>, page_id: PageId) -> Option<WritePageGuard> {
        self.fetch_page_basic(page_id).map(PageGuard::upgrade_write)
    }

    pub fn new_page_guarded(self: &Arc<Self>) -> Option<PageGuard> {
        let frame = self.new_page()?;
        Some(PageGuard::new(Arc::clone(self), frame))
    }

    /// Frees a frame for reuse: the free list first, then an eviction victim
    /// with its dirty bytes written back before the directory forgets it.
    fn acquire_victim_frame(&self, inner: &mut PoolInner) -> Option<FrameId> {
        if let Some(frame_id) = inner.free_list.pop_front() {
            return Some(frame_id);
        }

        let frame_id = self.replacer.lock().evict()?;
        let frame = &self.frames[frame_id];
        let old_page_id = frame.page_id();
        if frame.is_dirty() {
            debug!("evicting dirty page {} from frame {}", old_page_id, frame_id);
            self.write_frame_to_disk(frame);
        }
        inner.page_table.remove(&old_page_id);
        frame.reset();
        Some(frame_id)
    }

    /// Schedules a write of the frame's current bytes and waits for the
    /// completion; clears the dirty flag on success.
    fn write_frame_to_disk(&self, frame: &FrameHeader) -> bool {
        let buffer: Box<[u8]> = {
            let data = frame.data.read();
            Box::from(&data[..])
        };

        let (callback, completion) = DiskScheduler::create_promise();
        self.disk_scheduler.schedule(DiskRequest {
            data: DiskData::Write(buffer),
            page_id: frame.page_id(),
            callback,
        });

        let flushed = completion.blocking_recv().unwrap_or(false);
        if flushed {
            frame.is_dirty.store(false, Ordering::Release);
        }
        flushed
    }

    /// Marks a just-pinned frame in the replacer: record the access, keep it
    /// off the victim list.
    fn pin_in_replacer(&self, frame_id: FrameId, access_type: AccessType) {
        let mut replacer = self.replacer.lock();
        replacer
            .record_access(frame_id, access_type)
            .expect("frame id within pool bounds");
        replacer
            .set_evictable(frame_id, false)
            .expect("frame tracked after recorded access");
    }

    fn allocate_page(&self) -> PageId {
        self.next_page_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Bookkeeping no-op: ids are monotonic and never handed out twice.
    fn deallocate_page(&self, _page_id: PageId) {}
}
