use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::warn;
use parking_lot::RwLock;
use tokio::sync::oneshot;

use crate::common::channel::Channel;
use crate::common::config::{PageData, PageId, DEFAULT_SCHEDULER_WORKERS};
use crate::storage::disk::manager::DiskManager;

/// Payload of a disk request; the variant doubles as the transfer direction.
pub enum DiskData {
    /// Owned copy of the outgoing page bytes, moved to the worker.
    Write(Box<[u8]>),
    /// Destination frame buffer, shared with the worker that fills it.
    Read(Arc<RwLock<PageData>>),
}

pub struct DiskRequest {
    pub data: DiskData,

    /// ID of the page being read from / written to disk.
    pub page_id: PageId,

    /// Fulfilled with the outcome once the worker has finished the transfer.
    pub callback: oneshot::Sender<bool>,
}

/// Schedules disk read and write operations over a pool of worker threads.
///
/// `schedule` enqueues and returns; the issuer blocks on the request's
/// completion receiver when it needs the result. Requests are dequeued in
/// FIFO order, but with more than one worker completions are unordered
/// relative to submission - callers that need write-before-read ordering on
/// a page chain the completions themselves.
pub struct DiskScheduler {
    request_queue: Arc<Channel<Option<DiskRequest>>>,
    workers: Vec<JoinHandle<()>>,
}

impl DiskScheduler {
    pub fn new(disk_manager: Arc<dyn DiskManager>) -> Self {
        Self::with_workers(disk_manager, DEFAULT_SCHEDULER_WORKERS)
    }

    pub fn with_workers(disk_manager: Arc<dyn DiskManager>, num_workers: usize) -> Self {
        assert!(num_workers > 0, "scheduler needs at least one worker");

        let request_queue = Arc::new(Channel::new());
        let workers = (0..num_workers)
            .map(|_| {
                let queue = Arc::clone(&request_queue);
                let disk_manager = Arc::clone(&disk_manager);
                thread::spawn(move || Self::worker_loop(queue, disk_manager))
            })
            .collect();

        Self {
            request_queue,
            workers,
        }
    }

    pub fn schedule(&self, request: DiskRequest) {
        self.request_queue.put(Some(request));
    }

    /// One-shot completion pair for a request. The worker fulfills the sender
    /// exactly once; the issuer awaits the receiver exactly once.
    pub fn create_promise() -> (oneshot::Sender<bool>, oneshot::Receiver<bool>) {
        oneshot::channel()
    }

    fn worker_loop(queue: Arc<Channel<Option<DiskRequest>>>, disk_manager: Arc<dyn DiskManager>) {
        while let Some(request) = queue.get() {
            let outcome = match request.data {
                DiskData::Write(buffer) => disk_manager.write_page(request.page_id, &buffer),
                DiskData::Read(buffer) => {
                    let mut frame = buffer.write();
                    disk_manager.read_page(request.page_id, &mut frame[..])
                }
            };

            if let Err(err) = &outcome {
                warn!("disk request for page {} failed: {}", request.page_id, err);
            }

            // The issuer may have dropped its receiver; nothing left to signal.
            let _ = request.callback.send(outcome.is_ok());
        }
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        // One sentinel per worker, then wait for the queue to drain.
        for _ in &self.workers {
            self.request_queue.put(None);
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("disk scheduler worker panicked");
            }
        }
    }
}
