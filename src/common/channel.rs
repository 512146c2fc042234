use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// Unbounded multi-producer multi-consumer FIFO.
///
/// `put` never blocks; `get` parks the caller until an element arrives. The
/// disk scheduler instantiates this as `Channel<Option<DiskRequest>>` and
/// pushes one `None` per consumer at shutdown.
pub struct Channel<T> {
    queue: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> Channel<T> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    pub fn put(&self, element: T) {
        let mut queue = self.queue.lock();
        queue.push_back(element);
        self.available.notify_one();
    }

    pub fn get(&self) -> T {
        let mut queue = self.queue.lock();
        loop {
            if let Some(element) = queue.pop_front() {
                return element;
            }
            self.available.wait(&mut queue);
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}
