#[cfg(test)]
pub mod test {
    use std::sync::Arc;
    use std::thread;

    use crate::buffer::buffer_pool_manager::BufferPoolManager;
    use crate::storage::disk::manager::{DiskManager, MemoryDiskManager};
    use crate::storage::page::page_guard::{PageGuard, ReadPageGuard};

    fn test_pool(pool_size: usize, k: usize) -> Arc<BufferPoolManager> {
        let disk_manager = Arc::new(MemoryDiskManager::new()) as Arc<dyn DiskManager>;
        Arc::new(BufferPoolManager::new(pool_size, disk_manager, k))
    }

    #[test]
    fn basic_guard_releases_the_pin_on_drop() {
        let bpm = test_pool(5, 2);

        let frame = bpm.new_page().expect("pool has free frames");
        let guard = PageGuard::new(Arc::clone(&bpm), Arc::clone(&frame));
        assert_eq!(frame.page_id(), guard.page_id());
        assert_eq!(1, frame.pin_count());

        drop(guard);
        assert_eq!(0, frame.pin_count());
    }

    #[test]
    fn read_guards_share_one_pin() {
        let bpm = test_pool(5, 2);

        let frame = bpm.new_page().unwrap();
        {
            let _guard2 = ReadPageGuard::new(Arc::clone(&bpm), Arc::clone(&frame));
            let _guard3 = ReadPageGuard::new(Arc::clone(&bpm), Arc::clone(&frame));
            assert_eq!(1, frame.pin_count());
        }
        assert_eq!(0, frame.pin_count());
    }

    #[test]
    fn moving_a_guard_keeps_the_pin() {
        let bpm = test_pool(5, 2);

        let frame = bpm.new_page().unwrap();
        {
            assert_eq!(1, frame.pin_count());
            let guard1 = PageGuard::new(Arc::clone(&bpm), Arc::clone(&frame));
            assert_eq!(1, frame.pin_count());
            let _guard2 = guard1;
            assert_eq!(1, frame.pin_count());
        }
        assert_eq!(0, frame.pin_count());
    }

    #[test]
    fn upgrade_hands_the_pin_to_the_latched_guard() {
        let bpm = test_pool(5, 2);

        let guard = bpm.new_page_guarded().unwrap();
        let frame = Arc::clone(guard.frame());
        assert_eq!(1, frame.pin_count());

        let write_guard = guard.upgrade_write();
        assert_eq!(1, frame.pin_count());

        drop(write_guard);
        assert_eq!(0, frame.pin_count());
        // Dropping a write guard always leaves the frame dirty.
        assert!(frame.is_dirty());
    }

    #[test]
    fn parallel_readers_see_the_same_bytes() {
        const READERS: usize = 100;

        let bpm = test_pool(10, 3);
        let frame = bpm.new_page().unwrap();
        let page_id = frame.page_id();
        frame.data().write()[..4].copy_from_slice(b"test");

        assert_eq!(1, frame.pin_count());
        let mut readers = Vec::new();
        for _ in 0..READERS {
            let bpm = Arc::clone(&bpm);
            readers.push(thread::spawn(move || {
                let guard = bpm.fetch_page_read(page_id).expect("pinned page stays resident");
                assert_eq!(b"test", &guard.data()[..4]);
            }));
        }
        for reader in readers {
            reader.join().unwrap();
        }

        // Only the original pin from new_page survives.
        assert_eq!(1, frame.pin_count());
        {
            let guard = ReadPageGuard::new(Arc::clone(&bpm), Arc::clone(&frame));
            assert_eq!(b"test", &guard.data()[..4]);
        }
        assert_eq!(0, frame.pin_count());
    }

    #[test]
    fn parallel_writers_each_append_a_marker() {
        const WRITERS: usize = 100;

        let bpm = test_pool(10, 3);
        let frame = bpm.new_page().unwrap();
        let page_id = frame.page_id();

        assert_eq!(1, frame.pin_count());
        let mut writers = Vec::new();
        for _ in 0..WRITERS {
            let bpm = Arc::clone(&bpm);
            writers.push(thread::spawn(move || {
                let mut guard = bpm.fetch_page_write(page_id).expect("pinned page stays resident");
                let data = guard.data_mut();
                let end = data.iter().position(|&b| b == 0).expect("page has room");
                data[end] = b'#';
            }));
        }
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(1, frame.pin_count());
        {
            let guard = bpm.fetch_page_read(page_id).unwrap();
            let data = guard.data();
            assert!(data[..WRITERS].iter().all(|&b| b == b'#'));
            assert_eq!(0, data[WRITERS]);
        }
        assert_eq!(1, frame.pin_count());
    }
}
