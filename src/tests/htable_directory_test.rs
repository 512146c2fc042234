#[cfg(test)]
pub mod test {
    use std::sync::Arc;

    use crate::buffer::buffer_pool_manager::BufferPoolManager;
    use crate::common::config::{INVALID_PAGE_ID, PAGE_SIZE};
    use crate::storage::disk::manager::{DiskManager, MemoryDiskManager};
    use crate::storage::page::htable_directory_page::HashTableDirectoryPage;

    #[test]
    fn fresh_directory_is_depth_zero() {
        let directory = HashTableDirectoryPage::init(3);

        assert_eq!(3, directory.max_depth());
        assert_eq!(0, directory.global_depth());
        assert_eq!(1, directory.size());
        assert_eq!(8, directory.max_size());
        assert_eq!(INVALID_PAGE_ID, directory.bucket_page_id(0));
        // Depth zero maps every hash to the single bucket.
        assert_eq!(0, directory.hash_to_bucket_index(0xdeadbeef));
    }

    #[test]
    fn hash_uses_the_low_global_depth_bits() {
        let mut directory = HashTableDirectoryPage::init(4);
        directory.incr_global_depth();
        directory.incr_global_depth();

        assert_eq!(2, directory.global_depth());
        assert_eq!(0b11, directory.global_depth_mask());
        assert_eq!(0b10, directory.hash_to_bucket_index(0b0110));
    }

    #[test]
    fn growing_mirrors_the_existing_mappings() {
        let mut directory = HashTableDirectoryPage::init(3);
        directory.set_bucket_page_id(0, 7);
        directory.set_local_depth(0, 0);

        directory.incr_global_depth();
        assert_eq!(2, directory.size());
        assert_eq!(7, directory.bucket_page_id(0));
        assert_eq!(7, directory.bucket_page_id(1));
        assert_eq!(directory.local_depth(0), directory.local_depth(1));

        // Saturates at max_depth.
        directory.incr_global_depth();
        directory.incr_global_depth();
        assert_eq!(3, directory.global_depth());
        directory.incr_global_depth();
        assert_eq!(3, directory.global_depth());
    }

    #[test]
    fn split_image_flips_the_local_depth_bits() {
        let mut directory = HashTableDirectoryPage::init(3);
        directory.incr_global_depth();
        directory.incr_global_depth();

        directory.set_local_depth(0b01, 2);
        assert_eq!(0b10, directory.split_image_index(0b01));

        directory.set_local_depth(0b11, 1);
        assert_eq!(0b10, directory.split_image_index(0b11));
    }

    #[test]
    fn shrink_requires_headroom_on_every_bucket() {
        let mut directory = HashTableDirectoryPage::init(3);
        assert!(!directory.can_shrink());

        directory.incr_global_depth();
        directory.set_local_depth(0, 1);
        directory.set_local_depth(1, 1);
        assert!(!directory.can_shrink());
        directory.decr_global_depth();
        assert_eq!(1, directory.global_depth());

        directory.set_local_depth(0, 0);
        directory.set_local_depth(1, 0);
        assert!(directory.can_shrink());
        directory.decr_global_depth();
        assert_eq!(0, directory.global_depth());
        assert_eq!(1, directory.size());
    }

    #[test]
    fn codec_round_trips_through_a_page() {
        let mut directory = HashTableDirectoryPage::init(4);
        directory.incr_global_depth();
        directory.set_bucket_page_id(0, 11);
        directory.set_bucket_page_id(1, 12);
        directory.set_local_depth(0, 1);
        directory.set_local_depth(1, 1);

        let mut page = [0u8; PAGE_SIZE];
        directory.write_to_page(&mut page).unwrap();

        let decoded = HashTableDirectoryPage::from_page(&page).unwrap();
        assert_eq!(4, decoded.max_depth());
        assert_eq!(1, decoded.global_depth());
        assert_eq!(11, decoded.bucket_page_id(0));
        assert_eq!(12, decoded.bucket_page_id(1));
        assert_eq!(1, decoded.local_depth(0));
    }

    #[test]
    fn directory_lives_behind_a_page_guard() {
        let disk_manager = Arc::new(MemoryDiskManager::new()) as Arc<dyn DiskManager>;
        let bpm = Arc::new(BufferPoolManager::new(2, disk_manager, 2));

        let page_id = {
            let mut guard = bpm.new_page_guarded().unwrap().upgrade_write();
            let mut directory = HashTableDirectoryPage::init(2);
            directory.incr_global_depth();
            directory.set_bucket_page_id(0, 5);
            directory.set_bucket_page_id(1, 6);
            directory.write_to_page(guard.data_mut()).unwrap();
            guard.page_id()
        };

        // Push the directory page out of the cache and read it back.
        for _ in 0..2 {
            let _ = bpm.new_page_guarded().unwrap();
        }

        let guard = bpm.fetch_page_read(page_id).unwrap();
        let decoded = HashTableDirectoryPage::from_page(guard.data()).unwrap();
        assert_eq!(5, decoded.bucket_page_id(0));
        assert_eq!(6, decoded.bucket_page_id(1));
    }
}
