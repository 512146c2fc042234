use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use dashmap::DashMap;
use log::debug;
use parking_lot::Mutex;

use crate::common::config::{PageData, PageId, PAGE_SIZE};
use crate::common::error::Result;

/// Block device abstraction: transfers exactly one page per call.
///
/// Implementations are shared between the scheduler's worker threads, so all
/// access goes through `&self`.
pub trait DiskManager: Send + Sync {
    fn read_page(&self, page_id: PageId, page_data: &mut [u8]) -> Result<()>;
    fn write_page(&self, page_id: PageId, page_data: &[u8]) -> Result<()>;
}

/// File-backed disk manager. Pages live at offset `page_id * PAGE_SIZE` in a
/// single database file.
pub struct FileDiskManager {
    db_io: Mutex<File>,
}

impl FileDiskManager {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        Ok(Self {
            db_io: Mutex::new(db_file),
        })
    }

    fn page_offset(page_id: PageId) -> u64 {
        page_id as u64 * PAGE_SIZE as u64
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&self, page_id: PageId, page_data: &mut [u8]) -> Result<()> {
        let mut db_io = self.db_io.lock();
        db_io.seek(SeekFrom::Start(Self::page_offset(page_id)))?;

        match db_io.read_exact(page_data) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                // The page was allocated but never flushed; it reads as zeros.
                debug!("short read of page {}, zero filling", page_id);
                page_data.fill(0);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write_page(&self, page_id: PageId, page_data: &[u8]) -> Result<()> {
        let mut db_io = self.db_io.lock();
        db_io.seek(SeekFrom::Start(Self::page_offset(page_id)))?;
        db_io.write_all(page_data)?;
        db_io.flush()?;
        Ok(())
    }
}

/// Unbounded in-memory disk manager. The test workhorse: no file system, no
/// cleanup, pages never written read back as zeros.
#[derive(Default)]
pub struct MemoryDiskManager {
    pages: DashMap<PageId, Box<PageData>>,
}

impl MemoryDiskManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&self, page_id: PageId, page_data: &mut [u8]) -> Result<()> {
        match self.pages.get(&page_id) {
            Some(page) => page_data.copy_from_slice(&page[..page_data.len()]),
            None => page_data.fill(0),
        }
        Ok(())
    }

    fn write_page(&self, page_id: PageId, page_data: &[u8]) -> Result<()> {
        let mut page = Box::new([0u8; PAGE_SIZE]);
        page[..page_data.len()].copy_from_slice(page_data);
        self.pages.insert(page_id, page);
        Ok(())
    }
}

#[cfg(test)]
pub mod test {
    use super::{DiskManager, FileDiskManager, MemoryDiskManager};
    use crate::common::config::PAGE_SIZE;

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = FileDiskManager::open(dir.path().join("stratum.db")).unwrap();

        let data = [7u8; PAGE_SIZE];
        manager.write_page(3, &data).unwrap();

        let mut buffer = [0u8; PAGE_SIZE];
        manager.read_page(3, &mut buffer).unwrap();
        assert_eq!(data, buffer, "page read mismatch");
    }

    #[test]
    fn file_read_past_eof_is_zeros() {
        let dir = tempfile::tempdir().unwrap();
        let manager = FileDiskManager::open(dir.path().join("stratum.db")).unwrap();

        let mut buffer = [0xffu8; PAGE_SIZE];
        manager.read_page(99, &mut buffer).unwrap();
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn memory_round_trip() {
        let manager = MemoryDiskManager::new();

        let mut data = [0u8; PAGE_SIZE];
        data[..5].copy_from_slice(b"hello");
        manager.write_page(0, &data).unwrap();

        let mut buffer = [0u8; PAGE_SIZE];
        manager.read_page(0, &mut buffer).unwrap();
        assert_eq!(data, buffer);

        manager.read_page(1, &mut buffer).unwrap();
        assert!(buffer.iter().all(|&b| b == 0));
    }
}
