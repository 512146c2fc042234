use std::io::{Cursor, Read, Write};

use anyhow::ensure;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::common::config::{PageData, PageId, INVALID_PAGE_ID};

/// Hard ceiling on a directory's depth; sizes the page-resident arrays.
pub const HTABLE_DIRECTORY_MAX_DEPTH: u32 = 9;

/// Number of slots in the depth and bucket arrays, `2 ^ MAX_DEPTH`.
pub const HTABLE_DIRECTORY_ARRAY_SIZE: usize = 1 << HTABLE_DIRECTORY_MAX_DEPTH;

/// Directory page of an extendible hash table.
///
/// The low `global_depth` bits of a key's hash select a directory slot; the
/// slot holds the bucket's page id and the bucket's local depth. Invariants:
/// `global_depth <= max_depth` and every local depth is at most the global
/// depth. The struct is an owned view of the page bytes; `from_page` and
/// `write_to_page` move it through a page guard's buffer.
pub struct HashTableDirectoryPage {
    max_depth: u32,
    global_depth: u32,
    local_depths: [u8; HTABLE_DIRECTORY_ARRAY_SIZE],
    bucket_page_ids: [PageId; HTABLE_DIRECTORY_ARRAY_SIZE],
}

impl HashTableDirectoryPage {
    pub fn init(max_depth: u32) -> Self {
        assert!(
            max_depth <= HTABLE_DIRECTORY_MAX_DEPTH,
            "directory depth over the page-resident limit"
        );

        Self {
            max_depth,
            global_depth: 0,
            local_depths: [0; HTABLE_DIRECTORY_ARRAY_SIZE],
            bucket_page_ids: [INVALID_PAGE_ID; HTABLE_DIRECTORY_ARRAY_SIZE],
        }
    }

    pub fn hash_to_bucket_index(&self, hash: u32) -> u32 {
        hash & self.global_depth_mask()
    }

    pub fn bucket_page_id(&self, bucket_idx: u32) -> PageId {
        self.bucket_page_ids[bucket_idx as usize]
    }

    pub fn set_bucket_page_id(&mut self, bucket_idx: u32, bucket_page_id: PageId) {
        self.bucket_page_ids[bucket_idx as usize] = bucket_page_id;
    }

    /// Index of the bucket this one splits with, at its current local depth.
    pub fn split_image_index(&self, bucket_idx: u32) -> u32 {
        bucket_idx ^ self.local_depth_mask(bucket_idx)
    }

    pub fn global_depth_mask(&self) -> u32 {
        (1 << self.global_depth) - 1
    }

    pub fn local_depth_mask(&self, bucket_idx: u32) -> u32 {
        (1 << self.local_depth(bucket_idx)) - 1
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn global_depth(&self) -> u32 {
        self.global_depth
    }

    /// Doubles the directory, mirroring the existing mappings into the new
    /// upper half. Saturates at `max_depth`.
    pub fn incr_global_depth(&mut self) {
        if self.global_depth == self.max_depth {
            return;
        }

        let size = self.size() as usize;
        for i in 0..size {
            self.bucket_page_ids[i + size] = self.bucket_page_ids[i];
            self.local_depths[i + size] = self.local_depths[i];
        }
        self.global_depth += 1;
    }

    /// Halves the directory when no bucket still needs the full depth.
    pub fn decr_global_depth(&mut self) {
        if !self.can_shrink() {
            return;
        }

        let new_size = 1usize << (self.global_depth - 1);
        for i in new_size..self.size() as usize {
            self.bucket_page_ids[i] = INVALID_PAGE_ID;
            self.local_depths[i] = 0;
        }
        self.global_depth -= 1;
    }

    /// The directory can halve iff no bucket's local depth equals the
    /// global depth.
    pub fn can_shrink(&self) -> bool {
        if self.global_depth == 0 {
            return false;
        }
        (0..self.size()).all(|i| u32::from(self.local_depths[i as usize]) < self.global_depth)
    }

    /// Number of live directory slots, `2 ^ global_depth`.
    pub fn size(&self) -> u32 {
        1 << self.global_depth
    }

    pub fn max_size(&self) -> u32 {
        1 << self.max_depth
    }

    pub fn local_depth(&self, bucket_idx: u32) -> u32 {
        u32::from(self.local_depths[bucket_idx as usize])
    }

    pub fn set_local_depth(&mut self, bucket_idx: u32, local_depth: u8) {
        self.local_depths[bucket_idx as usize] = local_depth;
    }

    pub fn incr_local_depth(&mut self, bucket_idx: u32) {
        self.local_depths[bucket_idx as usize] += 1;
    }

    pub fn decr_local_depth(&mut self, bucket_idx: u32) {
        self.local_depths[bucket_idx as usize] -= 1;
    }

    pub fn from_page(page: &PageData) -> anyhow::Result<Self> {
        let mut cursor = Cursor::new(&page[..]);

        let max_depth = cursor.read_u32::<LittleEndian>()?;
        let global_depth = cursor.read_u32::<LittleEndian>()?;
        ensure!(
            max_depth <= HTABLE_DIRECTORY_MAX_DEPTH,
            "directory max depth {} out of range",
            max_depth
        );
        ensure!(
            global_depth <= max_depth,
            "global depth {} exceeds max depth {}",
            global_depth,
            max_depth
        );

        let mut local_depths = [0u8; HTABLE_DIRECTORY_ARRAY_SIZE];
        cursor.read_exact(&mut local_depths)?;

        let mut bucket_page_ids = [INVALID_PAGE_ID; HTABLE_DIRECTORY_ARRAY_SIZE];
        for slot in bucket_page_ids.iter_mut() {
            *slot = cursor.read_u32::<LittleEndian>()?;
        }

        Ok(Self {
            max_depth,
            global_depth,
            local_depths,
            bucket_page_ids,
        })
    }

    pub fn write_to_page(&self, page: &mut PageData) -> anyhow::Result<()> {
        let mut cursor = Cursor::new(&mut page[..]);

        cursor.write_u32::<LittleEndian>(self.max_depth)?;
        cursor.write_u32::<LittleEndian>(self.global_depth)?;
        cursor.write_all(&self.local_depths)?;
        for bucket_page_id in &self.bucket_page_ids {
            cursor.write_u32::<LittleEndian>(*bucket_page_id)?;
        }
        Ok(())
    }
}
