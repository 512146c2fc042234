use std::collections::{HashMap, VecDeque};

use crate::common::config::FrameId;
use crate::common::error::{Error, Result};

/// What a frame access was doing, for access-type-aware eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessType {
    #[default]
    Unknown,
    Index,
    Scan,
    Lookup,
}

impl AccessType {
    fn weight(self) -> u64 {
        match self {
            AccessType::Unknown | AccessType::Index => 1,
            AccessType::Scan => 2,
            AccessType::Lookup => 3,
        }
    }
}

/// Per-frame access history: up to `k` `(timestamp, weight)` records, oldest
/// first.
struct LruKNode {
    history: VecDeque<(u64, u64)>,
    is_evictable: bool,
}

impl LruKNode {
    fn new(k: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(k),
            is_evictable: false,
        }
    }

    fn record_access(&mut self, timestamp: u64, weight: u64, k: usize) {
        if self.history.len() == k {
            self.history.pop_front();
        }
        self.history.push_back((timestamp, weight));
    }

    fn earliest_timestamp(&self) -> u64 {
        self.history.front().map_or(0, |&(timestamp, _)| timestamp)
    }

    /// Weighted backward K-distance, or `None` for fewer than `k` recorded
    /// accesses (infinitely distant).
    fn k_distance(&self, current_timestamp: u64, k: usize) -> Option<u64> {
        if self.history.len() < k {
            return None;
        }
        let span = current_timestamp - self.earliest_timestamp();
        let weight_sum: u64 = self.history.iter().map(|&(_, weight)| weight).sum();
        Some(span * weight_sum / k as u64)
    }
}

/// LRU-K replacement policy over the pool's frames.
///
/// The victim is the evictable frame whose K-th most recent access lies
/// furthest in the past. Frames with fewer than K accesses count as
/// infinitely distant and are evicted first, LRU among themselves. Access
/// weights stretch the distance of frames whose history carries expensive
/// access types.
pub struct LruKReplacer {
    node_store: HashMap<FrameId, LruKNode>,
    current_timestamp: u64,
    /// Number of evictable nodes in the store.
    curr_size: usize,
    replacer_size: usize,
    k: usize,
}

impl LruKReplacer {
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k >= 1, "history depth must be at least 1");

        Self {
            node_store: HashMap::with_capacity(num_frames),
            current_timestamp: 0,
            curr_size: 0,
            replacer_size: num_frames,
            k,
        }
    }

    /// Records an access to `frame_id`, creating its history on first sight.
    pub fn record_access(&mut self, frame_id: FrameId, access_type: AccessType) -> Result<()> {
        if frame_id >= self.replacer_size {
            return Err(Error::InvalidFrameId(frame_id));
        }

        let k = self.k;
        let node = self
            .node_store
            .entry(frame_id)
            .or_insert_with(|| LruKNode::new(k));
        node.record_access(self.current_timestamp, access_type.weight(), k);
        self.current_timestamp += 1;
        Ok(())
    }

    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) -> Result<()> {
        let node = self
            .node_store
            .get_mut(&frame_id)
            .ok_or(Error::FrameNotTracked(frame_id))?;

        if evictable && !node.is_evictable {
            self.curr_size += 1;
        } else if !evictable && node.is_evictable {
            self.curr_size -= 1;
        }
        node.is_evictable = evictable;
        Ok(())
    }

    /// Drops a frame's history. Removing an untracked frame is a no-op;
    /// removing a non-evictable frame is a contract violation.
    pub fn remove(&mut self, frame_id: FrameId) -> Result<()> {
        match self.node_store.get(&frame_id) {
            None => Ok(()),
            Some(node) if !node.is_evictable => Err(Error::FrameNotEvictable(frame_id)),
            Some(_) => {
                self.node_store.remove(&frame_id);
                self.curr_size -= 1;
                Ok(())
            }
        }
    }

    /// Picks and removes the eviction victim, if any frame is evictable.
    ///
    /// Ties between infinitely distant frames fall to the earliest recorded
    /// access; ties on equal finite distance fall to the smallest frame id.
    pub fn evict(&mut self) -> Option<FrameId> {
        if self.curr_size == 0 {
            return None;
        }

        let mut oldest_under_k: Option<(u64, FrameId)> = None;
        let mut furthest: Option<(u64, FrameId)> = None;

        for (&frame_id, node) in &self.node_store {
            if !node.is_evictable {
                continue;
            }

            match node.k_distance(self.current_timestamp, self.k) {
                None => {
                    let candidate = (node.earliest_timestamp(), frame_id);
                    if oldest_under_k.map_or(true, |best| candidate < best) {
                        oldest_under_k = Some(candidate);
                    }
                }
                Some(distance) => {
                    let replace = furthest.map_or(true, |(best_distance, best_id)| {
                        distance > best_distance || (distance == best_distance && frame_id < best_id)
                    });
                    if replace {
                        furthest = Some((distance, frame_id));
                    }
                }
            }
        }

        let victim = oldest_under_k
            .map(|(_, frame_id)| frame_id)
            .or(furthest.map(|(_, frame_id)| frame_id))?;

        self.node_store.remove(&victim);
        self.curr_size -= 1;
        Some(victim)
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.curr_size
    }
}
