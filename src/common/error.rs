use std::fmt;

use crate::common::config::FrameId;

/// Contract violations surfaced by the page-management core.
///
/// Expected runtime conditions (cache miss, pinned page, exhausted pool) are
/// reported through `bool` and `Option` returns; these variants cover calls
/// that break an API contract and the I/O failures beneath them.
#[derive(Debug)]
pub enum Error {
    /// A frame id outside `[0, pool_size)` was handed to the replacer.
    InvalidFrameId(FrameId),
    /// The replacer has no record of this frame.
    FrameNotTracked(FrameId),
    /// Removal was requested for a frame that is not evictable.
    FrameNotEvictable(FrameId),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFrameId(frame_id) => {
                write!(f, "frame id {} is out of range", frame_id)
            }
            Self::FrameNotTracked(frame_id) => {
                write!(f, "frame {} is not tracked by the replacer", frame_id)
            }
            Self::FrameNotEvictable(frame_id) => {
                write!(f, "frame {} is not evictable", frame_id)
            }
            Self::Io(err) => write!(f, "i/o failure: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
