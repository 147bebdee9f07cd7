//! Immutable frame storage for one loaded session

use std::sync::Arc;
use std::time::Duration;

use crate::error::{ReplayError, Result};
use crate::types::Frame;

/// Ordered, immutable sequence of frames for one session.
///
/// Cloning is cheap: clones share the same frames. Contents only change
/// through [`FrameBuffer::load`], which validates before swapping.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    frames: Arc<[Frame]>,
}

impl FrameBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a buffer from frames, validating their indices
    pub fn from_frames(frames: Vec<Frame>) -> Result<Self> {
        let mut buffer = Self::new();
        buffer.load(frames)?;
        Ok(buffer)
    }

    /// Replace the contents. Indices must run `0, 1, 2, ...` with no gaps;
    /// on failure the previous contents are kept.
    pub fn load(&mut self, frames: Vec<Frame>) -> Result<()> {
        validate_indices(&frames)?;
        self.frames = frames.into();
        Ok(())
    }

    /// Frame at `index`
    pub fn get(&self, index: usize) -> Result<&Frame> {
        self.frames.get(index).ok_or(ReplayError::IndexOutOfRange {
            index,
            len: self.frames.len(),
        })
    }

    /// Frames in `start..end`. `end` is clamped to the length and a `start`
    /// past the end yields an empty slice; only `start > end` is an error.
    pub fn slice(&self, start: usize, end: usize) -> Result<&[Frame]> {
        if start > end {
            return Err(ReplayError::InvalidSlice { start, end });
        }
        let len = self.frames.len();
        if start >= len {
            return Ok(&[]);
        }
        Ok(&self.frames[start..end.min(len)])
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Timestamp of the last frame
    pub fn duration(&self) -> Duration {
        self.frames
            .last()
            .map(|f| f.timestamp)
            .unwrap_or(Duration::ZERO)
    }

    /// Find the frame index at or before a given time
    pub fn find_frame_at(&self, time: Duration) -> Option<usize> {
        if self.frames.is_empty() {
            return None;
        }

        let idx = self.frames.partition_point(|f| f.timestamp <= time);
        if idx == 0 {
            Some(0)
        } else {
            Some(idx - 1)
        }
    }

    /// Whether two buffers share the same frame storage
    pub fn ptr_eq(&self, other: &FrameBuffer) -> bool {
        Arc::ptr_eq(&self.frames, &other.frames)
    }
}

impl<'a> IntoIterator for &'a FrameBuffer {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

fn validate_indices(frames: &[Frame]) -> Result<()> {
    for (expected, frame) in frames.iter().enumerate() {
        if frame.index != expected {
            return Err(ReplayError::InvalidFrameSequence(format!(
                "expected frame index {} but found {}",
                expected, frame.index
            )));
        }
    }
    Ok(())
}
