//! Byte-window computation for partial-content responses.

use super::range::RangeRequest;
use super::{StreamingError, StreamingResult};

/// Maximum window length served under [`WindowPolicy::BoundedChunk`].
pub const CHUNK_SIZE: u64 = 1_000_000;

/// How far past the requested start a response extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// At most [`CHUNK_SIZE`] bytes; the client re-requests the next chunk itself.
    BoundedChunk,
    /// Always through the final byte of the file.
    ToEnd,
}

/// Inclusive `[start, end]` byte window over a file of `total_size` bytes.
///
/// Construction guarantees `start <= end < total_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteWindow {
    start: u64,
    end: u64,
    total_size: u64,
}

impl ByteWindow {
    /// Computes the window to serve for `start` under `policy`.
    ///
    /// # Errors
    /// - `StreamingError::RangeNotSatisfiable` - `start` is at or past the end of the file
    pub fn compute(start: u64, total_size: u64, policy: WindowPolicy) -> StreamingResult<Self> {
        if start >= total_size {
            return Err(StreamingError::RangeNotSatisfiable { start, total_size });
        }

        let last_byte = total_size - 1;
        let end = match policy {
            WindowPolicy::BoundedChunk => start.saturating_add(CHUNK_SIZE - 1).min(last_byte),
            WindowPolicy::ToEnd => last_byte,
        };

        Ok(Self {
            start,
            end,
            total_size,
        })
    }

    /// Computes the policy window for a parsed range, then narrows it to the
    /// client's explicit end when one was given.
    ///
    /// # Errors
    /// - `StreamingError::RangeNotSatisfiable` - Range starts at or past the end of the file
    pub fn for_request(
        range: &RangeRequest,
        total_size: u64,
        policy: WindowPolicy,
    ) -> StreamingResult<Self> {
        let window = Self::compute(range.start, total_size, policy)?;
        Ok(match range.explicit_end {
            Some(explicit_end) => Self {
                end: window.end.min(explicit_end.max(window.start)),
                ..window
            },
            None => window,
        })
    }

    /// First byte offset, inclusive.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last byte offset, inclusive.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Size of the file the window was computed against.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Number of bytes in the window; the Content-Length of the response.
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }
}
