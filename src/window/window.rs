//! Fixed-capacity byte window with read/write cursors

use crate::error::{RelaisError, Result};

/// Fixed-capacity byte buffer exposing contiguous writable and readable
/// regions.
///
/// The write cursor marks the end of buffered data, the read cursor the start.
/// Regions stay contiguous because the cursors only move forward; both snap
/// back to the front of the buffer once every buffered byte has been consumed.
/// A window whose write cursor has reached capacity reports no writable space
/// until it fully drains, which is exactly the backpressure signal the copy
/// engine feeds into interest recomputation.
#[derive(Debug)]
pub struct ByteWindow {
    /// Backing storage, allocated once at the configured capacity
    data: Box<[u8]>,
    /// Start of buffered data
    read: usize,
    /// End of buffered data
    write: usize,
}

impl ByteWindow {
    /// Create a new window with the given capacity
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RelaisError::invalid_parameter(
                "capacity",
                "Window capacity must be greater than 0",
            ));
        }

        Ok(Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            read: 0,
            write: 0,
        })
    }

    /// Get the capacity of the window
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Get the number of buffered (readable) bytes
    pub fn len(&self) -> usize {
        self.write - self.read
    }

    /// Check if the window holds no buffered bytes
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    /// Check if the window has no writable space left
    pub fn is_full(&self) -> bool {
        self.write == self.data.len()
    }

    /// Check whether the window can accept more bytes
    pub fn has_writable(&self) -> bool {
        self.write < self.data.len()
    }

    /// Check whether the window holds bytes waiting to be drained
    pub fn has_readable(&self) -> bool {
        self.read < self.write
    }

    /// Get the number of bytes the writable region can accept
    pub fn writable_len(&self) -> usize {
        self.data.len() - self.write
    }

    /// Get the contiguous region a socket read may fill
    pub fn writable_region(&mut self) -> &mut [u8] {
        &mut self.data[self.write..]
    }

    /// Advance the write cursor after `n` bytes were filled in
    pub fn advance_write(&mut self, n: usize) -> Result<()> {
        let available = self.data.len() - self.write;
        if n > available {
            return Err(RelaisError::insufficient_space(n, available));
        }
        self.write += n;
        Ok(())
    }

    /// Get the contiguous region of buffered bytes waiting to be sent
    pub fn readable_region(&self) -> &[u8] {
        &self.data[self.read..self.write]
    }

    /// Advance the read cursor after `n` bytes were drained
    pub fn advance_read(&mut self, n: usize) -> Result<()> {
        let available = self.write - self.read;
        if n > available {
            return Err(RelaisError::insufficient_space(n, available));
        }
        self.read += n;
        // fully drained: snap both cursors back so the writable region reopens
        if self.read == self.write {
            self.read = 0;
            self.write = 0;
        }
        Ok(())
    }

    /// Discard all buffered bytes and reset both cursors
    pub fn clear(&mut self) {
        self.read = 0;
        self.write = 0;
    }
}
