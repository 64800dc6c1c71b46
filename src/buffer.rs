// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Fixed-capacity receive buffer for a core socket.
// Bytes are written at `write_pos` by socket reads and consumed from
// `read_pos` by the decoder; both cursors rewind to zero once it drains.

/// Default capacity of a channel's receive buffer.
pub const CHANNEL_BUFFER_SIZE: usize = 8192;

/// A byte buffer with independent read and write cursors.
pub struct IoBuffer {
    data: Box<[u8]>,
    read_pos: usize,
    write_pos: usize,
}

impl IoBuffer {
    /// Create a buffer of [`CHANNEL_BUFFER_SIZE`] bytes.
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_BUFFER_SIZE)
    }

    /// Create a buffer holding at most `capacity` bytes (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity.max(1)].into_boxed_slice(),
            read_pos: 0,
            write_pos: 0,
        }
    }

    /// Whether every received byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.read_pos == self.write_pos
    }

    /// Number of received, unconsumed bytes.
    pub fn len(&self) -> usize {
        self.write_pos - self.read_pos
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The unconsumed bytes.
    pub fn data(&self) -> &[u8] {
        &self.data[self.read_pos..self.write_pos]
    }

    /// Copy as many unconsumed bytes as fit into `dst`; returns the count.
    pub fn consume_into(&mut self, dst: &mut [u8]) -> usize {
        let n = self.len().min(dst.len());
        dst[..n].copy_from_slice(&self.data[self.read_pos..self.read_pos + n]);
        self.read_pos += n;
        n
    }

    /// Space after the write cursor, to be filled by a socket read.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.write_pos..]
    }

    /// Mark `n` bytes of [`spare_mut`](Self::spare_mut) as received.
    ///
    /// # Panics
    /// Panics if `n` exceeds the spare capacity.
    pub fn commit(&mut self, n: usize) {
        assert!(n <= self.data.len() - self.write_pos, "commit past buffer end");
        self.write_pos += n;
    }

    /// Drop all unconsumed bytes and rewind both cursors.
    pub fn reset(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
    }
}

impl Default for IoBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IoBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoBuffer")
            .field("capacity", &self.data.len())
            .field("read_pos", &self.read_pos)
            .field("write_pos", &self.write_pos)
            .finish()
    }
}
