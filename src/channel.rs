// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Buffered, deadline-bound stream over a UNIX-domain socket.
//
// The socket is switched to non-blocking mode; all suspension happens in
// poll(2) through `Waiter`, bounded by the request deadline and by the
// interrupt grace period. Received bytes land in an `IoBuffer` so the
// decoder can pull a few bytes at a time without a syscall per unit.
//
// Once a document has been partly read or partly written when an operation
// fails, the byte stream no longer lines up with message boundaries. The
// channel then refuses further framed traffic with `Error::Desynchronized`.

use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::path::Path;

use tracing::{trace, warn};

use crate::buffer::IoBuffer;
use crate::codec::{self, WireSource};
use crate::error::{Error, Result};
use crate::platform::{poll_fd, PollEvents};
use crate::tree::Document;
use crate::waiter::{Deadline, Interrupt, Waiter};

/// A connected core socket with its receive buffer.
pub struct BufferedChannel {
    stream: UnixStream,
    buf: IoBuffer,
    interrupt: Interrupt,
    // Bytes handed out by `recv_all` since the channel was created.
    delivered: u64,
    desynced: bool,
}

impl BufferedChannel {
    /// Connect to the socket at `path`.
    pub fn connect(path: &Path, interrupt: Interrupt) -> Result<Self> {
        let stream = UnixStream::connect(path)?;
        Self::new(stream, interrupt)
    }

    /// Wrap an already connected stream.
    pub fn new(stream: UnixStream, interrupt: Interrupt) -> Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self {
            stream,
            buf: IoBuffer::new(),
            interrupt,
            delivered: 0,
            desynced: false,
        })
    }

    pub fn raw_fd(&self) -> RawFd {
        self.stream.as_raw_fd()
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Whether a document was cut off part way in either direction.
    pub fn is_desynced(&self) -> bool {
        self.desynced
    }

    fn check_sync(&self) -> Result<()> {
        if self.desynced {
            return Err(Error::Desynchronized);
        }
        Ok(())
    }

    /// Whether received bytes are waiting in the buffer.
    pub fn has_buffered(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Drop buffered bytes; returns how many were dropped.
    pub fn discard_buffered(&mut self) -> usize {
        let n = self.buf.len();
        self.buf.reset();
        n
    }

    /// Drop buffered bytes and everything the socket holds right now;
    /// returns how many bytes were dropped.
    ///
    /// A peer hang-up is left for the next send or receive to report.
    pub fn drain_stale(&mut self) -> Result<usize> {
        let mut dropped = self.discard_buffered();
        loop {
            match self.stream.read(self.buf.spare_mut()) {
                Ok(0) => break,
                Ok(n) => dropped += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(dropped)
    }

    /// Whether the socket is readable right now (data or hang-up pending).
    pub fn poll_readable(&self) -> Result<bool> {
        match poll_fd(self.raw_fd(), PollEvents::READABLE, 0) {
            Ok(Some(ev)) => Ok(ev.readable() || ev.hung_up()),
            Ok(None) => Ok(false),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Write all of `data` before `deadline`.
    ///
    /// A failure after part of `data` went out desynchronizes the channel.
    pub fn send_all(&mut self, data: &[u8], deadline: Deadline) -> Result<()> {
        self.check_sync()?;
        let mut sent = 0;
        let result = self.write_until(data, deadline, &mut sent);
        if result.is_err() && sent > 0 {
            warn!(sent, total = data.len(), "send failed part way");
            self.desynced = true;
        }
        result
    }

    fn write_until(&mut self, data: &[u8], deadline: Deadline, sent: &mut usize) -> Result<()> {
        let waiter = Waiter::start(&self.interrupt, deadline);
        let fd = self.stream.as_raw_fd();
        while *sent < data.len() {
            let ev = waiter.wait(fd, PollEvents::WRITABLE)?;
            if ev.invalid() {
                return Err(io::Error::from_raw_os_error(libc::EBADF).into());
            }
            if ev.hung_up() {
                return Err(Error::Closed);
            }
            if !ev.writable() {
                continue;
            }
            match self.stream.write(&data[*sent..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => *sent += n,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => return Err(e.into()),
            }
        }
        trace!(bytes = data.len(), "sent");
        Ok(())
    }

    /// Fill `dst` completely before `deadline`, serving buffered bytes first.
    pub fn recv_all(&mut self, dst: &mut [u8], deadline: Deadline) -> Result<()> {
        let mut filled = 0;
        let result = self.read_until(dst, deadline, &mut filled);
        self.delivered += filled as u64;
        result
    }

    fn read_until(&mut self, dst: &mut [u8], deadline: Deadline, filled: &mut usize) -> Result<()> {
        *filled = self.buf.consume_into(dst);
        if *filled == dst.len() {
            return Ok(());
        }
        let waiter = Waiter::start(&self.interrupt, deadline);
        let fd = self.stream.as_raw_fd();
        while *filled < dst.len() {
            if !self.buf.is_empty() {
                *filled += self.buf.consume_into(&mut dst[*filled..]);
                continue;
            }
            self.buf.reset();
            let ev = waiter.wait(fd, PollEvents::READABLE)?;
            if ev.invalid() {
                return Err(io::Error::from_raw_os_error(libc::EBADF).into());
            }
            match self.stream.read(self.buf.spare_mut()) {
                Ok(0) => return Err(Error::Closed),
                Ok(n) => {
                    trace!(bytes = n, "received");
                    self.buf.commit(n);
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Decode one document before `deadline`.
    ///
    /// If decoding fails after some of its bytes were consumed, the rest of
    /// that document is still in flight and the channel is desynchronized.
    pub fn receive_document(&mut self, deadline: Deadline) -> Result<Document> {
        self.check_sync()?;
        let start = self.delivered;
        let result = codec::decode_document(&mut self.reader(deadline));
        if let Err(e) = &result {
            if self.delivered != start {
                warn!(
                    error = %e,
                    bytes = self.delivered - start,
                    "document cut off part way"
                );
                self.desynced = true;
            }
        }
        result
    }

    /// A decoder source reading from this channel until `deadline`.
    pub fn reader(&mut self, deadline: Deadline) -> ChannelReader<'_> {
        ChannelReader {
            channel: self,
            deadline,
        }
    }

    /// Shut down both directions of the socket.
    pub fn shutdown(&self) -> Result<()> {
        match self.stream.shutdown(std::net::Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for BufferedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedChannel")
            .field("fd", &self.stream.as_raw_fd())
            .field("buf", &self.buf)
            .field("desynced", &self.desynced)
            .finish()
    }
}

/// [`WireSource`] over a [`BufferedChannel`] bound to one deadline.
pub struct ChannelReader<'a> {
    channel: &'a mut BufferedChannel,
    deadline: Deadline,
}

impl WireSource for ChannelReader<'_> {
    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        self.channel.recv_all(dst, self.deadline)
    }
}
