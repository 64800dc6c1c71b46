// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// POSIX readiness polling for the core sockets.
// Thin wrapper over poll(2) on a single descriptor.

use std::io;
use std::os::unix::io::RawFd;

/// Event mask for [`poll_fd`], a subset of the `POLL*` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollEvents(libc::c_short);

impl PollEvents {
    pub const READABLE: PollEvents = PollEvents(libc::POLLIN);
    pub const WRITABLE: PollEvents = PollEvents(libc::POLLOUT);

    pub fn readable(self) -> bool {
        self.0 & libc::POLLIN != 0
    }

    pub fn writable(self) -> bool {
        self.0 & libc::POLLOUT != 0
    }

    /// The peer hung up (`POLLHUP`) or the socket has a pending error (`POLLERR`).
    pub fn hung_up(self) -> bool {
        self.0 & (libc::POLLHUP | libc::POLLERR) != 0
    }

    /// The descriptor is not open (`POLLNVAL`).
    pub fn invalid(self) -> bool {
        self.0 & libc::POLLNVAL != 0
    }
}

/// Wait up to `timeout_ms` milliseconds for `events` on `fd`.
///
/// Returns `Ok(None)` when the timeout expires, `Ok(Some(revents))` when the
/// descriptor is ready or in an exceptional state. A signal delivered during
/// the wait surfaces as an `ErrorKind::Interrupted` error.
pub fn poll_fd(
    fd: RawFd,
    events: PollEvents,
    timeout_ms: libc::c_int,
) -> io::Result<Option<PollEvents>> {
    let mut pfd = libc::pollfd {
        fd,
        events: events.0,
        revents: 0,
    };
    // Safety: `pfd` is a valid, exclusively borrowed pollfd array of length 1.
    let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    match rc {
        -1 => Err(io::Error::last_os_error()),
        0 => Ok(None),
        _ => Ok(Some(PollEvents(pfd.revents))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::io::AsRawFd;
    use std::os::unix::net::UnixStream;

    #[test]
    fn empty_socket_times_out() {
        let (a, _b) = UnixStream::pair().unwrap();
        assert_eq!(poll_fd(a.as_raw_fd(), PollEvents::READABLE, 0).unwrap(), None);
    }

    #[test]
    fn pending_data_is_readable() {
        let (a, mut b) = UnixStream::pair().unwrap();
        b.write_all(b"x").unwrap();
        let ev = poll_fd(a.as_raw_fd(), PollEvents::READABLE, 1000).unwrap().unwrap();
        assert!(ev.readable());
    }

    #[test]
    fn closed_peer_reports_hangup() {
        let (a, b) = UnixStream::pair().unwrap();
        drop(b);
        let ev = poll_fd(a.as_raw_fd(), PollEvents::READABLE, 1000).unwrap().unwrap();
        assert!(ev.hung_up() || ev.readable());
    }
}
