// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Deadline and interrupt handling for blocking socket I/O.
//
// Every wait is bounded by two horizons: the request deadline and a short
// grace period measured from the start of the I/O call. While the grace
// period runs the interrupt token is ignored, so I/O that is about to
// complete is not torn down by an unrelated interruption.

use std::io;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::platform::{poll_fd, PollEvents};

/// Grace period during which a raised [`Interrupt`] is not honored.
pub const INTERRUPT_GRACE: Duration = Duration::from_millis(1000);

/// Longest single poll once the grace period is over, so a raised token is
/// noticed without a signal.
const INTERRUPT_CHECK_SLICE: Duration = Duration::from_millis(100);

/// Far-future fallback when `now + timeout` overflows `Instant`.
const FOREVER: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Cooperative cancellation flag shared between a caller and its connections.
///
/// Cloning shares the flag. Raising it makes waits that have outlived
/// [`INTERRUPT_GRACE`] fail with [`Error::Interrupted`]; it stays raised
/// until [`clear`](Interrupt::clear) is called.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Absolute point in time by which a logical request must complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        let now = Instant::now();
        let at = now
            .checked_add(timeout)
            .or_else(|| now.checked_add(FOREVER))
            .unwrap_or(now);
        Self { at }
    }

    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// Poll loop for one send or receive call.
pub(crate) struct Waiter<'a> {
    interrupt: &'a Interrupt,
    grace_until: Instant,
    deadline: Deadline,
}

impl<'a> Waiter<'a> {
    /// Start the grace period now.
    pub(crate) fn start(interrupt: &'a Interrupt, deadline: Deadline) -> Self {
        let now = Instant::now();
        Self {
            interrupt,
            grace_until: now.checked_add(INTERRUPT_GRACE).unwrap_or(now),
            deadline,
        }
    }

    /// Block until `fd` reports any of `events` (or an exceptional state).
    ///
    /// Fails with [`Error::Timeout`] once the deadline passes and with
    /// [`Error::Interrupted`] if the token is raised after the grace period.
    pub(crate) fn wait(&self, fd: RawFd, events: PollEvents) -> Result<PollEvents> {
        loop {
            let now = Instant::now();
            if now >= self.deadline.at {
                return Err(Error::Timeout);
            }
            let in_grace = now < self.grace_until;
            if !in_grace && self.interrupt.is_raised() {
                return Err(Error::Interrupted);
            }

            let mut slice = self.deadline.at - now;
            slice = if in_grace {
                slice.min(self.grace_until - now)
            } else {
                slice.min(INTERRUPT_CHECK_SLICE)
            };

            match poll_fd(fd, events, ceil_millis(slice)) {
                Ok(Some(revents)) => return Ok(revents),
                Ok(None) => continue,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Round up so a sub-millisecond remainder does not turn into a busy poll.
fn ceil_millis(d: Duration) -> libc::c_int {
    let ms = d.as_micros().div_ceil(1000);
    libc::c_int::try_from(ms).unwrap_or(libc::c_int::MAX)
}
