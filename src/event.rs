// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Event push channel.
//
// The core pushes one `event` subtree per event on a separate socket. Events
// are not repeatable queries, so there is no cache; each `get` decodes
// exactly one subtree.

use std::os::unix::io::RawFd;
use std::os::unix::net::UnixStream;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::channel::BufferedChannel;
use crate::config::EventConfig;
use crate::error::{Error, Result};
use crate::query::NodeQuery;
use crate::tree::{Document, NodeId};
use crate::waiter::Deadline;

/// Root element name of every event.
pub const EVENT_ELEMENT: &str = "event";

/// One decoded event.
#[derive(Debug, Clone)]
pub struct Event {
    doc: Document,
    root: NodeId,
    class: String,
    raise_time: Duration,
    raised_at: SystemTime,
}

impl Event {
    /// Validate a decoded document: it must hold a top-level `event` element
    /// with a non-empty `class` and a `raise_time` of `secs[.millis]`.
    pub fn from_document(doc: Document) -> Result<Self> {
        let root = doc
            .first_child_named(doc.root(), EVENT_ELEMENT)
            .ok_or_else(|| Error::protocol("no event element"))?;
        let class = doc
            .attribute(root, "class")
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::protocol("event without a class"))?
            .to_owned();
        let raw = doc
            .attribute(root, "raise_time")
            .ok_or_else(|| Error::protocol("event without a raise_time"))?;
        let raise_time = parse_raise_time(raw)
            .ok_or_else(|| Error::protocol(format!("bad raise_time {raw:?}")))?;
        let raised_at = UNIX_EPOCH
            .checked_add(raise_time)
            .ok_or_else(|| Error::protocol(format!("raise_time {raw:?} out of range")))?;
        Ok(Self {
            doc,
            root,
            class,
            raise_time,
            raised_at,
        })
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Wall-clock time the core raised the event.
    pub fn raise_time(&self) -> SystemTime {
        self.raised_at
    }

    /// Raise time in milliseconds since the Unix epoch.
    pub fn raise_time_ms(&self) -> u128 {
        self.raise_time.as_millis()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The `event` element.
    pub fn root(&self) -> NodeId {
        self.root
    }
}

impl NodeQuery for Event {
    fn document(&self) -> &Document {
        &self.doc
    }

    fn root(&self) -> NodeId {
        self.root
    }
}

/// Parse `secs[.millis]`; the part after the dot is a millisecond count
/// below 1000, not a decimal fraction.
///
/// Values the system clock cannot represent as an offset from the Unix
/// epoch are rejected.
pub fn parse_raise_time(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (secs, millis) = match s.split_once('.') {
        Some((secs, millis)) => (secs, Some(millis)),
        None => (s, None),
    };
    if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let secs: u64 = secs.parse().ok()?;
    let millis: u64 = match millis {
        Some(m) if !m.is_empty() && m.bytes().all(|b| b.is_ascii_digit()) => {
            m.parse().ok().filter(|&v| v < 1000)?
        }
        Some(_) => return None,
        None => 0,
    };
    let d = Duration::from_secs(secs).checked_add(Duration::from_millis(millis))?;
    UNIX_EPOCH.checked_add(d)?;
    Some(d)
}

/// Connection to the event socket.
pub struct EventConnection {
    channel: BufferedChannel,
    timeout: Duration,
}

impl EventConnection {
    pub fn open(config: EventConfig) -> Result<Self> {
        let channel = BufferedChannel::connect(&config.socket_path, config.interrupt)?;
        debug!(path = %config.socket_path.display(), "connected to event socket");
        Ok(Self {
            channel,
            timeout: config.timeout,
        })
    }

    /// Use an already connected stream; `config.socket_path` is ignored.
    pub fn with_stream(stream: UnixStream, config: EventConfig) -> Result<Self> {
        Ok(Self {
            channel: BufferedChannel::new(stream, config.interrupt)?,
            timeout: config.timeout,
        })
    }

    /// Whether [`get`](Self::get) would find data without waiting.
    pub fn has_events(&self) -> Result<bool> {
        if self.channel.has_buffered() {
            return Ok(true);
        }
        self.channel.poll_readable()
    }

    /// Receive one event, waiting at most the configured timeout.
    ///
    /// A timeout while the channel is idle can be retried. If an event was
    /// cut off part way, this and every later call fail with
    /// [`Error::Desynchronized`].
    pub fn get(&mut self) -> Result<Event> {
        let deadline = Deadline::after(self.timeout);
        let doc = self.channel.receive_document(deadline)?;
        let event = Event::from_document(doc)?;
        debug!(class = %event.class(), "event received");
        Ok(event)
    }

    pub fn raw_fd(&self) -> RawFd {
        self.channel.raw_fd()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn close(self) -> Result<()> {
        self.channel.shutdown()
    }
}

impl std::fmt::Debug for EventConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventConnection")
            .field("channel", &self.channel)
            .field("timeout", &self.timeout)
            .finish()
    }
}
