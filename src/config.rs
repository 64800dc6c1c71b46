// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Well-known socket paths and connection settings.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{DEFAULT_CACHE_MAX_SIZE, DEFAULT_CACHE_TTL};
use crate::waiter::Interrupt;

/// Command/response socket of the core.
pub const CORE_SOCKET_PATH: &str = "/var/run/core.socket";
/// Event push socket of the core.
pub const EVENT_SOCKET_PATH: &str = "/var/run/core.event.socket";
/// Feedback socket of the core.
pub const FEEDBACK_SOCKET_PATH: &str = "/var/run/core.feedback.socket";

/// Default bound on one request, send and receive together.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15000);

/// Agent id used when the caller does not pick one.
pub const DEFAULT_AGENT: &str = "libcoreipc";

// ---------------------------------------------------------------------------
// ConnectionConfig
// ---------------------------------------------------------------------------

/// Settings for a command [`Connection`](crate::Connection).
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Socket to connect to.
    pub socket_path: PathBuf,
    /// Agent id stamped on every request.
    pub agent: String,
    /// Bound on each request.
    pub timeout: Duration,
    /// Lifetime of cached responses.
    pub cache_ttl: Duration,
    /// Byte budget of the response cache.
    pub cache_max_size: usize,
    /// Token that cancels waits once the grace period is over.
    pub interrupt: Interrupt,
}

impl ConnectionConfig {
    pub fn new(agent: &str) -> Self {
        Self {
            socket_path: PathBuf::from(CORE_SOCKET_PATH),
            agent: agent.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_max_size: DEFAULT_CACHE_MAX_SIZE,
            interrupt: Interrupt::new(),
        }
    }

    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_cache_max_size(mut self, max_size: usize) -> Self {
        self.cache_max_size = max_size;
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_AGENT)
    }
}

// ---------------------------------------------------------------------------
// EventConfig
// ---------------------------------------------------------------------------

/// Settings for an [`EventConnection`](crate::EventConnection).
#[derive(Debug, Clone)]
pub struct EventConfig {
    pub socket_path: PathBuf,
    /// Bound on receiving one event once [`get`](crate::EventConnection::get)
    /// is called.
    pub timeout: Duration,
    pub interrupt: Interrupt,
}

impl EventConfig {
    pub fn new() -> Self {
        Self {
            socket_path: PathBuf::from(EVENT_SOCKET_PATH),
            timeout: DEFAULT_TIMEOUT,
            interrupt: Interrupt::new(),
        }
    }

    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self::new()
    }
}
