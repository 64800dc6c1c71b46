// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Error types for the core client.
//
// `Error` covers everything that aborts a request (system, protocol, timeout,
// local argument checks). `QueryError` is the local, network-free result of
// path extraction on a decoded tree.

use std::io;

use thiserror::Error;

/// Failure of a wire, channel or connection operation.
///
/// Any variant aborts the request in flight. The connection that produced
/// it stays open and may be used for the next request, except after
/// [`Error::Desynchronized`].
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or syscall failure; the OS error code is preserved.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The request deadline passed while sending or receiving.
    #[error("operation timed out")]
    Timeout,

    /// The interrupt token was raised after the grace period elapsed.
    #[error("operation interrupted")]
    Interrupted,

    /// The peer hung up or a read returned zero bytes.
    #[error("connection closed by peer")]
    Closed,

    /// Malformed wire data or an unexpected tree shape ("bad message").
    #[error("bad message: {0}")]
    Protocol(String),

    /// An earlier failure cut a document off part way; the stream no longer
    /// lines up with message boundaries and the connection must be reopened.
    #[error("stream out of sync with the peer; reopen the connection")]
    Desynchronized,

    /// A caller-supplied value was rejected before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }

    /// The OS error code for system errors, `None` for everything else.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }
}

/// Specialized result for core client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a path query that did not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    /// An attribute reference appears before the last path segment.
    #[error("attribute reference in the middle of a path")]
    Syntax,
    /// A path segment or the referenced attribute does not exist.
    #[error("path not found")]
    NotFound,
    /// The value exists but does not parse as the requested type.
    #[error("value has an unexpected format")]
    Format,
    /// The value does not fit the caller's bound.
    #[error("value exceeds the requested size")]
    BufferSize,
}
