// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Client for the core management daemon.
// Requests and replies are trees sent in a compact binary encoding over
// UNIX-domain stream sockets; replies are cached briefly per connection, and
// events arrive on a second socket.

#[cfg(not(unix))]
compile_error!("libcoreipc talks to the core over UNIX-domain sockets and needs a unix target");

mod platform;

pub mod tree;
pub use tree::{Attribute, Document, NodeId, NodeKind};

pub mod codec;
pub use codec::{decode, decode_document, encode, encoded_len, WireSource};

mod error;
pub use error::{Error, QueryError, Result};

mod waiter;
pub use waiter::{Deadline, Interrupt, INTERRUPT_GRACE};

mod buffer;
pub use buffer::{IoBuffer, CHANNEL_BUFFER_SIZE};

mod channel;
pub use channel::{BufferedChannel, ChannelReader};

pub mod query;
pub use query::NodeQuery;

pub mod message;
pub use message::{Message, ResponseCode, ResponseType};

mod response;
pub use response::{Response, CONTINUED_ELEMENT, RESPONSE_ELEMENT};

pub mod cache;
pub use cache::ResponseCache;

mod request;
pub use request::{CacheMode, RequestBuilder, RequestKind, ATTRIBUTE_MARKER};

pub mod config;
pub use config::{ConnectionConfig, EventConfig};

mod connection;
pub use connection::Connection;

mod event;
pub use event::{parse_raise_time, Event, EventConnection, EVENT_ELEMENT};
