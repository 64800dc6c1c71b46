// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Command connection to the core.
//
// One request is in flight at a time: the request document is encoded, the
// response cache is consulted, and only on a miss are the bytes sent and a
// reply decoded. Any I/O or protocol failure aborts that request only and
// nothing is retried. The connection stays usable unless a request or reply
// was cut off part way, after which every call fails with `Desynchronized`.

use std::os::unix::io::RawFd;
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::channel::BufferedChannel;
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::query::parse_bool;
use crate::request::{CacheMode, RequestBuilder, RequestKind};
use crate::response::Response;
use crate::waiter::{Deadline, Interrupt};

/// An open command connection with its response cache.
pub struct Connection {
    channel: BufferedChannel,
    agent: String,
    timeout: Duration,
    cache: ResponseCache,
    last_message: Message,
    next_response_id: u64,
}

impl Connection {
    /// Connect to the socket named in `config`.
    pub fn open(config: ConnectionConfig) -> Result<Self> {
        let channel = BufferedChannel::connect(&config.socket_path, config.interrupt.clone())?;
        debug!(path = %config.socket_path.display(), agent = %config.agent, "connected to core");
        Ok(Self::from_channel(channel, config))
    }

    /// Use an already connected stream; `config.socket_path` is ignored.
    pub fn with_stream(stream: UnixStream, config: ConnectionConfig) -> Result<Self> {
        let channel = BufferedChannel::new(stream, config.interrupt.clone())?;
        Ok(Self::from_channel(channel, config))
    }

    fn from_channel(channel: BufferedChannel, config: ConnectionConfig) -> Self {
        Self {
            channel,
            agent: config.agent,
            timeout: config.timeout,
            cache: ResponseCache::new(config.cache_ttl, config.cache_max_size),
            last_message: Message::none(),
            next_response_id: 0,
        }
    }

    /// Agent id stamped on every request of this connection.
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Bound applied to each request, send and receive together.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Bound on each following request.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Descriptor of the command socket, for use with an external poll loop.
    pub fn raw_fd(&self) -> RawFd {
        self.channel.raw_fd()
    }

    /// Token that cancels waits of this connection after the grace period.
    pub fn interrupt(&self) -> &Interrupt {
        self.channel.interrupt()
    }

    /// The response cache of this connection.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Mutable access to the response cache, e.g. to change its TTL.
    pub fn cache_mut(&mut self) -> &mut ResponseCache {
        &mut self.cache
    }

    /// Drop all cached responses, or only the expired ones.
    pub fn clear_cache(&mut self, remove_all: bool) {
        self.cache.clear(remove_all, Instant::now());
    }

    /// Status of the most recent response.
    pub fn last_message(&self) -> &Message {
        &self.last_message
    }

    /// A new request builder stamped with this connection's agent id.
    pub fn builder(&self, kind: RequestKind, command: &str) -> RequestBuilder {
        RequestBuilder::new(&self.agent, kind, command)
    }

    /// Send a config, execute or parse request with `args`.
    ///
    /// See [`RequestBuilder::argument`] for how keys are mapped.
    pub fn request(
        &mut self,
        kind: RequestKind,
        mode: CacheMode,
        command: &str,
        args: &[(&str, &str)],
    ) -> Result<Response> {
        let mut builder = self.builder(kind, command);
        builder.arguments(args)?;
        self.send(&builder, mode)
    }

    /// Send a prepared request and wait for its response.
    pub fn send(&mut self, builder: &RequestBuilder, mode: CacheMode) -> Result<Response> {
        let request = builder.encode()?;

        if mode == CacheMode::Cached {
            if let Some(response) = self.cache.lookup_copy(&request, Instant::now()) {
                self.note_message(&response);
                return Ok(response);
            }
        }

        let deadline = Deadline::after(self.timeout);
        let stale = self.channel.drain_stale()?;
        if stale > 0 {
            warn!(bytes = stale, "discarded stale bytes before request");
        }
        debug!(kind = ?builder.kind(), bytes = request.len(), "sending request");
        self.channel.send_all(&request, deadline)?;
        let doc = self.channel.receive_document(deadline)?;

        self.next_response_id += 1;
        let response = Response::from_document(doc, self.next_response_id).inspect_err(|_| {
            warn!("reply without a response element");
        })?;

        if mode == CacheMode::Cached {
            self.cache.insert(&request, &response, Instant::now());
        }
        self.note_message(&response);
        Ok(response)
    }

    fn note_message(&mut self, response: &Response) {
        if self.last_message.response_id() != Some(response.id()) {
            self.last_message = response.message();
        }
    }

    /// Ask for the next part of a continued response.
    pub fn request_continue(&mut self) -> Result<Response> {
        let builder = RequestBuilder::bare(&self.agent, "continue");
        self.send(&builder, CacheMode::Bypass)
    }

    /// Abandon a continued response.
    pub fn request_break(&mut self) -> Result<Response> {
        let builder = RequestBuilder::bare(&self.agent, "break");
        self.send(&builder, CacheMode::Bypass)
    }

    /// Log in; returns whether the core answered with a prompt.
    pub fn authenticate(&mut self, user: &str, password: &str, tag: &str) -> Result<bool> {
        let builder = RequestBuilder::hello(&self.agent, user, password, tag);
        let response = self.send(&builder, CacheMode::Bypass)?;
        let doc = response.document();
        Ok(doc.first_child_named(response.root(), "prompt").is_some())
    }

    /// Whether the core knows `command`.
    pub fn find_command(&mut self, command: &str) -> Result<bool> {
        let builder = RequestBuilder::with_value(&self.agent, "probe", command);
        let response = self.send(&builder, CacheMode::Cached)?;
        let found = response
            .document()
            .attribute(response.root(), "found")
            .ok_or_else(|| Error::protocol("reply without a found attribute"))?;
        parse_bool(found).ok_or_else(|| Error::protocol(format!("bad found value {found:?}")))
    }

    /// Help text tree for `command`.
    pub fn get_help(&mut self, command: &str) -> Result<Response> {
        let builder = RequestBuilder::with_value(&self.agent, "help", command);
        self.send(&builder, CacheMode::Cached)
    }

    /// Drop the cache and shut the socket down.
    pub fn close(mut self) -> Result<()> {
        self.cache.clear(true, Instant::now());
        debug!(fd = self.channel.raw_fd(), "closing core connection");
        self.channel.shutdown()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("channel", &self.channel)
            .field("agent", &self.agent)
            .field("timeout", &self.timeout)
            .field("cache", &self.cache)
            .finish()
    }
}
