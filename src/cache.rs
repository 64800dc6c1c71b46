// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Response cache keyed by encoded request bytes.
//
// Entries live in a slab and are linked into a recency list by slab index,
// most recently used at the head. Every entry expires a fixed TTL after it
// was inserted; expired entries are dropped lazily, whenever a lookup or
// clear runs past the expiration horizon. When the byte budget would be
// exceeded, entries are evicted from the tail.

use std::time::{Duration, Instant};

use slab::Slab;
use tracing::debug;

use crate::response::Response;

/// Default lifetime of a cached response.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(200);
/// Default byte budget of a cache.
pub const DEFAULT_CACHE_MAX_SIZE: usize = 65536;

struct Entry {
    request: Box<[u8]>,
    response: Response,
    expires: Instant,
    size: usize,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Fixed per-entry cost added to its footprint.
pub const ENTRY_OVERHEAD: usize = std::mem::size_of::<Entry>();

/// Bytes an entry for `request` and `response` counts against the budget.
pub fn entry_footprint(request: &[u8], response: &Response) -> usize {
    request.len() + response.document().byte_size() + ENTRY_OVERHEAD
}

/// LRU cache of responses with a TTL and a total byte budget.
pub struct ResponseCache {
    ttl: Duration,
    max_size: usize,
    entries: Slab<Entry>,
    head: Option<usize>,
    tail: Option<usize>,
    total_size: usize,
    // Never later than the earliest expiration of any entry.
    horizon: Option<Instant>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self {
            ttl,
            max_size,
            entries: Slab::new(),
            head: None,
            tail: None,
            total_size: 0,
            horizon: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the footprints of all entries.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Change the TTL of entries inserted from now on.
    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    /// Change the budget, evicting from the tail until it is met.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.total_size > self.max_size {
            if !self.evict_tail() {
                break;
            }
        }
    }

    /// Find the response cached for `request`, promoting it to the head.
    pub fn lookup(&mut self, request: &[u8], now: Instant) -> Option<&Response> {
        self.expire_if_due(now);
        let key = self.find(request)?;
        self.move_to_front(key);
        debug!(key, "cache hit");
        Some(&self.entries[key].response)
    }

    /// Like [`lookup`](Self::lookup), returning a copy the caller owns.
    pub fn lookup_copy(&mut self, request: &[u8], now: Instant) -> Option<Response> {
        self.lookup(request, now).cloned()
    }

    /// Whether an unexpired entry for `request` exists; does not promote.
    pub fn contains(&self, request: &[u8], now: Instant) -> bool {
        self.find(request)
            .is_some_and(|key| self.entries[key].expires > now)
    }

    /// Cache a copy of `response` under `request`.
    ///
    /// Continued responses and entries larger than the whole budget are
    /// skipped; returns whether the entry was stored. An existing entry for
    /// the same request is replaced.
    pub fn insert(&mut self, request: &[u8], response: &Response, now: Instant) -> bool {
        if response.is_continued() {
            return false;
        }
        let size = entry_footprint(request, response);
        if size > self.max_size {
            debug!(size, max = self.max_size, "response too large to cache");
            return false;
        }
        if let Some(old) = self.find(request) {
            self.unlink_and_remove(old);
        }
        while size > self.max_size.saturating_sub(self.total_size) {
            if !self.evict_tail() {
                break;
            }
        }

        let expires = now.checked_add(self.ttl).unwrap_or(now);
        let key = self.entries.insert(Entry {
            request: request.into(),
            response: response.clone(),
            expires,
            size,
            prev: None,
            next: None,
        });
        self.push_front(key);
        self.total_size += size;
        self.horizon = Some(self.horizon.map_or(expires, |h| h.min(expires)));
        debug!(key, size, total = self.total_size, "cached response");
        true
    }

    /// Drop every entry if `remove_all`, otherwise only the expired ones.
    pub fn clear(&mut self, remove_all: bool, now: Instant) {
        if remove_all {
            self.entries.clear();
            self.head = None;
            self.tail = None;
            self.total_size = 0;
            self.horizon = None;
        } else {
            self.evict_expired(now);
        }
    }

    fn find(&self, request: &[u8]) -> Option<usize> {
        let mut cur = self.head;
        while let Some(key) = cur {
            let e = &self.entries[key];
            if &*e.request == request {
                return Some(key);
            }
            cur = e.next;
        }
        None
    }

    fn expire_if_due(&mut self, now: Instant) {
        if self.horizon.is_some_and(|h| h <= now) {
            self.evict_expired(now);
        }
    }

    fn evict_expired(&mut self, now: Instant) {
        let mut horizon: Option<Instant> = None;
        let mut cur = self.head;
        while let Some(key) = cur {
            let e = &self.entries[key];
            cur = e.next;
            if e.expires <= now {
                debug!(key, "cache entry expired");
                self.unlink_and_remove(key);
            } else {
                horizon = Some(horizon.map_or(e.expires, |h| h.min(e.expires)));
            }
        }
        self.horizon = horizon;
    }

    fn evict_tail(&mut self) -> bool {
        match self.tail {
            Some(key) => {
                debug!(key, "evicting least recently used entry");
                self.unlink_and_remove(key);
                true
            }
            None => false,
        }
    }

    fn unlink(&mut self, key: usize) {
        let (prev, next) = {
            let e = &self.entries[key];
            (e.prev, e.next)
        };
        match prev {
            Some(p) => self.entries[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entries[n].prev = prev,
            None => self.tail = prev,
        }
        let e = &mut self.entries[key];
        e.prev = None;
        e.next = None;
    }

    fn unlink_and_remove(&mut self, key: usize) {
        self.unlink(key);
        let e = self.entries.remove(key);
        self.total_size -= e.size;
        if self.entries.is_empty() {
            self.horizon = None;
        }
    }

    fn push_front(&mut self, key: usize) {
        self.entries[key].next = self.head;
        self.entries[key].prev = None;
        if let Some(h) = self.head {
            self.entries[h].prev = Some(key);
        }
        self.head = Some(key);
        if self.tail.is_none() {
            self.tail = Some(key);
        }
    }

    fn move_to_front(&mut self, key: usize) {
        if self.head == Some(key) {
            return;
        }
        self.unlink(key);
        self.push_front(key);
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_MAX_SIZE)
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.ttl)
            .field("max_size", &self.max_size)
            .field("len", &self.entries.len())
            .field("total_size", &self.total_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Document;

    fn response(payload: &str) -> Response {
        let mut doc = Document::new();
        let root = doc.root();
        doc.append_element(root, "response", payload);
        Response::from_document(doc, 1).unwrap()
    }

    #[test]
    fn list_links_stay_consistent() {
        let now = Instant::now();
        let mut cache = ResponseCache::new(Duration::from_secs(10), 1 << 20);
        for k in [b"a", b"b", b"c"] {
            assert!(cache.insert(k, &response("x"), now));
        }
        assert!(cache.lookup(b"a", now).is_some());
        assert_eq!(cache.head, cache.find(b"a"));
        assert_eq!(cache.tail, cache.find(b"b"));
        cache.clear(true, now);
        assert!(cache.head.is_none() && cache.tail.is_none());
        assert_eq!(cache.total_size(), 0);
    }
}
