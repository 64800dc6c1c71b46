// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Path-based value extraction from decoded trees.
//
// A path is a '/'-separated list of child element names walked from a start
// node, taking the first matching child at every level. The last segment may
// end in `@attr` to address an attribute of the element it selects; `@attr`
// on its own addresses an attribute of the current node. Empty segments are
// skipped, so "" addresses the start node itself.

use std::str::FromStr;

use crate::error::QueryError;
use crate::tree::{Document, NodeId};

const ATTR_SEP: char = '@';

/// Walk `path` from `start`; returns the selected element and, if the path
/// ends in an attribute reference, the attribute name.
fn resolve<'p>(
    doc: &Document,
    start: NodeId,
    path: &'p str,
) -> Result<(NodeId, Option<&'p str>), QueryError> {
    let mut segments = path.split('/').peekable();
    let mut node = start;
    while let Some(seg) = segments.next() {
        let (name, attr) = match seg.split_once(ATTR_SEP) {
            Some((n, a)) => (n, Some(a)),
            None => (seg, None),
        };
        if attr.is_some() && segments.peek().is_some() {
            return Err(QueryError::Syntax);
        }
        if !name.is_empty() {
            node = doc
                .first_child_named(node, name)
                .ok_or(QueryError::NotFound)?;
        }
        if let Some(a) = attr {
            if a.is_empty() || a.contains(ATTR_SEP) {
                return Err(QueryError::Syntax);
            }
            return Ok((node, Some(a)));
        }
    }
    Ok((node, None))
}

fn check_syntax(path: &str) -> Result<(), QueryError> {
    let mut segments = path.split('/');
    // Everything but the last segment must be a plain element name.
    segments.next_back();
    if segments.any(|s| s.contains(ATTR_SEP)) {
        return Err(QueryError::Syntax);
    }
    Ok(())
}

/// The element addressed by `path`; attribute references are a syntax error.
pub fn first_node(doc: &Document, start: NodeId, path: &str) -> Result<NodeId, QueryError> {
    check_syntax(path)?;
    match resolve(doc, start, path)? {
        (node, None) => Ok(node),
        (_, Some(_)) => Err(QueryError::Syntax),
    }
}

/// Text value of the element, or value of the attribute, addressed by `path`.
pub fn first_str<'d>(
    doc: &'d Document,
    start: NodeId,
    path: &str,
) -> Result<&'d str, QueryError> {
    check_syntax(path)?;
    match resolve(doc, start, path)? {
        (node, None) => Ok(doc.value(node)),
        (node, Some(attr)) => doc.attribute(node, attr).ok_or(QueryError::NotFound),
    }
}

/// Like [`first_str`], failing with `BufferSize` if the value is longer than
/// `max_len` bytes.
pub fn first_str_bounded<'d>(
    doc: &'d Document,
    start: NodeId,
    path: &str,
    max_len: usize,
) -> Result<&'d str, QueryError> {
    let s = first_str(doc, start, path)?;
    if s.len() > max_len {
        return Err(QueryError::BufferSize);
    }
    Ok(s)
}

/// Parse the value addressed by `path` with `T::from_str`, ignoring
/// surrounding whitespace.
pub fn first_parsed<T: FromStr>(
    doc: &Document,
    start: NodeId,
    path: &str,
) -> Result<T, QueryError> {
    first_str(doc, start, path)?
        .trim()
        .parse()
        .map_err(|_| QueryError::Format)
}

pub fn first_int(doc: &Document, start: NodeId, path: &str) -> Result<i32, QueryError> {
    first_parsed(doc, start, path)
}

pub fn first_uint(doc: &Document, start: NodeId, path: &str) -> Result<u32, QueryError> {
    first_parsed(doc, start, path)
}

pub fn first_i64(doc: &Document, start: NodeId, path: &str) -> Result<i64, QueryError> {
    first_parsed(doc, start, path)
}

pub fn first_u64(doc: &Document, start: NodeId, path: &str) -> Result<u64, QueryError> {
    first_parsed(doc, start, path)
}

/// Boolean value addressed by `path`, see [`parse_bool`].
pub fn first_bool(doc: &Document, start: NodeId, path: &str) -> Result<bool, QueryError> {
    parse_bool(first_str(doc, start, path)?).ok_or(QueryError::Format)
}

/// Accepts yes/true/up/on and no/false/down/off in any case, and any integer
/// (nonzero is true).
pub fn parse_bool(s: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["yes", "true", "up", "on"];
    const FALSE: [&str; 4] = ["no", "false", "down", "off"];

    let s = s.trim();
    if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        return Some(true);
    }
    if FALSE.iter().any(|f| s.eq_ignore_ascii_case(f)) {
        return Some(false);
    }
    s.parse::<i64>().ok().map(|v| v != 0)
}

/// Path queries for types that wrap a decoded tree rooted at one element.
pub trait NodeQuery {
    fn document(&self) -> &Document;

    /// Element queries start from.
    fn root(&self) -> NodeId;

    fn first_node(&self, path: &str) -> Result<NodeId, QueryError> {
        first_node(self.document(), self.root(), path)
    }

    fn first_str(&self, path: &str) -> Result<&str, QueryError> {
        first_str(self.document(), self.root(), path)
    }

    fn first_str_bounded(&self, path: &str, max_len: usize) -> Result<&str, QueryError> {
        first_str_bounded(self.document(), self.root(), path, max_len)
    }

    fn first_int(&self, path: &str) -> Result<i32, QueryError> {
        first_int(self.document(), self.root(), path)
    }

    fn first_uint(&self, path: &str) -> Result<u32, QueryError> {
        first_uint(self.document(), self.root(), path)
    }

    fn first_i64(&self, path: &str) -> Result<i64, QueryError> {
        first_i64(self.document(), self.root(), path)
    }

    fn first_u64(&self, path: &str) -> Result<u64, QueryError> {
        first_u64(self.document(), self.root(), path)
    }

    fn first_bool(&self, path: &str) -> Result<bool, QueryError> {
        first_bool(self.document(), self.root(), path)
    }
}
