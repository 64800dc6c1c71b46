// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Decoded reply to one request.

use crate::error::{Error, Result};
use crate::message::Message;
use crate::query::NodeQuery;
use crate::tree::{Document, NodeId};

/// Root element name of every reply.
pub const RESPONSE_ELEMENT: &str = "response";
/// Marker child of a partial reply; more follows after a `continue` request.
pub const CONTINUED_ELEMENT: &str = "continued";

/// A response document together with its `response` element.
#[derive(Debug, Clone)]
pub struct Response {
    doc: Document,
    root: NodeId,
    id: u64,
}

impl Response {
    /// Wrap a decoded document; it must hold a top-level `response` element.
    pub fn from_document(doc: Document, id: u64) -> Result<Self> {
        let root = doc
            .first_child_named(doc.root(), RESPONSE_ELEMENT)
            .ok_or_else(|| Error::protocol("reply has no response element"))?;
        Ok(Self { doc, root, id })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The `response` element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Id assigned when the response was received.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether this is a partial reply.
    pub fn is_continued(&self) -> bool {
        self.doc
            .first_child_named(self.root, CONTINUED_ELEMENT)
            .is_some()
    }

    /// Status message carried by this response.
    pub fn message(&self) -> Message {
        Message::extract(&self.doc, self.root, self.id)
    }

    /// No status, or an info or warning status.
    pub fn is_ok(&self) -> bool {
        self.message().is_ok()
    }

    pub fn into_document(self) -> Document {
        self.doc
    }
}

impl NodeQuery for Response {
    fn document(&self) -> &Document {
        &self.doc
    }

    fn root(&self) -> NodeId {
        self.root
    }
}
