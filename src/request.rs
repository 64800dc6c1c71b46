// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Request documents sent to the core.
//
// Every request is a `request` element tagged with the caller's agent id and
// holding one command element. Config and execute commands name the command
// in a `name` attribute and take arguments; a parse command carries the
// command line as its text and takes none.

use crate::codec;
use crate::error::{Error, Result};
use crate::tree::{Document, NodeId};

/// Prefix marking an argument key as an attribute rather than a child element.
pub const ATTRIBUTE_MARKER: char = '@';

/// Root element of every request.
pub const REQUEST_ELEMENT: &str = "request";

const AGENT_ATTR: &str = "agent";
const NAME_ATTR: &str = "name";

/// Kind of command request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Config,
    Execute,
    Parse,
}

impl RequestKind {
    /// Element name of the command node.
    pub const fn element(self) -> &'static str {
        match self {
            RequestKind::Config => "config",
            RequestKind::Execute => "command",
            RequestKind::Parse => "parse",
        }
    }
}

/// Whether a request may be answered from the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheMode {
    #[default]
    Cached,
    /// Skip the lookup and do not store the reply.
    Bypass,
}

/// Builder for one request document.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    doc: Document,
    request: NodeId,
    command: NodeId,
    kind: Option<RequestKind>,
}

impl RequestBuilder {
    fn with_root(agent: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let request = doc.append_element(root, REQUEST_ELEMENT, "");
        doc.append_attribute(request, AGENT_ATTR, agent);
        (doc, request)
    }

    /// A config, execute or parse request for `command`.
    pub fn new(agent: &str, kind: RequestKind, command: &str) -> Self {
        let (mut doc, request) = Self::with_root(agent);
        let node = match kind {
            RequestKind::Parse => doc.append_element(request, kind.element(), command),
            RequestKind::Config | RequestKind::Execute => {
                let node = doc.append_element(request, kind.element(), "");
                doc.append_attribute(node, NAME_ATTR, command);
                node
            }
        };
        Self {
            doc,
            request,
            command: node,
            kind: Some(kind),
        }
    }

    /// A request holding a single empty element, e.g. `<continue/>`.
    pub fn bare(agent: &str, tag: &str) -> Self {
        Self::with_value(agent, tag, "")
    }

    /// A request holding a single element with text `value`.
    pub fn with_value(agent: &str, tag: &str, value: &str) -> Self {
        let (mut doc, request) = Self::with_root(agent);
        let command = doc.append_element(request, tag, value);
        Self {
            doc,
            request,
            command,
            kind: None,
        }
    }

    /// A login request.
    pub fn hello(agent: &str, user: &str, password: &str, tag: &str) -> Self {
        let mut b = Self::bare(agent, "hello");
        let hello = b.command;
        b.doc.append_element(hello, "user", user);
        b.doc.append_element(hello, "password", password);
        b.doc.append_element(hello, "tag", tag);
        b
    }

    /// Add an argument to the command element.
    ///
    /// A key starting with [`ATTRIBUTE_MARKER`] becomes an attribute named
    /// after the rest of the key; any other key becomes a child element with
    /// `value` as its text. Parse requests take no arguments, and the
    /// attribute `name` is reserved for the command itself.
    pub fn argument(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        match key.strip_prefix(ATTRIBUTE_MARKER) {
            Some(attr) => self.attribute(self.command, attr, value)?,
            None => {
                self.element(self.command, key, value)?;
            }
        }
        Ok(self)
    }

    /// Add every `(key, value)` pair with [`argument`](Self::argument).
    pub fn arguments<K, V>(&mut self, args: &[(K, V)]) -> Result<&mut Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (k, v) in args {
            self.argument(k.as_ref(), v.as_ref())?;
        }
        Ok(self)
    }

    // The command node of a parse request holds only the command line.
    fn check_target(&self, node: NodeId) -> Result<()> {
        if node == self.command && self.kind == Some(RequestKind::Parse) {
            return Err(Error::invalid("parse requests take no arguments"));
        }
        Ok(())
    }

    /// Append a child element with text `value` below `parent`.
    pub fn element(&mut self, parent: NodeId, name: &str, value: &str) -> Result<NodeId> {
        if name.is_empty() {
            return Err(Error::invalid("element without a name"));
        }
        self.check_target(parent)?;
        Ok(self.doc.append_element(parent, name, value))
    }

    /// Attach an attribute to `node`.
    pub fn attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid("attribute without a name"));
        }
        self.check_target(node)?;
        if node == self.command && name == NAME_ATTR && self.kind.is_some() {
            return Err(Error::invalid("attribute `name` is reserved"));
        }
        self.doc.append_attribute(node, name, value);
        Ok(())
    }

    /// Replace the text of `node`.
    pub fn text(&mut self, node: NodeId, value: &str) -> &mut Self {
        self.doc.set_value(node, value);
        self
    }

    pub fn kind(&self) -> Option<RequestKind> {
        self.kind
    }

    /// The `request` element.
    pub fn request_node(&self) -> NodeId {
        self.request
    }

    /// The command element below `request`.
    pub fn command_node(&self) -> NodeId {
        self.command
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Wire encoding of the request element.
    pub fn encode(&self) -> Result<Vec<u8>> {
        codec::encode(&self.doc, self.request)
    }
}
