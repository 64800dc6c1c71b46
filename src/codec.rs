// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Binary tree serialization used on the core sockets.
//
// A tree is sent depth-first as a sequence of units. Each unit starts with a
// control byte:
//
//   bits 7..6  kind  00 new child, 01 attribute, 10 new sibling, 11 end of children
//   bits 5..0  node-type tag (NodeKind discriminant, 0..=7)
//
// New-child, new-sibling and attribute units are followed by two strings,
// name then value, each a 4-byte big-endian length and the raw bytes.
//
// After the children of a node an end-of-children unit is sent if the node
// had at least one child, and always for the top-level node. A document node
// may only appear as the very first unit.

use crate::error::{Error, Result};
use crate::tree::{Document, NodeId, NodeKind};

/// Longest string accepted from the wire.
pub const MAX_WIRE_STRING: usize = 16 * 1024 * 1024;

const KIND_SHIFT: u8 = 6;
const TAG_MASK: u8 = 0x3F;

/// Kind of a wire unit (the two high bits of its control byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    NewChild,
    Attribute,
    NewSibling,
    EndOfChildren,
}

impl Control {
    const fn bits(self) -> u8 {
        match self {
            Control::NewChild => 0b00,
            Control::Attribute => 0b01,
            Control::NewSibling => 0b10,
            Control::EndOfChildren => 0b11,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Control::NewChild,
            0b01 => Control::Attribute,
            0b10 => Control::NewSibling,
            _ => Control::EndOfChildren,
        }
    }
}

/// Pack a unit kind and a node-type tag into a control byte.
pub const fn control_byte(control: Control, tag: u8) -> u8 {
    (control.bits() << KIND_SHIFT) | (tag & TAG_MASK)
}

/// Split a control byte into its unit kind and node-type tag.
pub const fn split_control(byte: u8) -> (Control, u8) {
    (Control::from_bits(byte >> KIND_SHIFT), byte & TAG_MASK)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Output of the encoder: either a byte counter or a real buffer, so the
/// exact size can be measured before anything is allocated.
trait Sink {
    fn put(&mut self, bytes: &[u8]);
}

struct Counter(usize);

impl Sink for Counter {
    fn put(&mut self, bytes: &[u8]) {
        self.0 += bytes.len();
    }
}

impl Sink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

fn put_string<S: Sink>(out: &mut S, s: &str) -> Result<()> {
    let len = u32::try_from(s.len())
        .ok()
        .filter(|&l| l as usize <= MAX_WIRE_STRING)
        .ok_or_else(|| Error::invalid(format!("string of {} bytes is too long", s.len())))?;
    out.put(&len.to_be_bytes());
    out.put(s.as_bytes());
    Ok(())
}

fn put_unit<S: Sink>(
    out: &mut S,
    control: Control,
    tag: u8,
    name: &str,
    value: &str,
) -> Result<()> {
    out.put(&[control_byte(control, tag)]);
    put_string(out, name)?;
    put_string(out, value)
}

fn check_name(kind: NodeKind, name: &str) -> std::result::Result<(), String> {
    if kind.requires_name() && name.is_empty() {
        return Err(format!("{kind:?} node without a name"));
    }
    if !kind.requires_name() && !name.is_empty() {
        return Err(format!("{kind:?} node must not be named"));
    }
    Ok(())
}

fn encode_node<S: Sink>(
    doc: &Document,
    id: NodeId,
    level: usize,
    first: bool,
    out: &mut S,
) -> Result<()> {
    let kind = doc.kind(id);
    if kind == NodeKind::Document && level != 0 {
        return Err(Error::invalid("document node below the top level"));
    }
    check_name(kind, doc.name(id)).map_err(Error::InvalidArgument)?;

    let control = if first {
        Control::NewChild
    } else {
        Control::NewSibling
    };
    put_unit(out, control, kind.tag(), doc.name(id), doc.value(id))?;

    for attr in doc.attributes(id) {
        if attr.name.is_empty() {
            return Err(Error::invalid("attribute without a name"));
        }
        put_unit(
            out,
            Control::Attribute,
            NodeKind::Element.tag(),
            &attr.name,
            &attr.value,
        )?;
    }

    let mut had_children = false;
    for (i, child) in doc.children(id).enumerate() {
        encode_node(doc, child, level + 1, i == 0, out)?;
        had_children = true;
    }
    if had_children || level == 0 {
        out.put(&[control_byte(Control::EndOfChildren, kind.tag())]);
    }
    Ok(())
}

/// Exact number of bytes [`encode`] produces for the subtree at `node`.
pub fn encoded_len(doc: &Document, node: NodeId) -> Result<usize> {
    let mut counter = Counter(0);
    encode_node(doc, node, 0, true, &mut counter)?;
    Ok(counter.0)
}

/// Append the encoding of the subtree at `node` to `out`.
pub fn encode_into(doc: &Document, node: NodeId, out: &mut Vec<u8>) -> Result<()> {
    encode_node(doc, node, 0, true, out)
}

/// Serialize the subtree at `node`.
///
/// The size is measured first, so the result is allocated exactly once.
pub fn encode(doc: &Document, node: NodeId) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(encoded_len(doc, node)?);
    encode_into(doc, node, &mut out)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Byte source the decoder pulls from.
///
/// Implementations either fill `dst` completely or fail; a source bound to
/// a deadline fails with [`Error::Timeout`] once it passes.
pub trait WireSource {
    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()>;
}

impl WireSource for &[u8] {
    fn read_exact(&mut self, dst: &mut [u8]) -> Result<()> {
        if self.len() < dst.len() {
            return Err(Error::protocol("truncated stream"));
        }
        let (head, tail) = self.split_at(dst.len());
        dst.copy_from_slice(head);
        *self = tail;
        Ok(())
    }
}

fn read_u8<W: WireSource + ?Sized>(src: &mut W) -> Result<u8> {
    let mut b = [0u8; 1];
    src.read_exact(&mut b)?;
    Ok(b[0])
}

fn read_string<W: WireSource + ?Sized>(src: &mut W) -> Result<String> {
    let mut len = [0u8; 4];
    src.read_exact(&mut len)?;
    let len = u32::from_be_bytes(len) as usize;
    if len > MAX_WIRE_STRING {
        return Err(Error::protocol(format!("string length {len} exceeds the limit")));
    }
    let mut bytes = vec![0u8; len];
    src.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| Error::protocol("string is not valid UTF-8"))
}

/// Read exactly one subtree from `src` and attach it below `parent`.
///
/// If the stream starts with a document unit, `parent` must be a document
/// node and the document's children are attached to it directly. Returns the
/// top-level node that was created (or `parent` for a document stream).
///
/// On error the nodes decoded so far stay attached to `parent`.
pub fn decode<W: WireSource + ?Sized>(
    src: &mut W,
    doc: &mut Document,
    parent: NodeId,
) -> Result<NodeId> {
    let mut cursor = parent;
    // Depth of `cursor` below `parent`.
    let mut level = 0usize;
    // Decoding ends once an end-of-children unit brings `level` down to this.
    let mut limit = 1usize;
    let mut top = None;
    let mut first_unit = true;

    loop {
        let (control, tag) = split_control(read_u8(src)?);
        let kind = NodeKind::from_tag(tag)
            .ok_or_else(|| Error::protocol(format!("unknown node type tag {tag}")))?;

        match control {
            Control::NewChild | Control::NewSibling => {
                let name = read_string(src)?;
                let value = read_string(src)?;

                if kind == NodeKind::Document {
                    if !first_unit || control != Control::NewChild {
                        return Err(Error::protocol("document unit is only allowed first"));
                    }
                    if doc.kind(parent) != NodeKind::Document {
                        return Err(Error::protocol("document unit outside of a document node"));
                    }
                    check_name(kind, &name).map_err(Error::Protocol)?;
                    limit = 0;
                    top = Some(parent);
                    first_unit = false;
                    continue;
                }
                check_name(kind, &name).map_err(Error::Protocol)?;

                let id = if control == Control::NewChild {
                    let id = doc.append_child(cursor, kind, name, value);
                    level += 1;
                    id
                } else {
                    let owner = match doc.parent(cursor) {
                        Some(p) if level > 0 => p,
                        _ => return Err(Error::protocol("sibling without a parent")),
                    };
                    doc.append_child(owner, kind, name, value)
                };
                cursor = id;
                top.get_or_insert(id);
            }
            Control::Attribute => {
                let name = read_string(src)?;
                let value = read_string(src)?;
                if level == 0 {
                    return Err(Error::protocol("attribute without a parent"));
                }
                if name.is_empty() {
                    return Err(Error::protocol("attribute without a name"));
                }
                doc.append_attribute(cursor, name, value);
            }
            Control::EndOfChildren => {
                if level == 0 {
                    if limit == 0 {
                        return Ok(parent);
                    }
                    return Err(Error::protocol("end of children without a node"));
                }
                cursor = doc
                    .parent(cursor)
                    .ok_or_else(|| Error::protocol("end of children above the top level"))?;
                level -= 1;
                if level <= limit {
                    return Ok(top.unwrap_or(parent));
                }
            }
        }
        first_unit = false;
    }
}

/// Decode one subtree into a fresh document.
pub fn decode_document<W: WireSource + ?Sized>(src: &mut W) -> Result<Document> {
    let mut doc = Document::new();
    let root = doc.root();
    decode(src, &mut doc, root)?;
    Ok(doc)
}
