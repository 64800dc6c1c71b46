// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Status messages reported by the core inside a response.
//
// A response carries at most one status: a `message` element (info or
// warning, told apart by its `warning` attribute) or, failing that, an
// `error` element (error or critical, by its `critical` attribute). The
// element value is the text; `argument` elements next to it fill in the
// argument references embedded in that text.

use std::fmt;

use crate::query::parse_bool;
use crate::tree::{Document, NodeId};

/// Longest message text kept, in bytes.
pub const MESSAGE_TEXT_MAX: usize = 1024;
/// Longest message identifier kept, in bytes.
pub const MESSAGE_IDENT_MAX: usize = 64;
/// Longest message source kept, in bytes.
pub const MESSAGE_SOURCE_MAX: usize = 64;

const ELLIPSIS: &str = "...";

/// First and last argument reference characters (private use area).
const ARG_REF_FIRST: char = '\u{E000}';
const ARG_REF_LAST: char = '\u{E03F}';

/// Severity of a core status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseType {
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl ResponseType {
    const fn prefix(self) -> u32 {
        match self {
            ResponseType::Info => 0b00,
            ResponseType::Warning => 0b01,
            ResponseType::Error => 0b10,
            ResponseType::Critical => 0b11,
        }
    }

    const fn from_prefix(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => ResponseType::Info,
            0b01 => ResponseType::Warning,
            0b10 => ResponseType::Error,
            _ => ResponseType::Critical,
        }
    }

    /// Error and critical messages mean the request failed.
    pub const fn is_failure(self) -> bool {
        matches!(self, ResponseType::Error | ResponseType::Critical)
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResponseType::Info => "info",
            ResponseType::Warning => "warning",
            ResponseType::Error => "error",
            ResponseType::Critical => "critical",
        })
    }
}

/// 32-bit response code.
///
/// ```text
///   31..30  type (00 info, 01 warning, 10 error, 11 critical)
///   29..28  reserved
///   27..16  group
///   15..0   local code
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResponseCode(u32);

impl ResponseCode {
    const TYPE_SHIFT: u32 = 30;
    const GROUP_SHIFT: u32 = 16;
    const GROUP_MASK: u32 = 0xFFF;
    const LOCAL_MASK: u32 = 0xFFFF;
    const FAILED_BIT: u32 = 1 << 31;

    /// Build a code; `group` is cut to 12 bits.
    pub const fn new(ty: ResponseType, group: u16, local: u16) -> Self {
        Self(
            (ty.prefix() << Self::TYPE_SHIFT)
                | ((group as u32 & Self::GROUP_MASK) << Self::GROUP_SHIFT)
                | local as u32,
        )
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn response_type(self) -> ResponseType {
        ResponseType::from_prefix(self.0 >> Self::TYPE_SHIFT)
    }

    pub const fn group(self) -> u16 {
        ((self.0 >> Self::GROUP_SHIFT) & Self::GROUP_MASK) as u16
    }

    pub const fn local(self) -> u16 {
        (self.0 & Self::LOCAL_MASK) as u16
    }

    pub const fn is_failed(self) -> bool {
        self.0 & Self::FAILED_BIT != 0
    }

    /// Keep the group and local code of `raw`, replacing its type bits.
    pub const fn retag(raw: u32, ty: ResponseType) -> Self {
        let code = Self(raw);
        Self::new(ty, code.group(), code.local())
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Status message extracted from a response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    received: bool,
    code: ResponseCode,
    ty: ResponseType,
    text: String,
    ident: String,
    source: String,
    response_id: Option<u64>,
}

impl Message {
    /// The "nothing received" message.
    pub fn none() -> Self {
        Self::default()
    }

    /// Extract the status of the response element `root`, tagging the result
    /// with `response_id`.
    pub fn extract(doc: &Document, root: NodeId, response_id: u64) -> Self {
        let mut msg = classify(doc, root)
            .map(|(node, ty)| build(doc, node, ty))
            .unwrap_or_default();
        msg.response_id = Some(response_id);
        msg
    }

    /// Whether the response carried a recognizable status.
    pub fn received(&self) -> bool {
        self.received
    }

    pub fn code(&self) -> ResponseCode {
        self.code
    }

    pub fn response_type(&self) -> ResponseType {
        self.ty
    }

    /// Text with argument references expanded.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Response this message was computed from.
    pub fn response_id(&self) -> Option<u64> {
        self.response_id
    }

    /// True if no status was received or it is not a failure.
    pub fn is_ok(&self) -> bool {
        !(self.received && self.ty.is_failure())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.received {
            return f.write_str("(no message)");
        }
        write!(f, "{} {}: {}", self.ty, self.code, self.text)
    }
}

fn classify(doc: &Document, root: NodeId) -> Option<(NodeId, ResponseType)> {
    if let Some(node) = doc.first_child_named(root, "message") {
        let warning = parse_bool(doc.attribute(node, "warning")?)?;
        let ty = if warning {
            ResponseType::Warning
        } else {
            ResponseType::Info
        };
        return Some((node, ty));
    }
    let node = doc.first_child_named(root, "error")?;
    let critical = parse_bool(doc.attribute(node, "critical")?)?;
    let ty = if critical {
        ResponseType::Critical
    } else {
        ResponseType::Error
    };
    Some((node, ty))
}

fn build(doc: &Document, node: NodeId, ty: ResponseType) -> Message {
    let raw = doc
        .attribute(node, "code")
        .and_then(parse_code)
        .unwrap_or(0);
    let args = arguments(doc, node);
    let text = expand_arguments(doc.value(node), &args);
    Message {
        received: true,
        code: ResponseCode::retag(raw, ty),
        ty,
        text: bounded(&text, MESSAGE_TEXT_MAX),
        ident: bounded(doc.attribute(node, "ident").unwrap_or(""), MESSAGE_IDENT_MAX),
        source: bounded(doc.attribute(node, "source").unwrap_or(""), MESSAGE_SOURCE_MAX),
        response_id: None,
    }
}

/// `argument` elements beside the message element, in document order.
fn arguments(doc: &Document, node: NodeId) -> Vec<&str> {
    let Some(parent) = doc.parent(node) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cur = doc.first_child_named(parent, "argument");
    while let Some(arg) = cur {
        out.push(doc.value(arg));
        cur = doc.next_sibling_named(arg, "argument");
    }
    out
}

/// Parse a decimal or `0x`-prefixed hexadecimal code.
pub fn parse_code(s: &str) -> Option<u32> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Replace every argument reference in `text` with the argument it selects;
/// references past the end of `args` are dropped.
pub fn expand_arguments(text: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if (ARG_REF_FIRST..=ARG_REF_LAST).contains(&c) {
            let index = (c as u32 - ARG_REF_FIRST as u32) as usize;
            if let Some(arg) = args.get(index) {
                out.push_str(arg);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Argument reference character for argument `index` (0..64).
pub fn argument_ref(index: u8) -> Option<char> {
    char::from_u32(ARG_REF_FIRST as u32 + u32::from(index)).filter(|c| *c <= ARG_REF_LAST)
}

/// Copy `s`, cutting it to at most `max` bytes with a trailing ellipsis.
pub fn bounded(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_owned();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut cut = keep;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = String::with_capacity(cut + ELLIPSIS.len());
    out.push_str(&s[..cut]);
    out.push_str(&ELLIPSIS[..max.min(ELLIPSIS.len())]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_layout() {
        let c = ResponseCode::new(ResponseType::Critical, 0xABC, 0x1234);
        assert_eq!(c.raw(), 0xCABC_1234);
        assert!(c.is_failed());
        assert!(!ResponseCode::new(ResponseType::Warning, 1, 1).is_failed());
    }

    #[test]
    fn bounded_respects_char_boundaries() {
        let s = "ééééé";
        let b = bounded(s, 6);
        assert!(b.len() <= 6);
        assert!(b.ends_with("..."));
        assert_eq!(bounded("short", 64), "short");
    }

    #[test]
    fn codes_in_hex_and_decimal() {
        assert_eq!(parse_code("0x10"), Some(16));
        assert_eq!(parse_code(" 42 "), Some(42));
        assert_eq!(parse_code("nope"), None);
    }
}
