// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Status message classification, response codes and text expansion.

use libcoreipc::message::{
    argument_ref, bounded, expand_arguments, MESSAGE_IDENT_MAX, MESSAGE_TEXT_MAX,
};
use libcoreipc::{Document, Message, NodeId, Response, ResponseCode, ResponseType};
use proptest::prelude::*;

fn response(fill: impl FnOnce(&mut Document, NodeId)) -> Response {
    let mut doc = Document::new();
    let root = doc.root();
    let resp = doc.append_element(root, "response", "");
    fill(&mut doc, resp);
    Response::from_document(doc, 42).expect("response")
}

#[test]
fn info_and_warning_messages() {
    let r = response(|doc, resp| {
        let m = doc.append_element(resp, "message", "saved");
        doc.append_attribute(m, "warning", "no");
    });
    let msg = r.message();
    assert!(msg.received());
    assert_eq!(msg.response_type(), ResponseType::Info);
    assert_eq!(msg.text(), "saved");
    assert_eq!(msg.response_id(), Some(42));
    assert!(r.is_ok());

    let r = response(|doc, resp| {
        let m = doc.append_element(resp, "message", "deprecated");
        doc.append_attribute(m, "warning", "YES");
    });
    assert_eq!(r.message().response_type(), ResponseType::Warning);
    assert!(r.is_ok());
}

#[test]
fn error_and_critical_messages() {
    let r = response(|doc, resp| {
        let e = doc.append_element(resp, "error", "bad value");
        doc.append_attribute(e, "critical", "no");
        doc.append_attribute(e, "code", "0x00050007");
    });
    let msg = r.message();
    assert_eq!(msg.response_type(), ResponseType::Error);
    assert_eq!(msg.code().raw(), 0x8005_0007);
    assert_eq!(msg.code().group(), 5);
    assert_eq!(msg.code().local(), 7);
    assert!(msg.code().is_failed());
    assert!(!r.is_ok());

    let r = response(|doc, resp| {
        let e = doc.append_element(resp, "error", "gone");
        doc.append_attribute(e, "critical", "1");
    });
    let msg = r.message();
    assert_eq!(msg.response_type(), ResponseType::Critical);
    assert_eq!(msg.code(), ResponseCode::new(ResponseType::Critical, 0, 0));
}

#[test]
fn message_takes_precedence_over_error() {
    let r = response(|doc, resp| {
        let e = doc.append_element(resp, "error", "x");
        doc.append_attribute(e, "critical", "yes");
        let m = doc.append_element(resp, "message", "y");
        doc.append_attribute(m, "warning", "no");
    });
    assert_eq!(r.message().response_type(), ResponseType::Info);
}

#[test]
fn missing_discriminator_means_no_message() {
    let r = response(|doc, resp| {
        doc.append_element(resp, "message", "no flag");
    });
    assert!(!r.message().received());

    let r = response(|doc, resp| {
        let e = doc.append_element(resp, "error", "odd flag");
        doc.append_attribute(e, "critical", "sometimes");
    });
    assert!(!r.message().received());
    assert!(r.is_ok());

    let r = response(|_, _| {});
    assert_eq!(r.message().text(), "");
    assert!(!r.message().received());
}

#[test]
fn decimal_code_is_retagged() {
    let r = response(|doc, resp| {
        let m = doc.append_element(resp, "message", "w");
        doc.append_attribute(m, "warning", "yes");
        // Type bits of the original value are replaced.
        doc.append_attribute(m, "code", (0xC012_0034u32).to_string());
    });
    let code = r.message().code();
    assert_eq!(code.raw(), 0x4012_0034);
    assert_eq!(code.response_type(), ResponseType::Warning);
}

#[test]
fn argument_references_are_expanded() {
    let r = response(|doc, resp| {
        let text = format!(
            "interface {} is {}{}",
            argument_ref(0).unwrap(),
            argument_ref(1).unwrap(),
            argument_ref(5).unwrap()
        );
        let m = doc.append_element(resp, "message", text);
        doc.append_attribute(m, "warning", "no");
        doc.append_element(resp, "argument", "eth0");
        doc.append_element(resp, "argument", "down");
    });
    assert_eq!(r.message().text(), "interface eth0 is down");
}

#[test]
fn argument_ref_range() {
    assert_eq!(argument_ref(0), Some('\u{E000}'));
    assert_eq!(argument_ref(63), Some('\u{E03F}'));
    assert_eq!(argument_ref(64), None);
    assert_eq!(expand_arguments("a\u{E000}b", &["X"]), "aXb");
    assert_eq!("\u{E03F}".as_bytes(), [0xEE, 0x80, 0xBF]);
}

#[test]
fn long_fields_are_truncated_with_ellipsis() {
    let r = response(|doc, resp| {
        let m = doc.append_element(resp, "message", "x".repeat(MESSAGE_TEXT_MAX * 2));
        doc.append_attribute(m, "warning", "no");
        doc.append_attribute(m, "ident", "i".repeat(100));
        doc.append_attribute(m, "source", "short");
    });
    let msg = r.message();
    assert_eq!(msg.text().len(), MESSAGE_TEXT_MAX);
    assert!(msg.text().ends_with("..."));
    assert_eq!(msg.ident().len(), MESSAGE_IDENT_MAX);
    assert_eq!(msg.source(), "short");
    assert_eq!(bounded("abc", 3), "abc");
}

#[test]
fn none_is_not_received() {
    let m = Message::none();
    assert!(!m.received());
    assert!(m.is_ok());
    assert_eq!(m.response_id(), None);
}

fn any_type() -> impl Strategy<Value = ResponseType> {
    prop_oneof![
        Just(ResponseType::Info),
        Just(ResponseType::Warning),
        Just(ResponseType::Error),
        Just(ResponseType::Critical),
    ]
}

proptest! {
    /// Group and local code survive encoding for every type prefix.
    #[test]
    fn prop_code_round_trip(ty in any_type(), group in 0u16..=0xFFF, local in any::<u16>()) {
        let code = ResponseCode::new(ty, group, local);
        prop_assert_eq!(code.group(), group);
        prop_assert_eq!(code.local(), local);
        prop_assert_eq!(code.response_type(), ty);
        prop_assert_eq!(code.is_failed(), ty.is_failure());
        prop_assert_eq!(ResponseCode::from_raw(code.raw()), code);
    }

    /// Retagging keeps group and local code of any raw value.
    #[test]
    fn prop_retag_keeps_fields(raw in any::<u32>(), ty in any_type()) {
        let code = ResponseCode::retag(raw, ty);
        prop_assert_eq!(code.group(), ((raw >> 16) & 0xFFF) as u16);
        prop_assert_eq!(code.local(), (raw & 0xFFFF) as u16);
        prop_assert_eq!(code.response_type(), ty);
    }
}
