// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Path extraction on decoded trees.

use libcoreipc::query::{first_bool, first_int, first_node, first_str, first_str_bounded};
use libcoreipc::{Document, NodeId, NodeQuery, QueryError, Response};

/// `<response><a><b c="5">ignored</b></a></response>`
fn sample() -> (Document, NodeId) {
    let mut doc = Document::new();
    let root = doc.root();
    let resp = doc.append_element(root, "response", "");
    let a = doc.append_element(resp, "a", "");
    let b = doc.append_element(a, "b", "ignored");
    doc.append_attribute(b, "c", "5");
    (doc, resp)
}

#[test]
fn element_text() {
    let (doc, resp) = sample();
    assert_eq!(first_str(&doc, resp, "a/b"), Ok("ignored"));
}

#[test]
fn attribute_value_as_int() {
    let (doc, resp) = sample();
    assert_eq!(first_int(&doc, resp, "a/b@c"), Ok(5));
}

#[test]
fn missing_segment_is_not_found() {
    let (doc, resp) = sample();
    assert_eq!(first_str(&doc, resp, "a/x"), Err(QueryError::NotFound));
    assert_eq!(first_str(&doc, resp, "a/b@missing"), Err(QueryError::NotFound));
}

#[test]
fn attribute_mid_path_is_syntax_error() {
    let (doc, resp) = sample();
    assert_eq!(first_str(&doc, resp, "a@b/c"), Err(QueryError::Syntax));
    assert_eq!(first_node(&doc, resp, "a/b@c"), Err(QueryError::Syntax));
}

#[test]
fn non_numeric_value_is_format_error() {
    let (doc, resp) = sample();
    assert_eq!(first_int(&doc, resp, "a/b"), Err(QueryError::Format));
    assert_eq!(first_bool(&doc, resp, "a/b"), Err(QueryError::Format));
}

#[test]
fn empty_path_and_bare_attribute() {
    let (doc, resp) = sample();
    let a = first_node(&doc, resp, "a").unwrap();
    let b = first_node(&doc, a, "b").unwrap();
    assert_eq!(first_node(&doc, b, ""), Ok(b));
    assert_eq!(first_str(&doc, b, "@c"), Ok("5"));
    assert_eq!(first_str(&doc, resp, "/a//b/"), Ok("ignored"));
}

#[test]
fn first_match_wins_without_backtracking() {
    let mut doc = Document::new();
    let root = doc.root();
    let resp = doc.append_element(root, "response", "");
    doc.append_element(resp, "item", "");
    let second = doc.append_element(resp, "item", "");
    doc.append_element(second, "name", "deep");
    assert_eq!(first_str(&doc, resp, "item/name"), Err(QueryError::NotFound));
}

#[test]
fn numbers_and_booleans() {
    let mut doc = Document::new();
    let root = doc.root();
    let resp = doc.append_element(root, "response", "");
    doc.append_element(resp, "mtu", " 1500 ");
    doc.append_element(resp, "neg", "-7");
    doc.append_element(resp, "big", "18446744073709551615");
    doc.append_element(resp, "up", "Up");
    doc.append_element(resp, "off", "OFF");
    doc.append_element(resp, "n", "0");
    let r = Response::from_document(doc, 1).unwrap();

    assert_eq!(r.first_int("mtu"), Ok(1500));
    assert_eq!(r.first_uint("neg"), Err(QueryError::Format));
    assert_eq!(r.first_i64("neg"), Ok(-7));
    assert_eq!(r.first_u64("big"), Ok(u64::MAX));
    assert_eq!(r.first_int("big"), Err(QueryError::Format));
    assert_eq!(r.first_bool("up"), Ok(true));
    assert_eq!(r.first_bool("off"), Ok(false));
    assert_eq!(r.first_bool("n"), Ok(false));
}

#[test]
fn bounded_string() {
    let (doc, resp) = sample();
    assert_eq!(first_str_bounded(&doc, resp, "a/b", 7), Ok("ignored"));
    assert_eq!(
        first_str_bounded(&doc, resp, "a/b", 6),
        Err(QueryError::BufferSize)
    );
}
