// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Event channel over a socket pair and a listening socket.

use std::io::Write;
use std::os::unix::net::{UnixListener, UnixStream};
use std::time::Duration;

use libcoreipc::{encode, Document, Error, EventConfig, EventConnection, NodeQuery};

fn event_bytes(attrs: &[(&str, &str)], payload: Option<(&str, &str)>) -> Vec<u8> {
    let mut doc = Document::new();
    let root = doc.root();
    let ev = doc.append_element(root, "event", "");
    for (k, v) in attrs {
        doc.append_attribute(ev, *k, *v);
    }
    if let Some((name, value)) = payload {
        doc.append_element(ev, name, value);
    }
    encode(&doc, ev).expect("encode event")
}

fn pair() -> (EventConnection, UnixStream) {
    let (a, b) = UnixStream::pair().expect("socketpair");
    let config = EventConfig::new().with_timeout(Duration::from_millis(500));
    (EventConnection::with_stream(a, config).expect("events"), b)
}

#[test]
fn receive_one_event() {
    let (mut events, mut core) = pair();
    assert!(!events.has_events().expect("poll"));

    core.write_all(&event_bytes(
        &[("class", "link"), ("raise_time", "1700000000.250")],
        Some(("interface", "eth0")),
    ))
    .expect("write");
    assert!(events.has_events().expect("poll"));

    let ev = events.get().expect("event");
    assert_eq!(ev.class(), "link");
    assert_eq!(ev.raise_time_ms(), 1_700_000_000_250);
    assert_eq!(ev.first_str("interface"), Ok("eth0"));
    assert_eq!(ev.first_str("@class"), Ok("link"));
    assert!(!events.has_events().expect("poll"));
}

#[test]
fn back_to_back_events_are_split() {
    let (mut events, mut core) = pair();
    let mut bytes = event_bytes(&[("class", "a"), ("raise_time", "1")], None);
    bytes.extend(event_bytes(&[("class", "b"), ("raise_time", "2.5")], None));
    core.write_all(&bytes).expect("write");

    assert_eq!(events.get().expect("first").class(), "a");
    // The second event is already in the receive buffer.
    assert!(events.has_events().expect("poll"));
    let second = events.get().expect("second");
    assert_eq!(second.class(), "b");
    assert_eq!(second.raise_time_ms(), 2005);
}

#[test]
fn missing_class_or_time_is_a_protocol_error() {
    let (mut events, mut core) = pair();
    core.write_all(&event_bytes(&[("raise_time", "1")], None))
        .expect("write");
    assert!(events.get().expect_err("no class").is_protocol());

    core.write_all(&event_bytes(&[("class", ""), ("raise_time", "1")], None))
        .expect("write");
    assert!(events.get().expect_err("empty class").is_protocol());

    core.write_all(&event_bytes(&[("class", "x"), ("raise_time", "soon")], None))
        .expect("write");
    assert!(events.get().expect_err("bad time").is_protocol());

    core.write_all(&event_bytes(&[("class", "x"), ("raise_time", "5.1000")], None))
        .expect("write");
    assert!(events.get().expect_err("millis out of range").is_protocol());

    core.write_all(&event_bytes(&[("class", "x"), ("raise_time", "5")], None))
        .expect("write");
    assert_eq!(events.get().expect("valid event").raise_time_ms(), 5000);
}

#[test]
fn non_event_root_is_a_protocol_error() {
    let (mut events, mut core) = pair();
    let mut doc = Document::new();
    let root = doc.root();
    let other = doc.append_element(root, "response", "");
    core.write_all(&encode(&doc, other).unwrap()).expect("write");
    assert!(events.get().expect_err("wrong root").is_protocol());
}

#[test]
fn get_times_out_when_idle() {
    let (mut events, _core) = pair();
    events.set_timeout(Duration::from_millis(100));
    assert_eq!(events.timeout(), Duration::from_millis(100));
    assert!(matches!(events.get(), Err(Error::Timeout)));
}

#[test]
fn hang_up_is_reported() {
    let (mut events, core) = pair();
    drop(core);
    assert!(events.has_events().expect("poll"));
    assert!(matches!(events.get(), Err(Error::Closed)));
}

#[test]
fn open_connects_to_the_event_socket() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("core.event.socket");
    let listener = UnixListener::bind(&path).expect("bind");

    let config = EventConfig::new()
        .with_socket_path(&path)
        .with_timeout(Duration::from_secs(2));
    let mut events = EventConnection::open(config).expect("open");
    let (mut core, _) = listener.accept().expect("accept");

    core.write_all(&event_bytes(&[("class", "boot"), ("raise_time", "10.1")], None))
        .expect("write");
    let ev = events.get().expect("event");
    assert_eq!(ev.class(), "boot");
    assert!(events.raw_fd() >= 0);
    events.close().expect("close");
}

#[test]
fn raise_time_beyond_the_clock_is_a_protocol_error() {
    let (mut events, mut core) = pair();
    core.write_all(&event_bytes(
        &[("class", "x"), ("raise_time", "18446744073709551615.999")],
        None,
    ))
    .expect("write");
    assert!(events.get().expect_err("time out of range").is_protocol());

    // The bad event was read whole, so the next one decodes normally.
    core.write_all(&event_bytes(&[("class", "y"), ("raise_time", "7")], None))
        .expect("write");
    assert_eq!(events.get().expect("valid event").class(), "y");
}

#[test]
fn idle_timeout_then_event() {
    let (mut events, mut core) = pair();
    events.set_timeout(Duration::from_millis(100));
    assert!(matches!(events.get(), Err(Error::Timeout)));

    core.write_all(&event_bytes(&[("class", "late"), ("raise_time", "3")], None))
        .expect("write");
    assert_eq!(events.get().expect("event after idle timeout").class(), "late");
}

#[test]
fn event_cut_off_by_timeout_desynchronizes() {
    let (mut events, mut core) = pair();
    events.set_timeout(Duration::from_millis(100));
    let first = event_bytes(
        &[("class", "link"), ("raise_time", "1700000000.250")],
        Some(("interface", "eth0")),
    );
    core.write_all(&first[..5]).expect("write");
    assert!(matches!(events.get(), Err(Error::Timeout)));

    core.write_all(&first[5..]).expect("write");
    core.write_all(&event_bytes(&[("class", "b"), ("raise_time", "2")], None))
        .expect("write");
    assert!(matches!(events.get(), Err(Error::Desynchronized)));
    assert!(matches!(events.get(), Err(Error::Desynchronized)));
}
