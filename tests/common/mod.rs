// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// In-process stand-in for the core daemon, shared by the integration tests.

#![allow(dead_code)]

use std::os::unix::net::UnixListener;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use libcoreipc::{
    decode_document, encode, BufferedChannel, Deadline, Document, Interrupt, NodeId,
};
use tempfile::TempDir;

/// What the fake core does with one request.
pub enum Reply {
    /// Send these bytes back.
    Bytes(Vec<u8>),
    /// Send these bytes back after sleeping.
    Delayed(Duration, Vec<u8>),
    /// Read the request and never answer.
    Silent,
    /// Drop the connection without answering.
    HangUp,
}

type Handler = dyn Fn(&Document, NodeId) -> Reply + Send + Sync;

/// A listening fake core; every request it decodes is recorded.
pub struct FakeCore {
    _dir: TempDir,
    path: PathBuf,
    count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Document>>>,
}

impl FakeCore {
    /// Listen on a fresh socket and answer each request with `handler`,
    /// called with the decoded document and its `request` element.
    pub fn spawn(handler: impl Fn(&Document, NodeId) -> Reply + Send + Sync + 'static) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("core.socket");
        let listener = UnixListener::bind(&path).expect("bind");
        let count = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        {
            let count = Arc::clone(&count);
            let requests = Arc::clone(&requests);
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { return };
                    let count = Arc::clone(&count);
                    let requests = Arc::clone(&requests);
                    let handler = Arc::clone(&handler);
                    thread::spawn(move || {
                        let mut chan =
                            BufferedChannel::new(stream, Interrupt::new()).expect("server channel");
                        serve(&mut chan, &*handler, &count, &requests);
                    });
                }
            });
        }

        Self {
            _dir: dir,
            path,
            count,
            requests,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of requests received so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Copies of the received request documents, oldest first.
    pub fn requests(&self) -> Vec<Document> {
        self.requests.lock().expect("requests").clone()
    }
}

fn serve(
    chan: &mut BufferedChannel,
    handler: &Handler,
    count: &AtomicUsize,
    requests: &Mutex<Vec<Document>>,
) {
    loop {
        let deadline = Deadline::after(Duration::from_secs(30));
        let Ok(doc) = decode_document(&mut chan.reader(deadline)) else {
            return;
        };
        let Some(request) = doc.first_child_named(doc.root(), "request") else {
            return;
        };
        let reply = handler(&doc, request);
        requests.lock().expect("requests").push(doc);
        count.fetch_add(1, Ordering::AcqRel);
        match reply {
            Reply::Bytes(bytes) => {
                if chan.send_all(&bytes, deadline).is_err() {
                    return;
                }
            }
            Reply::Delayed(pause, bytes) => {
                thread::sleep(pause);
                if chan.send_all(&bytes, deadline).is_err() {
                    return;
                }
            }
            Reply::Silent => {}
            Reply::HangUp => return,
        }
    }
}

/// A document holding an empty `response` element, after `fill` ran on it.
pub fn response_doc(fill: impl FnOnce(&mut Document, NodeId)) -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    let resp = doc.append_element(root, "response", "");
    fill(&mut doc, resp);
    doc
}

/// Wire bytes of the `response` element of `doc`.
pub fn reply_bytes(doc: &Document) -> Vec<u8> {
    let resp = doc
        .first_child_named(doc.root(), "response")
        .expect("response element");
    encode(doc, resp).expect("encode reply")
}

/// Shorthand for `Reply::Bytes(reply_bytes(&response_doc(fill)))`.
pub fn reply(fill: impl FnOnce(&mut Document, NodeId)) -> Reply {
    Reply::Bytes(reply_bytes(&response_doc(fill)))
}

/// The command element of a recorded request and its name.
pub fn command_of(doc: &Document, request: NodeId) -> (NodeId, String) {
    let cmd = doc.first_child(request).expect("command element");
    (cmd, doc.name(cmd).to_owned())
}
