// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Send one request to the core and print the reply.
//
// Usage:
//   demo_request <config|execute|parse> <command> [key=value | @attr=value ...]
//
// The socket path defaults to /var/run/core.socket and can be overridden
// with CORE_SOCKET. Log output is controlled by RUST_LOG.

use std::sync::OnceLock;

use libcoreipc::config::CORE_SOCKET_PATH;
use libcoreipc::{
    CacheMode, Connection, ConnectionConfig, Document, Interrupt, NodeId, NodeKind, RequestKind,
};
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!("usage: demo_request <config|execute|parse> <command> [key=value | @attr=value ...]");
    std::process::exit(1);
}

fn dump(doc: &Document, id: NodeId, depth: usize) {
    let pad = "  ".repeat(depth);
    match doc.kind(id) {
        NodeKind::Element => {
            let attrs: String = doc
                .attributes(id)
                .iter()
                .map(|a| format!(" {}={:?}", a.name, a.value))
                .collect();
            if doc.value(id).is_empty() {
                println!("{pad}<{}{attrs}>", doc.name(id));
            } else {
                println!("{pad}<{}{attrs}> {:?}", doc.name(id), doc.value(id));
            }
        }
        NodeKind::Document => {}
        other => println!("{pad}[{other:?}] {:?}", doc.value(id)),
    }
    for child in doc.children(id) {
        dump(doc, child, depth + 1);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        usage();
    }
    let kind = match args[1].as_str() {
        "config" => RequestKind::Config,
        "execute" => RequestKind::Execute,
        "parse" => RequestKind::Parse,
        _ => usage(),
    };
    let pairs: Vec<(&str, &str)> = args[3..]
        .iter()
        .map(|a| a.split_once('=').unwrap_or((a.as_str(), "")))
        .collect();

    let interrupt = Interrupt::new();
    raise_on_signal(interrupt.clone());

    let path = std::env::var("CORE_SOCKET").unwrap_or_else(|_| CORE_SOCKET_PATH.to_owned());
    let config = ConnectionConfig::new("demo_request")
        .with_socket_path(path)
        .with_interrupt(interrupt);
    let mut conn = Connection::open(config).expect("connect to core");

    match conn.request(kind, CacheMode::Bypass, &args[2], &pairs) {
        Ok(response) => {
            println!("message: {}", conn.last_message());
            dump(response.document(), response.root(), 0);
            if response.is_continued() {
                println!("(continued; sending break)");
                conn.request_break().expect("break");
            }
        }
        Err(e) => {
            eprintln!("request failed: {e}");
            std::process::exit(2);
        }
    }
    conn.close().expect("close");
}

// Raise `interrupt` on SIGINT / SIGTERM; the store is async-signal-safe.
fn raise_on_signal(interrupt: Interrupt) {
    static TOKEN: OnceLock<Interrupt> = OnceLock::new();
    TOKEN.get_or_init(|| interrupt);
    extern "C" fn handler(_: libc::c_int) {
        if let Some(t) = TOKEN.get() {
            t.raise();
        }
    }
    unsafe {
        libc::signal(libc::SIGINT, handler as *const () as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as *const () as libc::sighandler_t);
    }
}
