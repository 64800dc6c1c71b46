// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Print events pushed by the core until interrupted.
//
// Usage:
//   demo_events [timeout_ms]
//
// The socket path defaults to /var/run/core.event.socket and can be
// overridden with CORE_EVENT_SOCKET. Ctrl-C stops the loop once the current
// wait has passed its grace period.

use std::sync::OnceLock;
use std::time::Duration;

use libcoreipc::config::EVENT_SOCKET_PATH;
use libcoreipc::{Error, EventConfig, EventConnection, Interrupt};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let timeout_ms: u64 = std::env::args()
        .nth(1)
        .map(|s| s.parse().expect("timeout_ms"))
        .unwrap_or(5000);

    let interrupt = Interrupt::new();
    raise_on_signal(interrupt.clone());

    let path = std::env::var("CORE_EVENT_SOCKET").unwrap_or_else(|_| EVENT_SOCKET_PATH.to_owned());
    let config = EventConfig::new()
        .with_socket_path(path)
        .with_timeout(Duration::from_millis(timeout_ms))
        .with_interrupt(interrupt.clone());
    let mut events = EventConnection::open(config).expect("connect to event socket");

    let mut k = 1usize;
    while !interrupt.is_raised() {
        match events.get() {
            Ok(ev) => {
                println!("{} at {} ms", ev.class(), ev.raise_time_ms());
                k = 1;
            }
            Err(Error::Timeout) => {
                println!("waiting for events... {k}");
                k += 1;
            }
            Err(Error::Interrupted) => break,
            Err(e) => {
                eprintln!("event channel failed: {e}");
                std::process::exit(2);
            }
        }
    }
    events.close().expect("close");
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
