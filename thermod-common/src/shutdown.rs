// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! A single explicit shutdown context, replacing the global mutable
//! `enabled`/`main_return_code` flags design note §9 calls out. Generalizes
//! the teacher's `halt::Sender`/`halt::Receiver` client-registration pattern
//! (`bosminer-antminer/src/monitor.rs`'s `Monitor::new_and_start`, which
//! registers a termination handler and a tick task against one halt
//! context) into a single `Shutdown` object every long-running task
//! subscribes to.
//!
//! Exit code taxonomy (§6): 0 ok; 6 disabled-by-config; 10-19 configuration
//! errors; 20-29 initialization errors; 30-39 control socket errors; 40-49
//! external-system errors; 50-59 other runtime errors; 60-69 shutdown
//! errors; 130 keyboard interrupt.

use std::sync::Arc;
use tokio::sync::watch;

pub mod exit_code {
    pub const OK: i32 = 0;
    pub const DISABLED: i32 = 6;
    pub const CONFIG_ERROR: i32 = 10;
    pub const INIT_ERROR: i32 = 20;
    pub const SOCKET_ERROR: i32 = 30;
    pub const EXTERNAL_ERROR: i32 = 40;
    pub const RUNTIME_ERROR: i32 = 50;
    pub const SHUTDOWN_ERROR: i32 = 60;
    pub const KEYBOARD_INTERRUPT: i32 = 130;
}

struct Inner {
    sender: watch::Sender<Option<i32>>,
}

/// Cloneable handle used to request shutdown with a given exit code. The
/// first call wins; later calls are ignored so the original cause of
/// shutdown is preserved.
#[derive(Clone)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Shutdown {
            inner: Arc::new(Inner { sender }),
        }
    }

    /// Request shutdown with the given exit code. Idempotent: only the
    /// first request is kept.
    pub fn trigger(&self, code: i32) {
        self.inner.sender.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(code);
                true
            } else {
                false
            }
        });
    }

    /// The exit code shutdown was requested with, if any.
    pub fn requested_code(&self) -> Option<i32> {
        *self.inner.sender.borrow()
    }

    pub fn is_triggered(&self) -> bool {
        self.requested_code().is_some()
    }

    /// Subscribe a new listener, analogous to `halt_receiver.register_client`.
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            receiver: self.inner.sender.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// A task's view of the shutdown context: `wait()` resolves once shutdown
/// has been requested, returning the exit code it was requested with.
#[derive(Clone)]
pub struct ShutdownListener {
    receiver: watch::Receiver<Option<i32>>,
}

impl ShutdownListener {
    /// Wait until shutdown is requested. Cancellation-safe: callers
    /// typically `tokio::select!` this against their own work.
    pub async fn wait(&mut self) -> i32 {
        loop {
            if let Some(code) = *self.receiver.borrow() {
                return code;
            }
            if self.receiver.changed().await.is_err() {
                return exit_code::OK;
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.receiver.borrow().is_some()
    }
}
