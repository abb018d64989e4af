// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! Unix signal handling (§4.6 supplement): SIGINT/SIGTERM request a clean
//! shutdown, SIGHUP reloads the timetable file in place under the master
//! lock, SIGUSR1 toggles between info and debug log verbosity.

use crate::state::SharedState;
use log::{error, info, warn, LevelFilter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thermod_common::shutdown::exit_code;
use tokio::signal::unix::{signal, SignalKind};

/// Runs until shutdown is requested, reacting to SIGHUP/SIGUSR1 along the
/// way. SIGINT/SIGTERM are handled by requesting shutdown; the actual
/// actuator-off cleanup happens in the control cycle (§6), not here.
pub async fn run(state: Arc<SharedState>) {
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to install SIGINT handler: {}", e);
            return;
        }
    };
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to install SIGTERM handler: {}", e);
            return;
        }
    };
    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to install SIGHUP handler: {}", e);
            return;
        }
    };
    let mut sigusr1 = match signal(SignalKind::user_defined1()) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to install SIGUSR1 handler: {}", e);
            return;
        }
    };

    let debug_enabled = AtomicBool::new(false);
    let mut listener = state.shutdown.listener();

    loop {
        tokio::select! {
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                state.shutdown.trigger(exit_code::OK);
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                state.shutdown.trigger(exit_code::OK);
            }
            _ = sighup.recv() => {
                info!("received SIGHUP, reloading timetable");
                let mut timetable = state.timetable.lock().await;
                match timetable.reload().await {
                    Ok(()) => info!("timetable reloaded"),
                    Err(e) => warn!("timetable reload failed, keeping prior state: {}", e),
                }
            }
            _ = sigusr1.recv() => {
                let now_debug = !debug_enabled.load(Ordering::Relaxed);
                debug_enabled.store(now_debug, Ordering::Relaxed);
                let level = if now_debug { LevelFilter::Debug } else { LevelFilter::Info };
                log::set_max_level(level);
                info!("received SIGUSR1, log level now {}", level);
            }
            _ = listener.wait() => {
                break;
            }
        }
    }
}
