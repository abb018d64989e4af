// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! Entry point: parse the CLI and config, build the thermometer/actuator
//! pipelines, and run the control cycle, the control socket, and the
//! signal handler as three cooperating tasks under one shutdown context.

mod build;
mod config;
mod cycle;
mod signals;
mod socket;
mod state;

use clap::Parser;
use config::{Cli, Config};
use log::{error, info, LevelFilter};
use state::SharedState;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use thermod_actuator::Actuator;
use thermod_common::shutdown::exit_code;
use thermod_common::status::ThermodStatus;
use thermod_common::Shutdown;
use tokio::sync::{watch, Mutex, Notify};
use thermod_timetable::Timetable;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return ExitCode::from(exit_code::CONFIG_ERROR as u8);
        }
    };

    init_logging(&config, cli.verbose);

    if let Some(pidfile) = &cli.pidfile {
        if let Err(e) = std::fs::write(pidfile, std::process::id().to_string()) {
            error!("failed to write pidfile {}: {}", pidfile.display(), e);
            return ExitCode::from(exit_code::INIT_ERROR as u8);
        }
    }

    let notify = Arc::new(Notify::new());
    let timetable = match Timetable::load(&config.timetable.path, notify.clone()).await {
        Ok(t) => t,
        Err(e) => {
            error!("failed to load timetable: {}", e);
            return ExitCode::from(exit_code::CONFIG_ERROR as u8);
        }
    };

    let thermometer = build::build_thermometer(&config.thermometer, config.daemon.scale);
    let actuator = build::build_actuator(&config.actuator);

    if build::actuator_needs_startup_off(&config.actuator) {
        if let Err(e) = actuator.switch_off().await {
            error!("startup switch_off failed, actuator state may be unknown: {}", e);
        }
    }

    let initial_status = ThermodStatus::error_status(
        timetable.settings().mode,
        timetable.settings().hvac_mode,
        false,
        "starting up".into(),
    );
    let (status_tx, _status_rx) = watch::channel(initial_status);

    let shutdown = Shutdown::new();
    let state = Arc::new(SharedState {
        timetable: Mutex::new(timetable),
        thermometer,
        actuator,
        notify,
        status_tx,
        shutdown: shutdown.clone(),
        interval: config.interval(),
        sleep_on_error: config.sleep_on_error(),
    });

    let socket_addr: SocketAddr = match format!("{}:{}", config.socket.host, config.socket.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("invalid socket address {}:{}: {}", config.socket.host, config.socket.port, e);
            return ExitCode::from(exit_code::CONFIG_ERROR as u8);
        }
    };
    let listener = match tokio::net::TcpListener::bind(socket_addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind control socket on {}: {}", socket_addr, e);
            return ExitCode::from(exit_code::SOCKET_ERROR as u8);
        }
    };
    info!("control socket listening on {}", socket_addr);

    let router = socket::router(state.clone());
    let shutdown_for_server = shutdown.clone();
    let server = tokio::spawn(async move {
        let mut listener_handle = shutdown_for_server.listener();
        let serve = axum::serve(listener, router);
        tokio::select! {
            result = serve => {
                if let Err(e) = result {
                    error!("control socket server error: {}", e);
                    shutdown_for_server.trigger(exit_code::SOCKET_ERROR);
                }
            }
            _ = listener_handle.wait() => {}
        }
    });

    let cycle_handle = tokio::spawn(cycle::run(state.clone()));
    let signals_handle = tokio::spawn(signals::run(state.clone()));

    let _ = cycle_handle.await;
    let _ = signals_handle.await;
    server.abort();

    let code = shutdown.requested_code().unwrap_or(exit_code::OK);
    ExitCode::from(code.clamp(0, 255) as u8)
}

fn init_logging(config: &Config, verbose: u8) {
    let base = match config.daemon.log_level.as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    let level = match verbose {
        0 => base,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();
}
