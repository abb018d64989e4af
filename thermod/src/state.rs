// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! Shared state the control cycle and the control socket both hold a
//! reference to. The `timetable` mutex *is* the master lock (§4.4/§5):
//! whoever holds it owns the only window in which the timetable and the
//! actuator switching sequence may be mutated.

use std::sync::Arc;
use std::time::Duration;
use thermod_actuator::Actuator;
use thermod_common::status::ThermodStatus;
use thermod_common::Shutdown;
use thermod_thermometer::Thermometer;
use thermod_timetable::Timetable;
use tokio::sync::{watch, Mutex, Notify};

pub struct SharedState {
    pub timetable: Mutex<Timetable>,
    pub thermometer: Box<dyn Thermometer>,
    pub actuator: Box<dyn Actuator>,
    pub notify: Arc<Notify>,
    pub status_tx: watch::Sender<ThermodStatus>,
    pub shutdown: Shutdown,
    pub interval: Duration,
    pub sleep_on_error: Duration,
}

impl SharedState {
    pub fn status_rx(&self) -> watch::Receiver<ThermodStatus> {
        self.status_tx.subscribe()
    }
}
