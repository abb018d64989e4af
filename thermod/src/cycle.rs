// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The control cycle (§4.4): read, decide, act, publish, sleep-or-wait.
//! Grounded in the teacher's `Monitor` tick loop (`bosminer-antminer/src/monitor.rs`),
//! generalized from a fixed `TICK_LENGTH` to a configurable interval plus a
//! master condition variable woken by socket mutations and signal reloads.

use crate::state::SharedState;
use log::{error, warn};
use std::sync::Arc;
use std::time::Duration;
use thermod_common::shutdown::exit_code;
use thermod_common::status::ThermodStatus;
use thermod_common::Error;

/// Runs until shutdown is requested, then forces the actuator off before
/// returning (§6: "actuator forced OFF on exit").
pub async fn run(state: Arc<SharedState>) {
    loop {
        if state.shutdown.is_triggered() {
            break;
        }

        let (status, sleep_time, fatal) = run_one_cycle(&state).await;
        let _ = state.status_tx.send(status);

        if fatal {
            state.shutdown.trigger(exit_code::RUNTIME_ERROR);
            break;
        }

        if state.shutdown.is_triggered() {
            break;
        }

        let mut listener = state.shutdown.listener();
        tokio::select! {
            _ = tokio::time::sleep(sleep_time) => {}
            _ = state.notify.notified() => {}
            _ = listener.wait() => {}
        }
    }

    if let Err(e) = state.actuator.switch_off().await {
        error!("failed to force actuator off during shutdown: {}", e);
    }
}

/// One iteration of read -> decide -> act, holding the master lock
/// throughout (§4.4: "All actuator commands happen while holding the
/// master lock: no two switches can interleave"). Returns the status to
/// publish, how long to sleep before the next cycle, and whether the
/// error that produced it should terminate the daemon.
async fn run_one_cycle(state: &SharedState) -> (ThermodStatus, Duration, bool) {
    let mut timetable = state.timetable.lock().await;
    let mode = timetable.settings().mode;
    let hvac_mode = timetable.settings().hvac_mode;

    let outcome: Result<ThermodStatus, Error> = async {
        let current_temp = state.thermometer.temperature().await?;
        let actuator_on = state.actuator.is_on().await?;
        let decision = timetable.should_the_heating_be_on(chrono::Local::now(), current_temp, actuator_on);

        if decision.on != actuator_on {
            if decision.on {
                state.actuator.switch_on().await?;
            } else {
                state.actuator.switch_off().await?;
            }
        }

        Ok(decision.status)
    }
    .await;

    match outcome {
        Ok(status) => (status, state.interval, false),
        Err(e) if e.is_transient() => {
            warn!("control cycle: {} (retrying in {:?})", e, state.sleep_on_error);
            let actuator_on = state.actuator.is_on().await.unwrap_or(false);
            (
                ThermodStatus::error_status(mode, hvac_mode, actuator_on, e.to_string()),
                state.sleep_on_error,
                false,
            )
        }
        Err(e) => {
            error!("control cycle: fatal error, shutting down: {}", e);
            let actuator_on = state.actuator.is_on().await.unwrap_or(false);
            (
                ThermodStatus::error_status(mode, hvac_mode, actuator_on, e.to_string()),
                state.sleep_on_error,
                true,
            )
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::SharedState;
    use std::collections::BTreeMap;
    use thermod_actuator::ScriptActuator;
    use thermod_common::status::{HvacMode, InertiaMode, Mode, TemperatureName};
    use thermod_common::Shutdown;
    use thermod_thermometer::source::FakeSource;
    use thermod_timetable::{Settings, Timetable};
    use tokio::sync::{watch, Notify};

    fn flat_settings(temp: f64) -> Settings {
        use thermod_timetable::program::ALL_DAYS;
        use thermod_timetable::{Cell, DayProgram, Program};

        let mut temperatures = BTreeMap::new();
        temperatures.insert(TemperatureName::Tmax, 21.0);
        temperatures.insert(TemperatureName::Tmin, 18.0);
        temperatures.insert(TemperatureName::T0, 7.0);

        let mut days = BTreeMap::new();
        for day in ALL_DAYS {
            let mut hours = BTreeMap::new();
            for hour in 0..24u8 {
                hours.insert(format!("h{:02}", hour), [Cell::Literal(temp); 4]);
            }
            days.insert(day, DayProgram::new(hours));
        }

        Settings {
            temperatures,
            differential: 0.5,
            grace_time: None,
            mode: Mode::Auto,
            hvac_mode: HvacMode::Heating,
            inertia: InertiaMode::One,
            timetable: Program::new(days),
        }
    }

    async fn write_timetable(settings: &Settings) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.json");
        tokio::fs::write(&path, serde_json::to_string(settings).unwrap()).await.unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn switches_actuator_on_when_below_target() {
        let settings = flat_settings(25.0); // auto target resolves to 25 everywhere
        let (_dir, path) = write_timetable(&settings).await;
        let notify = Arc::new(Notify::new());
        let timetable = Timetable::load(&path, notify.clone()).await.unwrap();

        let actuator_dir = tempfile::tempdir().unwrap();
        let on_script = actuator_dir.path().join("on.sh");
        let off_script = actuator_dir.path().join("off.sh");
        for (p, body) in [(&on_script, "#!/bin/sh\necho '{\"success\": true, \"error\": null}'\n"), (&off_script, "#!/bin/sh\necho '{\"success\": true, \"error\": null}'\n")] {
            std::fs::write(p, body).unwrap();
            let mut perms = std::fs::metadata(p).unwrap().permissions();
            std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
            std::fs::set_permissions(p, perms).unwrap();
        }
        let actuator = ScriptActuator::new(on_script, off_script, None, Duration::from_secs(5));

        let (status_tx, _rx) = watch::channel(ThermodStatus::error_status(Mode::Auto, HvacMode::Heating, false, "init".into()));
        let state = SharedState {
            timetable: tokio::sync::Mutex::new(timetable),
            thermometer: Box::new(FakeSource::constant(10.0)), // far below target 25
            actuator: Box::new(actuator),
            notify,
            status_tx,
            shutdown: Shutdown::new(),
            interval: Duration::from_secs(30),
            sleep_on_error: Duration::from_secs(120),
        };

        let (status, _sleep, fatal) = run_one_cycle(&state).await;
        assert!(!fatal);
        assert!(status.actuator_status);
        assert!(state.actuator.is_on().await.unwrap());
    }

    #[tokio::test]
    async fn thermometer_error_is_transient_not_fatal() {
        let settings = flat_settings(20.0);
        let (_dir, path) = write_timetable(&settings).await;
        let notify = Arc::new(Notify::new());
        let timetable = Timetable::load(&path, notify.clone()).await.unwrap();

        let actuator_dir = tempfile::tempdir().unwrap();
        let on_script = actuator_dir.path().join("on.sh");
        let off_script = actuator_dir.path().join("off.sh");
        for p in [&on_script, &off_script] {
            std::fs::write(p, "#!/bin/sh\necho '{\"success\": true, \"error\": null}'\n").unwrap();
            let mut perms = std::fs::metadata(p).unwrap().permissions();
            std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
            std::fs::set_permissions(p, perms).unwrap();
        }
        let actuator = ScriptActuator::new(on_script, off_script, None, Duration::from_secs(5));

        let (status_tx, _rx) = watch::channel(ThermodStatus::error_status(Mode::Auto, HvacMode::Heating, false, "init".into()));
        let state = SharedState {
            timetable: tokio::sync::Mutex::new(timetable),
            thermometer: Box::new(FakeSource::sequence(vec![Err("sensor unplugged".into())])),
            actuator: Box::new(actuator),
            notify,
            status_tx,
            shutdown: Shutdown::new(),
            interval: Duration::from_secs(30),
            sleep_on_error: Duration::from_secs(120),
        };

        let (status, sleep_time, fatal) = run_one_cycle(&state).await;
        assert!(!fatal);
        assert_eq!(sleep_time, Duration::from_secs(120));
        assert!(status.error.is_some());
    }
}
