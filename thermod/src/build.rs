// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! Wires the pluggable thermometer and actuator variants from the daemon
//! config (§4.6). Decorator stacking (Source -> ScaleAdapter ->
//! SimilarityChecker -> AveragingTask) is hardwired here; the decorator
//! knobs themselves (calibration points, similarity buffer/delta, averaging
//! interval/window/skip) come from `DecoratorConfig` and fall back to
//! values suitable for a single-zone home thermostat when left out of the
//! TOML file.

use crate::config::{ActuatorSection, DecoratorConfig, ThermometerSection};
use log::warn;
use std::time::Duration;
use thermod_actuator::{Actuator, ScriptActuator};
use thermod_common::scale::DegreeScale;
use thermod_thermometer::source::{FakeSource, OneWireSource, ScriptSource};
use thermod_thermometer::{AveragingTask, Calibration, ScaleAdapter, SimilarityChecker, Thermometer};

const AVG_SLEEP_ON_ERROR: Duration = Duration::from_secs(60);

fn build_calibration(decorators: &DecoratorConfig) -> Calibration {
    Calibration::new(&decorators.calibration_raw, &decorators.calibration_ref).unwrap_or_else(|e| {
        warn!("ignoring thermometer calibration points: {}", e);
        Calibration::identity()
    })
}

pub fn build_thermometer(section: &ThermometerSection, working_scale: DegreeScale) -> Box<dyn Thermometer> {
    let decorators = section.decorators();
    let calibration = build_calibration(decorators);

    let (source, source_scale): (Box<dyn Thermometer>, DegreeScale) = match section {
        ThermometerSection::Script { script, timeout_secs, .. } => (
            Box::new(ScriptSource::new(script.clone(), calibration, Duration::from_secs(*timeout_secs))),
            working_scale,
        ),
        ThermometerSection::OneWire {
            device_files, max_stddev, ..
        } => (
            Box::new(OneWireSource::new(device_files.clone(), calibration, *max_stddev)),
            working_scale,
        ),
        ThermometerSection::Fake { constant, .. } => (Box::new(FakeSource::constant(*constant)), working_scale),
    };

    let adapted = Box::new(ScaleAdapter::new(source, source_scale, working_scale));
    let filtered = Box::new(SimilarityChecker::new(
        adapted,
        decorators.similarity_buffer,
        decorators.similarity_delta,
    ));
    Box::new(AveragingTask::new(
        filtered,
        Duration::from_secs(decorators.avg_interval_secs),
        Duration::from_secs(decorators.avg_window_secs),
        decorators.avg_skip,
        AVG_SLEEP_ON_ERROR,
    ))
}

pub fn build_actuator(section: &ActuatorSection) -> Box<dyn Actuator> {
    match section {
        ActuatorSection::Script {
            switch_on,
            switch_off,
            status,
            timeout_secs,
        } => Box::new(ScriptActuator::new(
            switch_on.clone(),
            switch_off.clone(),
            status.clone(),
            Duration::from_secs(*timeout_secs),
        )),
    }
}

/// Whether the configured actuator has no status query and therefore needs
/// an explicit `switch_off` at startup to bring its cached state in line
/// with reality (§4.3).
pub fn actuator_needs_startup_off(section: &ActuatorSection) -> bool {
    match section {
        ActuatorSection::Script { status, .. } => status.is_none(),
    }
}
