// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! Thermometer source variants (§4.2): `Script`, `AnalogBoard`, `OneWire`,
//! `Fake`. Each is the innermost stage of the pipeline and owns any
//! calibration for its particular sensor.

pub mod analog_board;
pub mod fake;
pub mod one_wire;
pub mod script;

pub use analog_board::AnalogBoardSource;
pub use fake::FakeSource;
pub use one_wire::OneWireSource;
pub use script::ScriptSource;

use async_trait::async_trait;
use thermod_common::Error;

/// Any object exposing an asynchronous `temperature` reading in some
/// scale, plus `close` (§4.2). Decorators wrap a `Box<dyn Thermometer>` to
/// build the pipeline at startup, rather than through dynamic
/// subclassing (§9).
#[async_trait]
pub trait Thermometer: Send + Sync {
    async fn temperature(&self) -> Result<f64, Error>;

    /// Release any resources (child processes, open file handles,
    /// background tasks). Idempotent.
    async fn close(&self);
}

/// Arithmetic mean of a non-empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of a non-empty slice.
pub(crate) fn stddev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
