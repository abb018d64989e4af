// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The actuator abstraction (§4.3): switching and status query for the
//! heating (or cooling) device, with retries and fault reporting owned
//! by the control cycle, not by the actuator itself.

pub mod gpio;
pub mod script;

pub use gpio::{GpioActuator, RelayPin, TriggerLevel};
pub use script::ScriptActuator;

use async_trait::async_trait;
use thermod_common::Error;

/// Any object exposing switch/status for the heating or cooling device
/// (§4.3). `status()` reflects the last *commanded* state: a failed
/// switch leaves it unchanged, it is never inferred by re-reading
/// hardware unless the concrete implementation says otherwise.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn switch_on(&self) -> Result<(), Error>;
    async fn switch_off(&self) -> Result<(), Error>;
    async fn is_on(&self) -> Result<bool, Error>;

    /// Release any resources (child processes, open GPIO lines). Idempotent.
    async fn close(&self);
}
