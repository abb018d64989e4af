// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The `GPIO relay` actuator (§4.3): a set of pins driven high or low
//! according to a configured trigger level. Status is read back from the
//! pins; it must agree across all of them or the query is a `HeatingError`.

use crate::Actuator;
use async_trait::async_trait;
use thermod_common::Error;

/// Whether the relay switches on when the pin is driven high or low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerLevel {
    ActiveHigh,
    ActiveLow,
}

/// The pluggable hardware interface a GPIO driver implements.
#[async_trait]
pub trait RelayPin: Send + Sync {
    async fn write(&self, level_high: bool) -> Result<(), Error>;
    async fn read(&self) -> Result<bool, Error>;
}

pub struct GpioActuator<P: RelayPin> {
    pins: Vec<P>,
    trigger: TriggerLevel,
}

impl<P: RelayPin> GpioActuator<P> {
    pub fn new(pins: Vec<P>, trigger: TriggerLevel) -> Self {
        GpioActuator { pins, trigger }
    }

    fn physical_level(&self, on: bool) -> bool {
        match self.trigger {
            TriggerLevel::ActiveHigh => on,
            TriggerLevel::ActiveLow => !on,
        }
    }

    fn logical_state(&self, level_high: bool) -> bool {
        match self.trigger {
            TriggerLevel::ActiveHigh => level_high,
            TriggerLevel::ActiveLow => !level_high,
        }
    }

    async fn switch(&self, on: bool) -> Result<(), Error> {
        let level = self.physical_level(on);
        for pin in &self.pins {
            pin.write(level).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<P: RelayPin + 'static> Actuator for GpioActuator<P> {
    async fn switch_on(&self) -> Result<(), Error> {
        self.switch(true).await
    }

    async fn switch_off(&self) -> Result<(), Error> {
        self.switch(false).await
    }

    async fn is_on(&self) -> Result<bool, Error> {
        if self.pins.is_empty() {
            return Err(Error::Heating("gpio relay has no pins configured".into()));
        }

        let mut states = Vec::with_capacity(self.pins.len());
        for pin in &self.pins {
            states.push(self.logical_state(pin.read().await?));
        }

        let first = states[0];
        if states.iter().all(|s| *s == first) {
            Ok(first)
        } else {
            Err(Error::Heating(format!("gpio relay pins disagree on state: {:?}", states)))
        }
    }

    async fn close(&self) {}
}
