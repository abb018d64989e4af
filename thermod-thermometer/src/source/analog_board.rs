// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The `AnalogBoard` thermometer source (§4.2): reads N channels of an
//! analog-to-digital board and returns their mean when the standard
//! deviation stays within a configured bound, otherwise a
//! `ThermometerError`. The concrete ADC driver is an external
//! collaborator; this module only consumes the `ChannelReader` interface.

use crate::calibration::Calibration;
use crate::source::{mean, stddev, Thermometer};
use async_trait::async_trait;
use futures::future::try_join_all;
use thermod_common::Error;

/// The pluggable hardware interface an AD board driver implements. Kept
/// deliberately small: one raw reading per channel.
#[async_trait]
pub trait ChannelReader: Send + Sync {
    async fn read_channel(&self, index: usize) -> Result<f64, Error>;
    fn channel_count(&self) -> usize;
}

pub struct AnalogBoardSource<R: ChannelReader> {
    reader: R,
    calibration: Calibration,
    max_stddev: f64,
}

impl<R: ChannelReader> AnalogBoardSource<R> {
    pub fn new(reader: R, calibration: Calibration, max_stddev: f64) -> Self {
        AnalogBoardSource {
            reader,
            calibration,
            max_stddev,
        }
    }
}

#[async_trait]
impl<R: ChannelReader + 'static> Thermometer for AnalogBoardSource<R> {
    async fn temperature(&self) -> Result<f64, Error> {
        let reads = (0..self.reader.channel_count()).map(|i| self.reader.read_channel(i));
        let readings = try_join_all(reads)
            .await
            .map_err(|e| Error::Thermometer(format!("analog board channel read failed: {}", e)))?;

        if readings.is_empty() {
            return Err(Error::Thermometer("analog board has no channels configured".into()));
        }

        let sd = stddev(&readings);
        if sd > self.max_stddev {
            return Err(Error::Thermometer(format!(
                "analog board channels disagree: stddev {:.3} exceeds bound {:.3} ({:?})",
                sd, self.max_stddev, readings
            )));
        }

        Ok(self.calibration.apply(mean(&readings)))
    }

    async fn close(&self) {}
}
