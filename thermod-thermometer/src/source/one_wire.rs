// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The `OneWire` thermometer source (§4.2): reads N 1-Wire device files
//! and applies the same mean-within-stddev-bound rule as `AnalogBoard`.

use crate::calibration::Calibration;
use crate::source::{mean, stddev, Thermometer};
use async_trait::async_trait;
use std::path::PathBuf;
use thermod_common::Error;

pub struct OneWireSource {
    device_files: Vec<PathBuf>,
    calibration: Calibration,
    max_stddev: f64,
}

impl OneWireSource {
    pub fn new(device_files: Vec<PathBuf>, calibration: Calibration, max_stddev: f64) -> Self {
        OneWireSource {
            device_files,
            calibration,
            max_stddev,
        }
    }

    async fn read_device(path: &PathBuf) -> Result<f64, Error> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Thermometer(format!("reading {}: {}", path.display(), e)))?;
        parse_reading(&contents)
            .ok_or_else(|| Error::Thermometer(format!("unparsable 1-Wire reading in {}", path.display())))
    }
}

/// Accepts either a bare floating-point value, or the common kernel
/// `w1_slave` format ending in `t=<millidegrees>`.
fn parse_reading(contents: &str) -> Option<f64> {
    let trimmed = contents.trim();
    if let Ok(v) = trimmed.parse::<f64>() {
        return Some(v);
    }
    trimmed
        .rsplit("t=")
        .next()
        .and_then(|tail| tail.trim().parse::<f64>().ok())
        .map(|millidegrees| millidegrees / 1000.0)
}

#[async_trait]
impl Thermometer for OneWireSource {
    async fn temperature(&self) -> Result<f64, Error> {
        if self.device_files.is_empty() {
            return Err(Error::Thermometer("one-wire source has no device files configured".into()));
        }

        let mut readings = Vec::with_capacity(self.device_files.len());
        for path in &self.device_files {
            readings.push(Self::read_device(path).await?);
        }

        let sd = stddev(&readings);
        if sd > self.max_stddev {
            return Err(Error::Thermometer(format!(
                "1-Wire devices disagree: stddev {:.3} exceeds bound {:.3} ({:?})",
                sd, self.max_stddev, readings
            )));
        }

        Ok(self.calibration.apply(mean(&readings)))
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_bare_float() {
        assert_eq!(parse_reading("21.375\n"), Some(21.375));
    }

    #[test]
    fn parses_w1_slave_format() {
        let contents = "5f 01 4b 46 7f ff 0c 10 f2 : crc=f2 YES\n5f 01 4b 46 7f ff 0c 10 f2 t=21937\n";
        assert_eq!(parse_reading(contents), Some(21.937));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_reading("not a number"), None);
    }

    #[tokio::test]
    async fn reads_and_averages_device_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for (name, value) in [("a", "19.8"), ("b", "20.0"), ("c", "20.2")] {
            let path = dir.path().join(name);
            tokio::fs::write(&path, value).await.unwrap();
            paths.push(path);
        }
        let source = OneWireSource::new(paths, Calibration::identity(), 0.5);
        let temp = source.temperature().await.unwrap();
        assert!((temp - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn errors_on_missing_file() {
        let source = OneWireSource::new(
            vec![PathBuf::from("/nonexistent/w1/device")],
            Calibration::identity(),
            0.5,
        );
        assert!(source.temperature().await.is_err());
    }
}
