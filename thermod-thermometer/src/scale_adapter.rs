// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! `ScaleAdapter` decorator (§4.2): converts a wrapped source's scale to
//! the daemon's working scale. A no-op when the two already match.

use crate::source::Thermometer;
use async_trait::async_trait;
use thermod_common::scale::DegreeScale;
use thermod_common::Error;

pub struct ScaleAdapter {
    inner: Box<dyn Thermometer>,
    source_scale: DegreeScale,
    working_scale: DegreeScale,
}

impl ScaleAdapter {
    pub fn new(inner: Box<dyn Thermometer>, source_scale: DegreeScale, working_scale: DegreeScale) -> Self {
        ScaleAdapter {
            inner,
            source_scale,
            working_scale,
        }
    }
}

#[async_trait]
impl Thermometer for ScaleAdapter {
    async fn temperature(&self) -> Result<f64, Error> {
        let raw = self.inner.temperature().await?;
        Ok(self.source_scale.convert(raw, self.working_scale))
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::FakeSource;

    #[tokio::test]
    async fn converts_when_scales_differ() {
        let inner = Box::new(FakeSource::constant(0.0));
        let adapter = ScaleAdapter::new(inner, DegreeScale::Celsius, DegreeScale::Fahrenheit);
        let temp = adapter.temperature().await.unwrap();
        assert!((temp - 32.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn no_op_when_scales_match() {
        let inner = Box::new(FakeSource::constant(21.5));
        let adapter = ScaleAdapter::new(inner, DegreeScale::Celsius, DegreeScale::Celsius);
        let temp = adapter.temperature().await.unwrap();
        assert!((temp - 21.5).abs() < 1e-9);
    }
}
