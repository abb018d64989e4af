// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! Piecewise-linear calibration from a raw reading to a reference
//! temperature (§4.2). Applied inside a source, not as a pipeline
//! decorator: calibration is a property of *that particular sensor's* raw
//! reading, not something composable across sources.

use thermod_common::Error;

/// `t_raw -> t_ref`, linear between adjacent reference points and linearly
/// extrapolated beyond the ends. An empty calibration is the identity
/// function, for initial data collection before any reference points have
/// been recorded.
#[derive(Debug, Clone)]
pub struct Calibration {
    /// Points sorted by `t_raw`, ascending.
    points: Vec<(f64, f64)>,
}

impl Calibration {
    /// `t_raw` and `t_ref` must be equal length; when non-empty, length
    /// must be >= 2 (a single point cannot define a slope). An empty pair
    /// yields the identity transform.
    pub fn new(t_raw: &[f64], t_ref: &[f64]) -> Result<Self, Error> {
        if t_raw.len() != t_ref.len() {
            return Err(Error::Config(format!(
                "calibration: t_raw has {} points but t_ref has {}",
                t_raw.len(),
                t_ref.len()
            )));
        }
        if t_raw.is_empty() {
            return Ok(Calibration { points: Vec::new() });
        }
        if t_raw.len() < 2 {
            return Err(Error::Config(
                "calibration: need at least 2 points, or 0 for identity".into(),
            ));
        }
        let mut points: Vec<(f64, f64)> = t_raw.iter().copied().zip(t_ref.iter().copied()).collect();
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("calibration points must not be NaN"));
        Ok(Calibration { points })
    }

    pub fn identity() -> Self {
        Calibration { points: Vec::new() }
    }

    pub fn apply(&self, raw: f64) -> f64 {
        if self.points.is_empty() {
            return raw;
        }
        if self.points.len() == 1 {
            return self.points[0].1;
        }

        let (lo, hi) = if raw <= self.points[0].0 {
            (self.points[0], self.points[1])
        } else if raw >= self.points[self.points.len() - 1].0 {
            (self.points[self.points.len() - 2], self.points[self.points.len() - 1])
        } else {
            let idx = self
                .points
                .windows(2)
                .position(|w| raw >= w[0].0 && raw <= w[1].0)
                .expect("raw is within the bracketed range checked above");
            (self.points[idx], self.points[idx + 1])
        };

        let (x0, y0) = lo;
        let (x1, y1) = hi;
        let slope = (y1 - y0) / (x1 - x0);
        y0 + slope * (raw - x0)
    }
}
