// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The degree scale the daemon works in, and pure conversions between scales
//! (§3). The daemon normalises every external reading to a single *working
//! scale* configured at startup.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegreeScale {
    Celsius,
    Fahrenheit,
}

impl DegreeScale {
    /// Convert `value`, expressed in `self`, into `target`.
    pub fn convert(self, value: f64, target: DegreeScale) -> f64 {
        match (self, target) {
            (DegreeScale::Celsius, DegreeScale::Fahrenheit) => celsius_to_fahrenheit(value),
            (DegreeScale::Fahrenheit, DegreeScale::Celsius) => fahrenheit_to_celsius(value),
            _ => value,
        }
    }
}

impl fmt::Display for DegreeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegreeScale::Celsius => write!(f, "celsius"),
            DegreeScale::Fahrenheit => write!(f, "fahrenheit"),
        }
    }
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}
