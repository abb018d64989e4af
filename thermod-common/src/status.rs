// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! Mode, HVAC mode, inertia, and the `ThermodStatus` snapshot (§3). These are
//! pure value types; nothing in this module performs I/O.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// High-level user intent. `Auto` resolves the target from the weekly
/// program; every other variant fixes the target directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Auto,
    On,
    Off,
    Tmax,
    Tmin,
    T0,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Auto => "auto",
            Mode::On => "on",
            Mode::Off => "off",
            Mode::Tmax => "tmax",
            Mode::Tmin => "tmin",
            Mode::T0 => "t0",
        };
        write!(f, "{}", s)
    }
}

/// One of the three named comfort temperatures. A weekly-program cell is
/// either one of these or a literal real number (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureName {
    Tmax,
    Tmin,
    T0,
}

impl fmt::Display for TemperatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TemperatureName::Tmax => "tmax",
            TemperatureName::Tmin => "tmin",
            TemperatureName::T0 => "t0",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TemperatureName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tmax" => Ok(TemperatureName::Tmax),
            "tmin" => Ok(TemperatureName::Tmin),
            "t0" => Ok(TemperatureName::T0),
            _ => Err(()),
        }
    }
}

/// Selects the sign of the hysteresis comparison (§3): heating turns on
/// below target, cooling turns on above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    Heating,
    Cooling,
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HvacMode::Heating => write!(f, "heating"),
            HvacMode::Cooling => write!(f, "cooling"),
        }
    }
}

/// Hysteresis strategy index, one of the three switching rule pairs in §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum InertiaMode {
    One = 1,
    Two = 2,
    Three = 3,
}

impl InertiaMode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(InertiaMode::One),
            2 => Some(InertiaMode::Two),
            3 => Some(InertiaMode::Three),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// A target temperature that may be unreachable in either direction, i.e.
/// `-inf`/`+inf` when the mode dictates the actuator must stay off (§3), or
/// `NaN` when there is no meaningful target at all (an error snapshot with
/// no settings to evaluate). JSON has no infinity or NaN literal, so the
/// wire form is a number, the strings `"-Infinity"`/`"Infinity"`, or `null`
/// for NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target(pub f64);

impl Target {
    pub const NEGATIVE_INFINITY: Target = Target(f64::NEG_INFINITY);
    pub const POSITIVE_INFINITY: Target = Target(f64::INFINITY);

    pub fn finite(value: f64) -> Self {
        Target(value)
    }

    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

impl Serialize for Target {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if self.0.is_nan() {
            serializer.serialize_unit()
        } else if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else if self.0 == f64::NEG_INFINITY {
            serializer.serialize_str("-Infinity")
        } else {
            serializer.serialize_str("Infinity")
        }
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
            Null,
        }
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(Target(n)),
            Repr::Text(s) if s == "-Infinity" => Ok(Target(f64::NEG_INFINITY)),
            Repr::Text(s) if s == "Infinity" => Ok(Target(f64::INFINITY)),
            Repr::Text(s) => Err(serde::de::Error::custom(format!(
                "invalid target temperature: {}",
                s
            ))),
            Repr::Null => Ok(Target(f64::NAN)),
        }
    }
}

/// The immutable per-cycle snapshot emitted to monitors (§3, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermodStatus {
    pub timestamp: DateTime<Local>,
    pub mode: Mode,
    pub hvac_mode: HvacMode,
    pub current_temperature: Option<f64>,
    pub target_temperature: Target,
    /// `true` when the actuator is commanded on.
    pub actuator_status: bool,
    pub error: Option<String>,
}

impl ThermodStatus {
    pub fn error_status(mode: Mode, hvac_mode: HvacMode, actuator_status: bool, error: String) -> Self {
        ThermodStatus {
            timestamp: Local::now(),
            mode,
            hvac_mode,
            current_temperature: None,
            target_temperature: Target(f64::NAN),
            actuator_status,
            error: Some(error),
        }
    }
}
