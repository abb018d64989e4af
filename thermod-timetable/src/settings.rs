// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The persisted timetable document (§3/§6): named temperatures,
//! differential, grace time, mode, HVAC mode, inertia, and the weekly
//! program, all in one JSON file.

use crate::program::Program;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thermod_common::status::{HvacMode, InertiaMode, Mode, TemperatureName};
use thermod_common::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub temperatures: BTreeMap<TemperatureName, f64>,
    pub differential: f64,
    pub grace_time: Option<u64>,
    pub mode: Mode,
    pub hvac_mode: HvacMode,
    #[serde(with = "inertia_as_u8")]
    pub inertia: InertiaMode,
    pub timetable: Program,
}

mod inertia_as_u8 {
    use super::InertiaMode;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &InertiaMode, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(value.as_u8())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<InertiaMode, D::Error> {
        let raw = u8::deserialize(d)?;
        InertiaMode::from_u8(raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid inertia mode: {}", raw)))
    }
}

impl Settings {
    /// Full validation of a freshly loaded or reloaded document (§4.1):
    /// differential range, every named cell in the program resolves
    /// against `temperatures`, program structural validity.
    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.differential) {
            return Err(Error::timetable_invalid_content(format!(
                "differential must be within [0, 1], got {}",
                self.differential
            )));
        }
        self.timetable.validate()?;
        for name in self.timetable.named_cells() {
            if !self.temperatures.contains_key(&name) {
                return Err(Error::timetable_invalid_content(format!(
                    "program references undefined named temperature {}",
                    name
                )));
            }
        }
        for required in [TemperatureName::Tmax, TemperatureName::Tmin, TemperatureName::T0] {
            if !self.temperatures.contains_key(&required) {
                return Err(Error::timetable_invalid_content(format!(
                    "missing required named temperature {}",
                    required
                )));
            }
        }
        Ok(())
    }

    pub fn named_temperature(&self, name: TemperatureName) -> Result<f64, Error> {
        self.temperatures.get(&name).copied().ok_or_else(|| {
            Error::timetable_invalid_content(format!("undefined named temperature {}", name))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::program::{Cell, Day, DayProgram, ALL_DAYS};

    fn flat_program(temp: f64) -> Program {
        let mut days = BTreeMap::new();
        for day in ALL_DAYS {
            let mut hours = BTreeMap::new();
            for hour in 0..24u8 {
                hours.insert(format!("h{:02}", hour), [Cell::Literal(temp); 4]);
            }
            days.insert(day, DayProgram::new(hours));
        }
        Program::new(days)
    }

    fn valid_settings() -> Settings {
        let mut temperatures = BTreeMap::new();
        temperatures.insert(TemperatureName::Tmax, 21.0);
        temperatures.insert(TemperatureName::Tmin, 18.0);
        temperatures.insert(TemperatureName::T0, 7.0);
        Settings {
            temperatures,
            differential: 0.5,
            grace_time: None,
            mode: Mode::Auto,
            hvac_mode: HvacMode::Heating,
            inertia: InertiaMode::One,
            timetable: flat_program(19.0),
        }
    }

    #[test]
    fn valid_settings_pass() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_differential() {
        let mut settings = valid_settings();
        settings.differential = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_undefined_named_temperature_reference() {
        let mut settings = valid_settings();
        settings.temperatures.remove(&TemperatureName::Tmin);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn json_round_trip() {
        let settings = valid_settings();
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.differential, settings.differential);
        assert_eq!(back.inertia, settings.inertia);
    }
}
