// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The weekly program data model (§3): `day -> hour -> [q0, q1, q2, q3]`.
//! Structural validation (every day present, every hour present, every
//! quarter present) happens here; cross-validation of named-temperature
//! cells against the configured `tmax/tmin/t0` map happens one level up in
//! `Settings::validate`, matching the spec's "unknown names raise
//! InvalidContent at load time (never at query time)".

use chrono::Weekday as ChronoWeekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thermod_common::status::TemperatureName;
use thermod_common::Error;

/// Weekday names as they appear in the JSON document (§3/§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

pub const ALL_DAYS: [Day; 7] = [
    Day::Monday,
    Day::Tuesday,
    Day::Wednesday,
    Day::Thursday,
    Day::Friday,
    Day::Saturday,
    Day::Sunday,
];

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        };
        write!(f, "{}", s)
    }
}

impl From<ChronoWeekday> for Day {
    fn from(w: ChronoWeekday) -> Self {
        match w {
            ChronoWeekday::Mon => Day::Monday,
            ChronoWeekday::Tue => Day::Tuesday,
            ChronoWeekday::Wed => Day::Wednesday,
            ChronoWeekday::Thu => Day::Thursday,
            ChronoWeekday::Fri => Day::Friday,
            ChronoWeekday::Sat => Day::Saturday,
            ChronoWeekday::Sun => Day::Sunday,
        }
    }
}

/// A single quarter-hour programmed cell: either a literal real-valued
/// temperature in the working scale, or the name of a configured comfort
/// temperature, resolved later against `Settings::temperatures`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Named(TemperatureName),
    Literal(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Named(name) => write!(f, "{}", name),
            Cell::Literal(v) => write!(f, "{}", v),
        }
    }
}

/// One hour's four quarters, in order `[q0, q1, q2, q3]` covering
/// `[0,15), [15,30), [30,45), [45,60)` minutes (§4.1).
pub type Quarters = [Cell; 4];

fn hour_key(hour: u8) -> String {
    format!("h{:02}", hour)
}

/// A fully specified day: exactly 24 hours, each with exactly 4 quarters.
/// Stored keyed by the literal `"h00".."h23"` strings used on the wire so
/// round-tripping through JSON is exact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayProgram(BTreeMap<String, Quarters>);

impl DayProgram {
    pub fn new(hours: BTreeMap<String, Quarters>) -> Self {
        DayProgram(hours)
    }

    pub fn quarters(&self, hour: u8) -> Option<&Quarters> {
        self.0.get(&hour_key(hour))
    }

    pub fn set_quarters(&mut self, hour: u8, quarters: Quarters) {
        self.0.insert(hour_key(hour), quarters);
    }

    fn validate(&self, day: Day) -> Result<(), Error> {
        for hour in 0..24u8 {
            let key = hour_key(hour);
            if !self.0.contains_key(&key) {
                return Err(Error::timetable_invalid_content(format!(
                    "{}: missing hour {}",
                    day, key
                )));
            }
        }
        if self.0.len() != 24 {
            return Err(Error::timetable_invalid_content(format!(
                "{}: expected exactly 24 hours, found {}",
                day,
                self.0.len()
            )));
        }
        Ok(())
    }
}

/// The full weekly program: every day present, every day's 24 hours
/// present, every hour's 4 quarters present (§3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program(BTreeMap<Day, DayProgram>);

impl Program {
    pub fn new(days: BTreeMap<Day, DayProgram>) -> Self {
        Program(days)
    }

    pub fn day(&self, day: Day) -> Option<&DayProgram> {
        self.0.get(&day)
    }

    pub fn day_mut(&mut self, day: Day) -> Option<&mut DayProgram> {
        self.0.get_mut(&day)
    }

    pub fn set_day(&mut self, day: Day, program: DayProgram) {
        self.0.insert(day, program);
    }

    /// Resolve the cell at `(day, hour, quarter)`. `quarter` must be `0..4`.
    pub fn cell(&self, day: Day, hour: u8, quarter: u8) -> Result<Cell, Error> {
        let day_program = self.0.get(&day).ok_or_else(|| {
            Error::timetable_invalid_content(format!("missing day {}", day))
        })?;
        let quarters = day_program.quarters(hour).ok_or_else(|| {
            Error::timetable_invalid_content(format!("{}: missing hour h{:02}", day, hour))
        })?;
        quarters.get(quarter as usize).copied().ok_or_else(|| {
            Error::timetable_invalid_content(format!(
                "{}: quarter index {} out of range",
                day, quarter
            ))
        })
    }

    /// Structural validation: every day present, every day's 24 hours
    /// present. Does not check named cells against the temperature map;
    /// that is the caller's job (`Settings::validate`).
    pub fn validate(&self) -> Result<(), Error> {
        for day in ALL_DAYS {
            let day_program = self
                .0
                .get(&day)
                .ok_or_else(|| Error::timetable_invalid_content(format!("missing day {}", day)))?;
            day_program.validate(day)?;
        }
        if self.0.len() != 7 {
            return Err(Error::timetable_invalid_content(format!(
                "expected exactly 7 days, found {}",
                self.0.len()
            )));
        }
        Ok(())
    }

    /// All named cells referenced anywhere in the program, for cross
    /// validation against the configured named-temperature map.
    pub fn named_cells(&self) -> impl Iterator<Item = TemperatureName> + '_ {
        self.0.values().flat_map(|day_program| {
            day_program.0.values().flat_map(|quarters| {
                quarters.iter().filter_map(|cell| match cell {
                    Cell::Named(name) => Some(*name),
                    Cell::Literal(_) => None,
                })
            })
        })
    }
}

/// Resolve `now`'s minute component to a quarter index in `0..4`, per the
/// `[0,15), [15,30), [30,45), [45,60)` boundaries of §4.1.
pub fn quarter_of_minute(minute: u32) -> u8 {
    (minute / 15) as u8
}

#[cfg(test)]
mod test {
    use super::*;

    fn flat_day(temp: f64) -> DayProgram {
        let mut hours = BTreeMap::new();
        for hour in 0..24u8 {
            hours.insert(hour_key(hour), [Cell::Literal(temp); 4]);
        }
        DayProgram::new(hours)
    }

    fn flat_program(temp: f64) -> Program {
        let mut days = BTreeMap::new();
        for day in ALL_DAYS {
            days.insert(day, flat_day(temp));
        }
        Program::new(days)
    }

    #[test]
    fn validates_complete_program() {
        assert!(flat_program(20.0).validate().is_ok());
    }

    #[test]
    fn rejects_missing_day() {
        let mut program = flat_program(20.0);
        // Drop Sunday by rebuilding with only 6 days.
        let mut days = BTreeMap::new();
        for day in ALL_DAYS.iter().take(6) {
            days.insert(*day, program.day(*day).unwrap().clone());
        }
        program = Program::new(days);
        assert!(program.validate().is_err());
    }

    #[test]
    fn rejects_missing_hour() {
        let mut day_program = flat_day(20.0);
        day_program.0.remove("h23");
        let mut days = BTreeMap::new();
        for day in ALL_DAYS {
            days.insert(day, day_program.clone());
        }
        assert!(Program::new(days).validate().is_err());
    }

    #[test]
    fn quarter_boundaries() {
        assert_eq!(quarter_of_minute(0), 0);
        assert_eq!(quarter_of_minute(14), 0);
        assert_eq!(quarter_of_minute(15), 1);
        assert_eq!(quarter_of_minute(34), 2);
        assert_eq!(quarter_of_minute(59), 3);
    }

    #[test]
    fn json_round_trip() {
        let program = flat_program(18.5);
        let json = serde_json::to_string(&program).unwrap();
        let back: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.cell(Day::Wednesday, 10, 2).unwrap(),
            Cell::Literal(18.5)
        );
    }

    #[test]
    fn named_and_literal_cells_coexist() {
        let mut hours = BTreeMap::new();
        hours.insert(
            hour_key(8),
            [
                Cell::Named(TemperatureName::Tmin),
                Cell::Named(TemperatureName::Tmin),
                Cell::Named(TemperatureName::Tmax),
                Cell::Named(TemperatureName::Tmax),
            ],
        );
        for hour in 0..24u8 {
            if hour != 8 {
                hours.insert(hour_key(hour), [Cell::Literal(18.0); 4]);
            }
        }
        let day_program = DayProgram::new(hours);
        let mut days = BTreeMap::new();
        for day in ALL_DAYS {
            days.insert(day, day_program.clone());
        }
        let program = Program::new(days);
        assert_eq!(
            program.cell(Day::Monday, 8, 2).unwrap(),
            Cell::Named(TemperatureName::Tmax)
        );
        let names: Vec<_> = program.named_cells().collect();
        assert!(!names.is_empty());
    }
}
