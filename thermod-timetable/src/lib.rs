// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The timetable engine (§4.1): weekly program storage, target resolution,
//! and the hysteresis/grace-time decision that drives the actuator.

pub mod hysteresis;
pub mod program;
pub mod settings;
pub mod timetable;

pub use program::{Cell, Day, DayProgram, Program};
pub use settings::Settings;
pub use timetable::{ShouldBeOn, Timetable};
