// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The hysteresis ("inertia") decision table of §3/§4.1. This module is
//! pure: given a target, a differential, an inertia mode, an HVAC mode, the
//! current temperature and the prior actuator state, it returns the next
//! actuator state. It holds no clocks and no state of its own; `grace_time`
//! (which *does* need wall-clock state) lives one level up in
//! `timetable::Timetable`.

use thermod_common::status::{HvacMode, InertiaMode};

/// Offsets (in units of the differential `d`) defining the two switching
/// thresholds for heating, per the table in §3:
///
/// | inertia | ON at           | OFF at          |
/// |---------|-----------------|-----------------|
/// | 1       | T - d           | T + d           |
/// | 2       | T - 2d          | T                |
/// | 3       | T - 2d          | T - d           |
///
/// returned as `(on_offset, off_offset)` such that heating's ON threshold
/// is `T - on_offset*d` and OFF threshold is `T + off_offset*d`.
fn offsets(inertia: InertiaMode) -> (f64, f64) {
    match inertia {
        InertiaMode::One => (1.0, 1.0),
        InertiaMode::Two => (2.0, 0.0),
        InertiaMode::Three => (2.0, 1.0),
    }
}

/// Decide the next actuator state. `target` may be `-inf`/`+inf`
/// (mode-forced off, §3): the thresholds then degenerate so that the
/// actuator is always commanded off regardless of `current`, for either
/// HVAC mode, without any special-casing here.
pub fn should_be_on(
    target: f64,
    differential: f64,
    inertia: InertiaMode,
    hvac_mode: HvacMode,
    current: f64,
    prior_on: bool,
) -> bool {
    let (on_offset, off_offset) = offsets(inertia);
    match hvac_mode {
        HvacMode::Heating => {
            let on_at = target - on_offset * differential;
            let off_at = target + off_offset * differential;
            if current <= on_at {
                true
            } else if current >= off_at {
                false
            } else {
                prior_on
            }
        }
        HvacMode::Cooling => {
            let on_at = target + on_offset * differential;
            let off_at = target - off_offset * differential;
            if current >= on_at {
                true
            } else if current <= off_at {
                false
            } else {
                prior_on
            }
        }
    }
}
