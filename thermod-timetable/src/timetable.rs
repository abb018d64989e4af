// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! `Timetable`: owns the persisted `Settings`, resolves targets and
//! hysteresis decisions, and notifies a shared condition variable on every
//! mutation so the control cycle re-evaluates promptly (§4.1).

use crate::hysteresis;
use crate::program::{quarter_of_minute, Day};
use crate::settings::Settings;
use chrono::{DateTime, Local, Timelike};
use log::{debug, error, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thermod_common::status::{HvacMode, InertiaMode, Mode, Target, TemperatureName, ThermodStatus};
use thermod_common::Error;
use tokio::sync::Notify;

/// Tracks how long the actuator has been continuously commanded on, for
/// `grace_time` (§4.1): after that many seconds the controller forces OFF
/// regardless of hysteresis, until the target would require ON again *from
/// a fresh OFF* — i.e. the dead-zone latch alone cannot re-arm it.
#[derive(Debug, Default)]
struct GraceTracker {
    on_since: Option<Instant>,
    forced_off: bool,
}

impl GraceTracker {
    fn observe(&mut self, actuator_on: bool) {
        if actuator_on {
            if self.on_since.is_none() {
                self.on_since = Some(Instant::now());
            }
        } else {
            self.on_since = None;
            self.forced_off = false;
        }
    }

    /// Returns `Some(false)` when grace time overrides the hysteresis
    /// decision to off, `None` when grace time does not apply and the
    /// hysteresis decision should be used unmodified.
    fn apply(&mut self, grace_time: Option<u64>, hysteresis_on: bool, fresh_off_on: bool) -> Option<bool> {
        let grace_time = match grace_time {
            Some(g) => g,
            None => return None,
        };
        if self.forced_off {
            // Still suppressed unless the target would require ON even
            // starting from a fresh OFF.
            return if fresh_off_on {
                self.forced_off = false;
                None
            } else {
                Some(false)
            };
        }
        if let Some(on_since) = self.on_since {
            if hysteresis_on && on_since.elapsed().as_secs() >= grace_time {
                self.forced_off = true;
                return Some(false);
            }
        }
        None
    }
}

/// Result of `should_the_heating_be_on`: the decision plus the status it
/// was derived from (§4.1). `bool::from` extracts just the decision.
#[derive(Debug, Clone)]
pub struct ShouldBeOn {
    pub on: bool,
    pub status: ThermodStatus,
}

impl From<ShouldBeOn> for bool {
    fn from(value: ShouldBeOn) -> Self {
        value.on
    }
}

pub struct Timetable {
    settings: Settings,
    path: PathBuf,
    grace: GraceTracker,
    notify: Arc<Notify>,
}

impl Timetable {
    /// Load from `path`, validating against the schema (§4.1). The
    /// returned `Timetable` shares `notify` with its caller so setters and
    /// reloads can wake the control cycle.
    pub async fn load(path: impl AsRef<Path>, notify: Arc<Notify>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let settings = Self::read_settings(&path).await?;
        settings.validate()?;
        Ok(Timetable {
            settings,
            path,
            grace: GraceTracker::default(),
            notify,
        })
    }

    async fn read_settings(path: &Path) -> Result<Settings, Error> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            use std::io::ErrorKind;
            match e.kind() {
                ErrorKind::NotFound => {
                    Error::timetable_not_found(path.display().to_string())
                }
                ErrorKind::PermissionDenied => {
                    Error::timetable_permission_denied(path.display().to_string())
                }
                _ => Error::timetable_invalid_syntax(e.to_string()),
            }
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::timetable_invalid_syntax(e.to_string()))
    }

    /// Reload in place from the original load path. On any failure, prior
    /// state is preserved (§4.1/§7).
    pub async fn reload(&mut self) -> Result<(), Error> {
        let settings = Self::read_settings(&self.path).await?;
        settings.validate()?;
        self.settings = settings;
        self.notify.notify_waiters();
        Ok(())
    }

    /// Atomic write: write to a temp file in the same directory, then
    /// rename over the destination (§4.1/§6).
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| Error::Unknown(e.to_string()))?;
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolve `(day, hour, quarter)` from local time per §4.1's minute
    /// boundaries.
    fn resolve_program_cell(&self, now: DateTime<Local>) -> Result<f64, Error> {
        let day: Day = now.weekday().into();
        let hour = now.hour() as u8;
        let quarter = quarter_of_minute(now.minute());
        let cell = self.settings.timetable.cell(day, hour, quarter)?;
        match cell {
            crate::program::Cell::Literal(v) => Ok(v),
            crate::program::Cell::Named(name) => self.settings.named_temperature(name),
        }
    }

    /// Resolve the target temperature for `mode` at `now` (§4.1). Never
    /// fails for a previously-validated `Settings`; on an unexpected
    /// resolution error (which validation should have prevented) it logs
    /// and degrades to the off-safe target for the current HVAC mode
    /// rather than panicking, matching "query operations never raise for
    /// well-formed state."
    pub fn target_temperature(&self, now: DateTime<Local>, mode: Mode) -> Target {
        let off_safe = self.off_safe_target();
        match mode {
            Mode::Off => off_safe,
            Mode::On => self.named_or_off_safe(TemperatureName::Tmax, off_safe),
            Mode::Tmax => self.named_or_off_safe(TemperatureName::Tmax, off_safe),
            Mode::Tmin => self.named_or_off_safe(TemperatureName::Tmin, off_safe),
            Mode::T0 => self.named_or_off_safe(TemperatureName::T0, off_safe),
            Mode::Auto => match self.resolve_program_cell(now) {
                Ok(v) => Target::finite(v),
                Err(e) => {
                    error!("target_temperature: {} (falling back to off-safe target)", e);
                    off_safe
                }
            },
        }
    }

    fn named_or_off_safe(&self, name: TemperatureName, off_safe: Target) -> Target {
        match self.settings.named_temperature(name) {
            Ok(v) => Target::finite(v),
            Err(e) => {
                error!("target_temperature: {} (falling back to off-safe target)", e);
                off_safe
            }
        }
    }

    fn off_safe_target(&self) -> Target {
        match self.settings.hvac_mode {
            HvacMode::Heating => Target::NEGATIVE_INFINITY,
            HvacMode::Cooling => Target::POSITIVE_INFINITY,
        }
    }

    /// Apply hysteresis and grace time to decide the next actuator state
    /// (§4.1). This is a latching function: in the dead zone it returns
    /// `actuator_on` unchanged.
    pub fn should_the_heating_be_on(
        &mut self,
        now: DateTime<Local>,
        current_temp: f64,
        actuator_on: bool,
    ) -> ShouldBeOn {
        let target = self.target_temperature(now, self.settings.mode);
        self.grace.observe(actuator_on);

        let hysteresis_on = hysteresis::should_be_on(
            target.0,
            self.settings.differential,
            self.settings.inertia,
            self.settings.hvac_mode,
            current_temp,
            actuator_on,
        );
        let fresh_off_on = hysteresis::should_be_on(
            target.0,
            self.settings.differential,
            self.settings.inertia,
            self.settings.hvac_mode,
            current_temp,
            false,
        );

        let on = self
            .grace
            .apply(self.settings.grace_time, hysteresis_on, fresh_off_on)
            .unwrap_or(hysteresis_on);

        if on != hysteresis_on {
            debug!("grace_time override: hysteresis wanted {} forced to {}", hysteresis_on, on);
        }

        let status = ThermodStatus {
            timestamp: now,
            mode: self.settings.mode,
            hvac_mode: self.settings.hvac_mode,
            current_temperature: Some(current_temp),
            target_temperature: target,
            actuator_status: on,
            error: None,
        };

        ShouldBeOn { on, status }
    }

    fn notify_changed(&self) {
        self.notify.notify_waiters();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.settings.mode = mode;
        self.notify_changed();
    }

    pub fn set_hvac_mode(&mut self, hvac_mode: HvacMode) {
        self.settings.hvac_mode = hvac_mode;
        self.notify_changed();
    }

    pub fn set_inertia(&mut self, inertia: InertiaMode) {
        self.settings.inertia = inertia;
        self.notify_changed();
    }

    pub fn set_differential(&mut self, differential: f64) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&differential) {
            return Err(Error::Validation(format!(
                "differential must be within [0, 1], got {}",
                differential
            )));
        }
        self.settings.differential = differential;
        self.notify_changed();
        Ok(())
    }

    pub fn set_grace_time(&mut self, grace_time: Option<u64>) {
        self.settings.grace_time = grace_time;
        self.notify_changed();
    }

    pub fn set_named_temperature(&mut self, name: TemperatureName, value: f64) {
        self.settings.temperatures.insert(name, value);
        self.notify_changed();
    }

    pub fn set_program(&mut self, program: crate::program::Program) -> Result<(), Error> {
        program.validate().map_err(|e| Error::Validation(e.to_string()))?;
        for name in program.named_cells() {
            if !self.settings.temperatures.contains_key(&name) {
                return Err(Error::Validation(format!(
                    "program references undefined named temperature {}",
                    name
                )));
            }
        }
        self.settings.timetable = program;
        self.notify_changed();
        Ok(())
    }

    /// Replace the whole settings document wholesale, e.g. from a `POST
    /// /settings` body carrying the full document (§4.5).
    pub fn set_settings(&mut self, settings: Settings) -> Result<(), Error> {
        settings.validate().map_err(|e| Error::Validation(e.to_string()))?;
        self.settings = settings;
        self.notify_changed();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::program::{Cell, DayProgram, ALL_DAYS};
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn flat_settings(temp: f64, mode: Mode, hvac_mode: HvacMode) -> Settings {
        let mut temperatures = BTreeMap::new();
        temperatures.insert(TemperatureName::Tmax, 21.0);
        temperatures.insert(TemperatureName::Tmin, 18.0);
        temperatures.insert(TemperatureName::T0, 7.0);

        let mut days = BTreeMap::new();
        for day in ALL_DAYS {
            let mut hours = BTreeMap::new();
            for hour in 0..24u8 {
                hours.insert(format!("h{:02}", hour), [Cell::Literal(temp); 4]);
            }
            days.insert(day, DayProgram::new(hours));
        }

        Settings {
            temperatures,
            differential: 0.5,
            grace_time: None,
            mode,
            hvac_mode,
            inertia: InertiaMode::One,
            timetable: crate::program::Program::new(days),
        }
    }

    async fn write_timetable(settings: &Settings) -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timetable.json");
        tokio::fs::write(&path, serde_json::to_string(settings).unwrap())
            .await
            .unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn load_save_round_trip() {
        let settings = flat_settings(20.0, Mode::Auto, HvacMode::Heating);
        let (_dir, path) = write_timetable(&settings).await;
        let notify = Arc::new(Notify::new());
        let timetable = Timetable::load(&path, notify).await.unwrap();

        let save_path = path.with_file_name("saved.json");
        timetable.save(&save_path).await.unwrap();
        let notify2 = Arc::new(Notify::new());
        let reloaded = Timetable::load(&save_path, notify2).await.unwrap();
        assert_eq!(reloaded.settings().differential, settings.differential);
    }

    #[tokio::test]
    async fn load_missing_file_fails_not_found() {
        let notify = Arc::new(Notify::new());
        let err = Timetable::load("/nonexistent/path/timetable.json", notify)
            .await
            .unwrap_err();
        match err {
            Error::Timetable(thermod_common::error::TimetableErrorKind::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn reload_preserves_state_on_failure() {
        let settings = flat_settings(20.0, Mode::Auto, HvacMode::Heating);
        let (_dir, path) = write_timetable(&settings).await;
        let notify = Arc::new(Notify::new());
        let mut timetable = Timetable::load(&path, notify).await.unwrap();

        tokio::fs::write(&path, "{ not json").await.unwrap();
        let err = timetable.reload().await.unwrap_err();
        assert!(matches!(err, Error::Timetable(_)));
        // prior (valid) state is retained
        assert_eq!(timetable.settings().differential, 0.5);
    }

    #[tokio::test]
    async fn s4_program_resolution() {
        // Monday h08 quarters [tmin, tmin, tmax, tmax], tmax=21, tmin=18,
        // queried at Monday 08:34 -> target 21.
        let mut settings = flat_settings(19.0, Mode::Auto, HvacMode::Heating);
        let day_program = settings.timetable.day_mut(Day::Monday).unwrap();
        day_program.set_quarters(
            8,
            [
                Cell::Named(TemperatureName::Tmin),
                Cell::Named(TemperatureName::Tmin),
                Cell::Named(TemperatureName::Tmax),
                Cell::Named(TemperatureName::Tmax),
            ],
        );
        let (_dir, path) = write_timetable(&settings).await;
        let notify = Arc::new(Notify::new());
        let timetable = Timetable::load(&path, notify).await.unwrap();

        // 2026-07-27 is a Monday.
        let now = chrono::Local
            .with_ymd_and_hms(2026, 7, 27, 8, 34, 0)
            .unwrap();
        let target = timetable.target_temperature(now, Mode::Auto);
        assert_eq!(target.0, 21.0);
    }

    #[tokio::test]
    async fn mode_off_always_decides_off() {
        let settings = flat_settings(20.0, Mode::Off, HvacMode::Heating);
        let (_dir, path) = write_timetable(&settings).await;
        let notify = Arc::new(Notify::new());
        let mut timetable = Timetable::load(&path, notify).await.unwrap();
        let now = Local::now();
        for current in [-10.0, 19.0, 50.0] {
            for prior in [true, false] {
                let decision = timetable.should_the_heating_be_on(now, current, prior);
                assert!(!decision.on);
            }
        }
    }

    #[tokio::test]
    async fn grace_time_forces_off_after_continuous_on() {
        let mut settings = flat_settings(30.0, Mode::Auto, HvacMode::Heating);
        settings.grace_time = Some(0); // force immediate expiry for the test
        let (_dir, path) = write_timetable(&settings).await;
        let notify = Arc::new(Notify::new());
        let mut timetable = Timetable::load(&path, notify).await.unwrap();
        let now = Local::now();

        // current (10.0) is far below target (30.0): hysteresis wants ON.
        let first = timetable.should_the_heating_be_on(now, 10.0, true);
        assert!(!first.on, "grace_time=0 should force off immediately");
    }
}
