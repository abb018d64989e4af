// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! Daemon configuration (§6 supplement): a TOML file separate from the
//! timetable JSON document, parsed with `serde` + `toml` the same way the
//! teacher's S9 config module parses `/etc/bosminer.toml`, with a `clap`
//! overlay for the handful of flags that make sense on the command line.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thermod_common::scale::DegreeScale;
use thermod_common::Error;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/thermod.toml";

#[derive(Parser, Debug)]
#[command(name = "thermod", version, about = "Programmable thermostat daemon")]
pub struct Cli {
    /// Path to the daemon configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Write a PID file at this path after startup.
    #[arg(long)]
    pub pidfile: Option<PathBuf>,

    /// Increase log verbosity (-v = debug, -vv = trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Stay attached to the controlling terminal instead of daemonizing.
    #[arg(long)]
    pub foreground: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonSection {
    pub interval: u64,
    pub sleep_on_error: u64,
    #[serde(default = "default_scale")]
    pub scale: DegreeScale,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_scale() -> DegreeScale {
    DegreeScale::Celsius
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SocketSection {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimetableSection {
    pub path: PathBuf,
}

/// The decorator knobs shared by every thermometer source (§6 supplement):
/// calibration points, the similarity checker's buffer size and delta, and
/// the averaging task's interval/window/skip-fraction. Flattened into each
/// `ThermometerSection` variant so the TOML schema stays one table per
/// thermometer rather than a nested sub-table.
#[derive(Debug, Clone, Deserialize)]
pub struct DecoratorConfig {
    #[serde(default)]
    pub calibration_raw: Vec<f64>,
    #[serde(default)]
    pub calibration_ref: Vec<f64>,
    #[serde(default = "default_similarity_buffer")]
    pub similarity_buffer: usize,
    #[serde(default = "default_similarity_delta")]
    pub similarity_delta: f64,
    #[serde(default = "default_avg_interval_secs")]
    pub avg_interval_secs: u64,
    #[serde(default = "default_avg_window_secs")]
    pub avg_window_secs: u64,
    #[serde(default = "default_avg_skip")]
    pub avg_skip: f64,
}

impl Default for DecoratorConfig {
    fn default() -> Self {
        DecoratorConfig {
            calibration_raw: Vec::new(),
            calibration_ref: Vec::new(),
            similarity_buffer: default_similarity_buffer(),
            similarity_delta: default_similarity_delta(),
            avg_interval_secs: default_avg_interval_secs(),
            avg_window_secs: default_avg_window_secs(),
            avg_skip: default_avg_skip(),
        }
    }
}

fn default_similarity_buffer() -> usize {
    4
}

fn default_similarity_delta() -> f64 {
    5.0
}

fn default_avg_interval_secs() -> u64 {
    10
}

fn default_avg_window_secs() -> u64 {
    120
}

fn default_avg_skip() -> f64 {
    0.2
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThermometerSection {
    Script {
        script: PathBuf,
        #[serde(default = "default_script_timeout")]
        timeout_secs: u64,
        #[serde(flatten)]
        decorators: DecoratorConfig,
    },
    OneWire {
        device_files: Vec<PathBuf>,
        #[serde(default = "default_max_stddev")]
        max_stddev: f64,
        #[serde(flatten)]
        decorators: DecoratorConfig,
    },
    Fake {
        #[serde(default)]
        constant: f64,
        #[serde(flatten)]
        decorators: DecoratorConfig,
    },
}

impl ThermometerSection {
    pub fn decorators(&self) -> &DecoratorConfig {
        match self {
            ThermometerSection::Script { decorators, .. } => decorators,
            ThermometerSection::OneWire { decorators, .. } => decorators,
            ThermometerSection::Fake { decorators, .. } => decorators,
        }
    }
}

fn default_script_timeout() -> u64 {
    5
}

fn default_max_stddev() -> f64 {
    2.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActuatorSection {
    Script {
        switch_on: PathBuf,
        switch_off: PathBuf,
        status: Option<PathBuf>,
        #[serde(default = "default_script_timeout")]
        timeout_secs: u64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub daemon: DaemonSection,
    pub socket: SocketSection,
    pub timetable: TimetableSection,
    pub thermometer: ThermometerSection,
    pub actuator: ActuatorSection,
}

impl Config {
    pub fn load(path: &std::path::Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.daemon.interval == 0 {
            return Err(Error::Config("daemon.interval must be greater than zero".into()));
        }
        if self.daemon.sleep_on_error == 0 {
            return Err(Error::Config("daemon.sleep_on_error must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.daemon.interval)
    }

    pub fn sleep_on_error(&self) -> Duration {
        Duration::from_secs(self.daemon.sleep_on_error)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let toml_text = r#"
            [daemon]
            interval = 30
            sleep_on_error = 120

            [socket]
            host = "127.0.0.1"
            port = 4344

            [timetable]
            path = "/var/lib/thermod/timetable.json"

            [thermometer]
            kind = "fake"
            constant = 20.0

            [actuator]
            kind = "script"
            switch_on = "/bin/true"
            switch_off = "/bin/true"
        "#;
        let config: Config = toml::from_str(toml_text).unwrap();
        config.validate().unwrap();
        assert_eq!(config.daemon.interval, 30);
        assert_eq!(config.socket.port, 4344);
    }

    #[test]
    fn parses_thermometer_decorator_knobs() {
        let toml_text = r#"
            [daemon]
            interval = 30
            sleep_on_error = 120

            [socket]
            host = "127.0.0.1"
            port = 4344

            [timetable]
            path = "/var/lib/thermod/timetable.json"

            [thermometer]
            kind = "script"
            script = "/usr/local/bin/thermod-thermometer"
            calibration_raw = [0.0, 10.0]
            calibration_ref = [0.5, 10.3]
            similarity_buffer = 6
            similarity_delta = 1.5
            avg_interval_secs = 5
            avg_window_secs = 60
            avg_skip = 0.1

            [actuator]
            kind = "script"
            switch_on = "/bin/true"
            switch_off = "/bin/true"
        "#;
        let config: Config = toml::from_str(toml_text).unwrap();
        let decorators = config.thermometer.decorators();
        assert_eq!(decorators.calibration_raw, vec![0.0, 10.0]);
        assert_eq!(decorators.similarity_buffer, 6);
        assert_eq!(decorators.avg_window_secs, 60);
    }

    #[test]
    fn thermometer_decorator_knobs_default_when_absent() {
        let toml_text = r#"
            [daemon]
            interval = 30
            sleep_on_error = 120

            [socket]
            host = "127.0.0.1"
            port = 4344

            [timetable]
            path = "/var/lib/thermod/timetable.json"

            [thermometer]
            kind = "fake"
            constant = 20.0

            [actuator]
            kind = "script"
            switch_on = "/bin/true"
            switch_off = "/bin/true"
        "#;
        let config: Config = toml::from_str(toml_text).unwrap();
        let decorators = config.thermometer.decorators();
        assert!(decorators.calibration_raw.is_empty());
        assert_eq!(decorators.similarity_buffer, 4);
        assert_eq!(decorators.avg_interval_secs, 10);
    }

    #[test]
    fn rejects_zero_interval() {
        let mut config = valid_config();
        config.daemon.interval = 0;
        assert!(config.validate().is_err());
    }

    fn valid_config() -> Config {
        Config {
            daemon: DaemonSection {
                interval: 30,
                sleep_on_error: 120,
                scale: DegreeScale::Celsius,
                log_level: "info".into(),
            },
            socket: SocketSection {
                host: "127.0.0.1".into(),
                port: 4344,
            },
            timetable: TimetableSection {
                path: "/var/lib/thermod/timetable.json".into(),
            },
            thermometer: ThermometerSection::Fake {
                constant: 20.0,
                decorators: DecoratorConfig::default(),
            },
            actuator: ActuatorSection::Script {
                switch_on: "/bin/true".into(),
                switch_off: "/bin/true".into(),
                status: None,
                timeout_secs: 5,
            },
        }
    }
}
