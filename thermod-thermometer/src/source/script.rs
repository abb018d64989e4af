// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The `Script` thermometer source (§4.2/§6): spawns an external helper
//! that prints `{"temperature": num|null, "error": str|null}` to stdout
//! and exits 0 on success. The exit code is the primary success signal;
//! a non-zero exit is reported as a `ThermometerError` carrying whatever
//! diagnosis the script put in its JSON `error` field.

use crate::calibration::Calibration;
use crate::source::Thermometer;
use async_trait::async_trait;
use log::trace;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thermod_common::Error;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Deserialize)]
struct ScriptOutput {
    temperature: Option<f64>,
    error: Option<String>,
}

pub struct ScriptSource {
    script: PathBuf,
    calibration: Calibration,
    /// Scale the script's own readings are expressed in; converted to the
    /// working scale by the `ScaleAdapter` decorator that wraps this
    /// source, not here.
    timeout: Duration,
}

impl ScriptSource {
    pub fn new(script: PathBuf, calibration: Calibration, timeout: Duration) -> Self {
        ScriptSource {
            script,
            calibration,
            timeout,
        }
    }

    async fn run(&self) -> Result<ScriptOutput, Error> {
        let script_name = self.script.display().to_string();
        let output = timeout(self.timeout, Command::new(&self.script).output())
            .await
            .map_err(|_| Error::Script {
                script: script_name.clone(),
                sub: format!("timed out after {:?}", self.timeout),
            })?
            .map_err(|e| Error::Script {
                script: script_name.clone(),
                sub: e.to_string(),
            })?;

        let parsed: ScriptOutput = serde_json::from_slice(&output.stdout).map_err(|e| {
            Error::Script {
                script: script_name.clone(),
                sub: format!("malformed JSON on stdout: {}", e),
            }
        })?;

        if !output.status.success() {
            let sub = parsed
                .error
                .clone()
                .unwrap_or_else(|| format!("exit status {:?}", output.status.code()));
            return Err(Error::Script {
                script: script_name,
                sub,
            });
        }

        trace!("script {}: {:?}", script_name, parsed);
        Ok(parsed)
    }
}

#[async_trait]
impl Thermometer for ScriptSource {
    async fn temperature(&self) -> Result<f64, Error> {
        let output = self.run().await?;
        match output.temperature {
            Some(raw) => Ok(self.calibration.apply(raw)),
            None => {
                let sub = output
                    .error
                    .unwrap_or_else(|| "script reported success but no temperature".into());
                Err(Error::Script {
                    script: self.script.display().to_string(),
                    sub,
                })
            }
        }
    }

    async fn close(&self) {
        // No persistent resources: each reading spawns a fresh, short-lived
        // process.
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    fn write_script(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[tokio::test]
    async fn successful_reading() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "thermometer.sh",
            "#!/bin/sh\necho '{\"temperature\": 21.5, \"error\": null}'\nexit 0\n",
        );
        let source = ScriptSource::new(script, Calibration::identity(), Duration::from_secs(5));
        let temp = source.temperature().await.unwrap();
        assert!((temp - 21.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn nonzero_exit_is_thermometer_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "thermometer.sh",
            "#!/bin/sh\necho '{\"temperature\": null, \"error\": \"sensor unplugged\"}'\nexit 1\n",
        );
        let source = ScriptSource::new(script, Calibration::identity(), Duration::from_secs(5));
        let err = source.temperature().await.unwrap_err();
        match err {
            Error::Script { sub, .. } => assert_eq!(sub, "sensor unplugged"),
            other => panic!("expected Script error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn calibration_is_applied_to_raw_reading() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "thermometer.sh",
            "#!/bin/sh\necho '{\"temperature\": 10.0, \"error\": null}'\nexit 0\n",
        );
        let calibration = Calibration::new(&[0.0, 10.0], &[0.0, 11.0]).unwrap();
        let source = ScriptSource::new(script, calibration, Duration::from_secs(5));
        let temp = source.temperature().await.unwrap();
        assert!((temp - 11.0).abs() < 1e-9);
    }
}
