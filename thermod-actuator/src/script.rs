// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The `Script` actuator (§4.3): three external commands for on/off/status,
//! each printing `{"success": bool, "error": str|null}` to stdout. For the
//! status command, `success` carries the actuator's current on/off state
//! rather than "the query succeeded"; a non-null `error` means the query
//! itself failed. The status command is optional: when absent, `is_on`
//! answers from a cached value, which the caller is responsible for
//! initializing with an explicit `switch_off` at startup (§4.3).

use crate::Actuator;
use async_trait::async_trait;
use log::trace;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thermod_common::Error;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::timeout;

#[derive(Debug, Deserialize)]
struct ScriptResult {
    success: bool,
    error: Option<String>,
}

pub struct ScriptActuator {
    on_script: PathBuf,
    off_script: PathBuf,
    status_script: Option<PathBuf>,
    timeout: Duration,
    cached_status: Mutex<bool>,
}

impl ScriptActuator {
    pub fn new(on_script: PathBuf, off_script: PathBuf, status_script: Option<PathBuf>, timeout: Duration) -> Self {
        ScriptActuator {
            on_script,
            off_script,
            status_script,
            timeout,
            cached_status: Mutex::new(false),
        }
    }

    async fn run(&self, script: &Path) -> Result<ScriptResult, Error> {
        let script_name = script.display().to_string();
        let output = timeout(self.timeout, Command::new(script).output())
            .await
            .map_err(|_| Error::Script {
                script: script_name.clone(),
                sub: format!("timed out after {:?}", self.timeout),
            })?
            .map_err(|e| Error::Script {
                script: script_name.clone(),
                sub: e.to_string(),
            })?;

        let parsed: ScriptResult = serde_json::from_slice(&output.stdout).map_err(|e| Error::Script {
            script: script_name.clone(),
            sub: format!("malformed JSON on stdout: {}", e),
        })?;

        if !output.status.success() {
            let sub = parsed
                .error
                .clone()
                .unwrap_or_else(|| format!("exit status {:?}", output.status.code()));
            return Err(Error::Script { script: script_name, sub });
        }

        trace!("actuator script {}: {:?}", script_name, parsed);
        Ok(parsed)
    }

    async fn run_switch(&self, script: &Path, target: bool) -> Result<(), Error> {
        let result = self.run(script).await?;
        if !result.success {
            return Err(Error::Script {
                script: script.display().to_string(),
                sub: result.error.unwrap_or_else(|| "switch command reported failure".into()),
            });
        }
        *self.cached_status.lock().await = target;
        Ok(())
    }
}

#[async_trait]
impl Actuator for ScriptActuator {
    async fn switch_on(&self) -> Result<(), Error> {
        let script = self.on_script.clone();
        self.run_switch(&script, true).await
    }

    async fn switch_off(&self) -> Result<(), Error> {
        let script = self.off_script.clone();
        self.run_switch(&script, false).await
    }

    async fn is_on(&self) -> Result<bool, Error> {
        match &self.status_script {
            Some(path) => {
                let result = self.run(path).await?;
                if let Some(err) = result.error {
                    return Err(Error::Script {
                        script: path.display().to_string(),
                        sub: err,
                    });
                }
                *self.cached_status.lock().await = result.success;
                Ok(result.success)
            }
            None => Ok(*self.cached_status.lock().await),
        }
    }

    async fn close(&self) {
        // No persistent resources: each command spawns a fresh, short-lived
        // process.
    }
}
