// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod.
//
// Thermod is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! Error taxonomy shared by every thermod crate (§7 of the design).
//!
//! Every fallible operation in the daemon returns `thermod_common::error::Result`.
//! Variants map 1:1 onto the propagation policy: `Timetable`/`Config` are fatal at
//! startup, `Thermometer`/`Heating`/`Script` are transient runtime conditions the
//! control cycle logs and retries, `Validation`/`JsonValue` come from untrusted
//! input (socket requests, reloaded timetable files) and become HTTP 400s, and
//! `Unknown` is anything that fell through and should trigger shutdown.

use failure::Fail;

/// Sub-kind of a failed timetable load/reload, see `Timetable::load`.
#[derive(Debug, Fail, Clone, PartialEq, Eq)]
pub enum TimetableErrorKind {
    #[fail(display = "timetable file not found: {}", _0)]
    NotFound(String),
    #[fail(display = "permission denied reading timetable file: {}", _0)]
    PermissionDenied(String),
    #[fail(display = "invalid JSON syntax in timetable file: {}", _0)]
    InvalidSyntax(String),
    #[fail(display = "invalid timetable content: {}", _0)]
    InvalidContent(String),
}

#[derive(Debug, Fail)]
pub enum Error {
    /// Malformed or missing daemon configuration. Fatal at startup only.
    #[fail(display = "configuration error: {}", _0)]
    Config(String),

    /// Not-found/permission-denied/invalid-syntax/invalid-content loading the
    /// timetable. Fatal at startup, recoverable on SIGHUP reload (prior state
    /// is retained by the caller).
    #[fail(display = "timetable error: {}", _0)]
    Timetable(TimetableErrorKind),

    /// Transient failure reading the thermometer pipeline.
    #[fail(display = "thermometer error: {}", _0)]
    Thermometer(String),

    /// Transient failure switching or querying the actuator.
    #[fail(display = "heating error: {}", _0)]
    Heating(String),

    /// A helper script failed or returned malformed output.
    #[fail(display = "script error: {} ({})", script, sub)]
    Script { script: String, sub: String },

    /// Bad input from the socket, or a reloaded timetable that fails schema
    /// validation. Returned as HTTP 400, logged as a warning, no state change.
    #[fail(display = "validation error: {}", _0)]
    Validation(String),

    /// Malformed JSON value where a well-typed one was expected.
    #[fail(display = "invalid JSON value: {}", _0)]
    JsonValue(String),

    /// Anything else. Logged as critical; the control cycle shuts down.
    #[fail(display = "unknown error: {}", _0)]
    Unknown(String),
}

impl Error {
    pub fn timetable_not_found(path: impl Into<String>) -> Self {
        Error::Timetable(TimetableErrorKind::NotFound(path.into()))
    }

    pub fn timetable_permission_denied(path: impl Into<String>) -> Self {
        Error::Timetable(TimetableErrorKind::PermissionDenied(path.into()))
    }

    pub fn timetable_invalid_syntax(reason: impl Into<String>) -> Self {
        Error::Timetable(TimetableErrorKind::InvalidSyntax(reason.into()))
    }

    pub fn timetable_invalid_content(reason: impl Into<String>) -> Self {
        Error::Timetable(TimetableErrorKind::InvalidContent(reason.into()))
    }

    /// True for the errors the control cycle treats as transient (log, retry
    /// with `sleep_on_error`) as opposed to fatal ones that should propagate.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Thermometer(_) | Error::Heating(_) | Error::Script { .. }
        )
    }

    /// HTTP status code the control socket should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::JsonValue(_) => 400,
            Error::Timetable(_) => 423,
            Error::Config(_) | Error::Unknown(_) => 500,
            Error::Thermometer(_) | Error::Heating(_) | Error::Script { .. } => 500,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::NotFound => Error::timetable_not_found(e.to_string()),
            ErrorKind::PermissionDenied => Error::timetable_permission_denied(e.to_string()),
            _ => Error::Unknown(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::timetable_invalid_syntax(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
