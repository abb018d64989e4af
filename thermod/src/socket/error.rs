// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! Maps `thermod_common::Error` onto the control socket's HTTP response
//! shape (§4.5): `{error, explain}` bodies with a status code taken from
//! `Error::status_code`, always JSON.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thermod_common::Error;

pub struct ApiError(Error);

impl ApiError {
    pub fn validation(explain: impl Into<String>) -> Self {
        ApiError(Error::Validation(explain.into()))
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    explain: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: status.canonical_reason().unwrap_or("error").to_string(),
            explain: self.0.to_string(),
        };
        (status, [(header::CONTENT_TYPE, "application/json; charset=utf-8")], Json(body)).into_response()
    }
}
