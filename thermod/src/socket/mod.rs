// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! The HTTP control socket (§4.5): version/status/settings/monitor/legacy
//! endpoints over the configured `host:port`. Every response carries
//! `Content-Type: application/json; charset=utf-8`; validation failures are
//! HTTP 400, timetable lock conflicts 423, everything else unexpected 500
//! (`thermod_common::Error::status_code`).

mod error;

use crate::state::SharedState;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use error::ApiError;
use futures::stream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thermod_common::status::{HvacMode, Mode, TemperatureName, ThermodStatus};
use thermod_timetable::{Program, Settings};
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<SharedState>) -> Router {
    Router::new()
        .route("/version", get(version))
        .route("/status", get(status))
        .route("/settings", get(get_settings).post(post_settings))
        .route("/monitor", get(monitor))
        .route("/heating", get(status))
        .route("/:info", get(legacy_info))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Serialize)]
struct VersionResponse {
    version: &'static str,
}

async fn version() -> impl IntoResponse {
    json_response(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn status(State(state): State<Arc<SharedState>>) -> impl IntoResponse {
    let current = state.status_rx().borrow().clone();
    json_response(current)
}

async fn get_settings(State(state): State<Arc<SharedState>>) -> impl IntoResponse {
    let settings = state.timetable.lock().await.settings().clone();
    json_response(settings)
}

/// One of the top-level keys named in §4.5: `mode`, `temperatures`,
/// `differential`, `grace_time`, `hvac_mode`, `timetable`, or the whole
/// `settings` document. Exactly one must be present.
async fn post_settings(
    State(state): State<Arc<SharedState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::validation("request body must be a JSON object"))?;
    if object.len() != 1 {
        return Err(ApiError::validation("exactly one top-level key is expected"));
    }
    let (key, value) = object.iter().next().expect("checked len == 1 above");

    let mut timetable = state.timetable.lock().await;
    match key.as_str() {
        "mode" => {
            let mode: Mode = serde_json::from_value(value.clone())
                .map_err(|e| ApiError::validation(format!("invalid mode: {}", e)))?;
            timetable.set_mode(mode);
        }
        "hvac_mode" => {
            let hvac_mode: HvacMode = serde_json::from_value(value.clone())
                .map_err(|e| ApiError::validation(format!("invalid hvac_mode: {}", e)))?;
            timetable.set_hvac_mode(hvac_mode);
        }
        "differential" => {
            let differential: f64 = serde_json::from_value(value.clone())
                .map_err(|e| ApiError::validation(format!("invalid differential: {}", e)))?;
            timetable.set_differential(differential)?;
        }
        "grace_time" => {
            let grace_time: Option<u64> = serde_json::from_value(value.clone())
                .map_err(|e| ApiError::validation(format!("invalid grace_time: {}", e)))?;
            timetable.set_grace_time(grace_time);
        }
        "temperatures" => {
            let temperatures: BTreeMap<TemperatureName, f64> = serde_json::from_value(value.clone())
                .map_err(|e| ApiError::validation(format!("invalid temperatures: {}", e)))?;
            for (name, temp) in temperatures {
                timetable.set_named_temperature(name, temp);
            }
        }
        "timetable" => {
            let program: Program = serde_json::from_value(value.clone())
                .map_err(|e| ApiError::validation(format!("invalid timetable: {}", e)))?;
            timetable.set_program(program)?;
        }
        "settings" => {
            let settings: Settings = serde_json::from_value(value.clone())
                .map_err(|e| ApiError::validation(format!("invalid settings: {}", e)))?;
            timetable.set_settings(settings)?;
        }
        other => return Err(ApiError::validation(format!("unknown settings key: {}", other))),
    }

    Ok(json_response(serde_json::json!({ "ok": true })))
}

#[derive(Deserialize)]
struct MonitorQuery {
    n: Option<usize>,
}

const MONITOR_MAX_SNAPSHOTS: usize = 1000;
const MONITOR_DEFAULT_SNAPSHOTS: usize = 5;

/// Holds the connection open and streams the next `n` status snapshots as
/// newline-delimited JSON, one per line, as they are published (§4.5).
async fn monitor(State(state): State<Arc<SharedState>>, Query(params): Query<MonitorQuery>) -> impl IntoResponse {
    let remaining = params.n.unwrap_or(MONITOR_DEFAULT_SNAPSHOTS).min(MONITOR_MAX_SNAPSHOTS);
    let rx = state.status_rx();

    let body_stream = stream::unfold((rx, remaining), |(mut rx, remaining)| async move {
        if remaining == 0 {
            return None;
        }
        if rx.changed().await.is_err() {
            return None;
        }
        let snapshot = rx.borrow().clone();
        let mut line = serde_json::to_vec(&snapshot).unwrap_or_default();
        line.push(b'\n');
        Some((Ok::<_, std::io::Error>(axum::body::Bytes::from(line)), (rx, remaining - 1)))
    });

    (
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        axum::body::Body::from_stream(body_stream),
    )
}

/// `GET /heating` (legacy) and `GET /{info}`: bag-of-info passthrough.
/// Both ultimately surface the same status snapshot; the distinction is
/// purely the legacy PHP UI's habit of naming the route after whatever
/// info it wants, not a different payload shape (§4.5/§9).
async fn legacy_info(State(state): State<Arc<SharedState>>, Path(info): Path<String>) -> impl IntoResponse {
    let current: ThermodStatus = state.status_rx().borrow().clone();
    json_response(serde_json::json!({ "info": info, "status": current }))
}

fn json_response<T: Serialize>(value: T) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json; charset=utf-8")], Json(value))
}
