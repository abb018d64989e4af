// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! `AveragingTask` decorator (§4.2): a background worker samples the
//! wrapped source every `avgint` and keeps a rolling window of `avgtime`.
//! A read discards the top/bottom `avgskip / 2` fraction of the window
//! and returns the mean of what remains. The worker restarts on error
//! with exponential backoff capped at `sleep_on_error`.

use crate::source::Thermometer;
use async_trait::async_trait;
use log::{trace, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thermod_common::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub struct AveragingTask {
    inner: Arc<dyn Thermometer>,
    avgtime: Duration,
    avgskip: f64,
    samples: Arc<Mutex<VecDeque<(Instant, f64)>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AveragingTask {
    /// `avgint`: sampling interval. `avgtime`: width of the rolling
    /// window, must be at least `2 * avgint`. `avgskip`: fraction in
    /// `[0, 1)` of the window trimmed from each tail before averaging.
    /// `sleep_on_error`: backoff ceiling after a failed sample.
    pub fn new(
        inner: Box<dyn Thermometer>,
        avgint: Duration,
        avgtime: Duration,
        avgskip: f64,
        sleep_on_error: Duration,
    ) -> Self {
        assert!(avgtime >= avgint * 2, "avgtime must cover at least two sampling intervals");
        assert!((0.0..1.0).contains(&avgskip), "avgskip must be in [0, 1)");

        let inner: Arc<dyn Thermometer> = Arc::from(inner);
        let samples = Arc::new(Mutex::new(VecDeque::new()));

        let worker = tokio::spawn(run(inner.clone(), samples.clone(), avgint, avgtime, sleep_on_error));

        AveragingTask {
            inner,
            avgtime,
            avgskip,
            samples,
            worker: Mutex::new(Some(worker)),
        }
    }
}

async fn run(
    inner: Arc<dyn Thermometer>,
    samples: Arc<Mutex<VecDeque<(Instant, f64)>>>,
    avgint: Duration,
    avgtime: Duration,
    sleep_on_error: Duration,
) {
    let mut backoff = avgint;
    loop {
        match inner.temperature().await {
            Ok(value) => {
                backoff = avgint;
                let now = Instant::now();
                let mut buf = samples.lock().await;
                buf.push_back((now, value));
                trim(&mut buf, now, avgtime);
                drop(buf);
                tokio::time::sleep(avgint).await;
            }
            Err(e) => {
                warn!("averaging task: sample failed, retrying in {:?}: {}", backoff, e);
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(sleep_on_error).max(avgint);
            }
        }
    }
}

fn trim(buf: &mut VecDeque<(Instant, f64)>, now: Instant, avgtime: Duration) {
    let cutoff = now.checked_sub(avgtime).unwrap_or(now);
    while buf.front().map_or(false, |(t, _)| *t < cutoff) {
        buf.pop_front();
    }
}

#[async_trait]
impl Thermometer for AveragingTask {
    async fn temperature(&self) -> Result<f64, Error> {
        let mut buf = self.samples.lock().await;
        trim(&mut buf, Instant::now(), self.avgtime);

        if buf.is_empty() {
            return Err(Error::Thermometer("averaging task has no samples yet".into()));
        }

        let mut values: Vec<f64> = buf.iter().map(|(_, v)| *v).collect();
        values.sort_by(|a, b| a.partial_cmp(b).expect("temperature readings must not be NaN"));

        let n = values.len();
        let skip_each_side = ((n as f64 * self.avgskip / 2.0).floor() as usize).min((n.saturating_sub(1)) / 2);
        let trimmed = &values[skip_each_side..n - skip_each_side];
        trace!("averaging task: {} samples, {} trimmed per side", n, skip_each_side);

        Ok(trimmed.iter().sum::<f64>() / trimmed.len() as f64)
    }

    async fn close(&self) {
        if let Some(handle) = self.worker.lock().await.take() {
            handle.abort();
        }
        self.inner.close().await;
    }
}
