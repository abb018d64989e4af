// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! `Fake` thermometer source (§4.2): stubs for testing the rest of the
//! pipeline and the control cycle without real hardware.

use crate::source::Thermometer;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use thermod_common::Error;

/// Replays a fixed sequence of readings, looping the last entry once
/// exhausted. An `Err` entry is returned verbatim (cloned as a generic
/// `ThermometerError` with the same message) to simulate sensor faults.
pub struct FakeSource {
    sequence: Vec<Result<f64, String>>,
    index: AtomicUsize,
    calls: Mutex<usize>,
}

impl FakeSource {
    pub fn constant(value: f64) -> Self {
        FakeSource {
            sequence: vec![Ok(value)],
            index: AtomicUsize::new(0),
            calls: Mutex::new(0),
        }
    }

    pub fn sequence(sequence: Vec<Result<f64, String>>) -> Self {
        assert!(!sequence.is_empty(), "FakeSource sequence must not be empty");
        FakeSource {
            sequence,
            index: AtomicUsize::new(0),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().expect("fake source mutex poisoned")
    }
}

#[async_trait]
impl Thermometer for FakeSource {
    async fn temperature(&self) -> Result<f64, Error> {
        *self.calls.lock().expect("fake source mutex poisoned") += 1;
        let idx = self.index.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| {
            Some((i + 1).min(self.sequence.len() - 1))
        });
        let idx = idx.unwrap_or(0).min(self.sequence.len() - 1);
        match &self.sequence[idx] {
            Ok(v) => Ok(*v),
            Err(e) => Err(Error::Thermometer(e.clone())),
        }
    }

    async fn close(&self) {}
}
