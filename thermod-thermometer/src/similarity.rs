// Copyright (C) 2026 Thermod contributors
//
// This file is part of Thermod, released under the GNU General Public
// License v3.0 or later.

//! `SimilarityChecker` decorator (§4.2): rejects a reading that is too far
//! from the recent history, to filter out transient spikes. Accepted
//! readings are the only ones that ever enter the buffer; a rejection
//! leaves it untouched.

use crate::source::Thermometer;
use async_trait::async_trait;
use std::collections::VecDeque;
use thermod_common::Error;
use tokio::sync::Mutex;

pub struct SimilarityChecker {
    inner: Box<dyn Thermometer>,
    capacity: usize,
    delta: f64,
    buffer: Mutex<VecDeque<f64>>,
}

impl SimilarityChecker {
    pub fn new(inner: Box<dyn Thermometer>, capacity: usize, delta: f64) -> Self {
        assert!(capacity >= 2, "similarity checker needs a buffer of at least 2 readings");
        SimilarityChecker {
            inner,
            capacity,
            delta,
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }
}

fn median(buffer: &VecDeque<f64>) -> f64 {
    let mut sorted: Vec<f64> = buffer.iter().copied().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("temperature readings must not be NaN"));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

#[async_trait]
impl Thermometer for SimilarityChecker {
    async fn temperature(&self) -> Result<f64, Error> {
        let raw = self.inner.temperature().await?;
        let mut buffer = self.buffer.lock().await;

        // Warm-up: fewer than 2 prior readings, accept unconditionally
        // (the very first reading is always accepted).
        if buffer.len() < 2 {
            buffer.push_back(raw);
            if buffer.len() > self.capacity {
                buffer.pop_front();
            }
            return Ok(raw);
        }

        let m = median(&buffer);
        if (raw - m).abs() <= self.delta {
            buffer.push_back(raw);
            if buffer.len() > self.capacity {
                buffer.pop_front();
            }
            Ok(raw)
        } else {
            Err(Error::Thermometer(format!(
                "reading {:.3} is {:.3} away from recent median {:.3}, rejecting (delta {:.3})",
                raw,
                (raw - m).abs(),
                m,
                self.delta
            )))
        }
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::FakeSource;

    #[tokio::test]
    async fn first_reading_always_accepted() {
        let inner = Box::new(FakeSource::constant(1000.0));
        let checker = SimilarityChecker::new(inner, 4, 1.0);
        assert_eq!(checker.temperature().await.unwrap(), 1000.0);
    }

    #[tokio::test]
    async fn s5_similarity_filter() {
        let inner = Box::new(FakeSource::sequence(vec![
            Ok(19.8),
            Ok(20.0),
            Ok(20.1),
            Ok(19.9),
            Ok(30.0), // should be rejected: median of buffer is 19.95
        ]));
        let checker = SimilarityChecker::new(inner, 4, 1.0);
        for _ in 0..4 {
            checker.temperature().await.unwrap();
        }
        let err = checker.temperature().await.unwrap_err();
        assert!(matches!(err, Error::Thermometer(_)));
    }

    #[tokio::test]
    async fn accepted_reading_within_delta_of_median() {
        let inner = Box::new(FakeSource::sequence(vec![
            Ok(19.8),
            Ok(20.0),
            Ok(20.1),
            Ok(19.9),
            Ok(20.4), // within 1.0 of median 19.95
        ]));
        let checker = SimilarityChecker::new(inner, 4, 1.0);
        for _ in 0..4 {
            checker.temperature().await.unwrap();
        }
        let temp = checker.temperature().await.unwrap();
        assert!((temp - 20.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rejected_reading_does_not_alter_buffer() {
        let inner = Box::new(FakeSource::sequence(vec![
            Ok(19.8),
            Ok(20.0),
            Ok(20.1),
            Ok(19.9),
            Ok(1000.0), // rejected
            Ok(20.2),   // still compared against the original buffer
        ]));
        let checker = SimilarityChecker::new(inner, 4, 1.0);
        for _ in 0..4 {
            checker.temperature().await.unwrap();
        }
        assert!(checker.temperature().await.is_err());
        // buffer median is still ~19.95, so 20.2 should be accepted
        assert!(checker.temperature().await.is_ok());
    }
}
