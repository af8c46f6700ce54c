use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::metrics::POINTER_SAMPLES_TOTAL;
use crate::models::PointerSample;
use crate::utils::time::{elapsed_millis, millis_to_seconds};

#[derive(Debug, Error, PartialEq)]
pub enum PointerError {
    #[error("pointer listener is already attached")]
    AlreadyAttached,
    #[error("pointer listener is detached")]
    ListenerDetached,
}

/// Outcome of a single `record` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Appended,
    Dropped,
}

/// Session-long trace of pointer positions.
///
/// Samples are only accepted while a [`PointerListener`] is alive. The trace is
/// capped at `max_samples`; anything beyond the cap is counted and discarded.
#[derive(Debug)]
pub struct PointerTracker {
    started_at: DateTime<Utc>,
    samples: Vec<PointerSample>,
    max_samples: usize,
    dropped: usize,
    listening: Arc<AtomicBool>,
    attached_once: bool,
}

/// Scoped handle for the pointer-move listener. Dropping it detaches.
#[derive(Debug)]
pub struct PointerListener {
    listening: Arc<AtomicBool>,
}

impl Drop for PointerListener {
    fn drop(&mut self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            tracing::debug!("pointer listener detached");
        }
    }
}

impl PointerListener {
    pub fn is_attached(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

impl PointerTracker {
    pub fn new(started_at: DateTime<Utc>, max_samples: usize) -> Self {
        Self {
            started_at,
            samples: Vec::new(),
            max_samples,
            dropped: 0,
            listening: Arc::new(AtomicBool::new(false)),
            attached_once: false,
        }
    }

    /// Attaches the listener. A tracker can be attached exactly once.
    pub fn attach(&mut self) -> Result<PointerListener, PointerError> {
        if self.attached_once {
            return Err(PointerError::AlreadyAttached);
        }
        self.attached_once = true;
        self.listening.store(true, Ordering::SeqCst);
        Ok(PointerListener {
            listening: self.listening.clone(),
        })
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn record(&mut self, x: f64, y: f64, at: DateTime<Utc>) -> Result<Recorded, PointerError> {
        if !self.is_listening() {
            return Err(PointerError::ListenerDetached);
        }

        if self.samples.len() >= self.max_samples {
            if self.dropped == 0 {
                tracing::warn!(
                    max_samples = self.max_samples,
                    "pointer trace reached its cap, dropping further samples"
                );
            }
            self.dropped += 1;
            POINTER_SAMPLES_TOTAL.with_label_values(&["dropped"]).inc();
            return Ok(Recorded::Dropped);
        }

        let elapsed = millis_to_seconds(elapsed_millis(self.started_at, at));
        // Late-arriving events must not make the trace go backwards.
        let elapsed_seconds = self
            .samples
            .last()
            .map_or(elapsed, |last| elapsed.max(last.elapsed_seconds));

        self.samples.push(PointerSample {
            x,
            y,
            elapsed_seconds,
        });
        POINTER_SAMPLES_TOTAL.with_label_values(&["recorded"]).inc();
        Ok(Recorded::Appended)
    }

    pub fn samples(&self) -> &[PointerSample] {
        &self.samples
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_trace_length_matches_recorded_moves() {
        let start = Utc::now();
        let mut tracker = PointerTracker::new(start, 1_000);
        let _listener = tracker.attach().unwrap();

        assert!(tracker.samples().is_empty());

        for i in 0..25 {
            tracker
                .record(i as f64, (i * 2) as f64, start + Duration::milliseconds(i * 40))
                .unwrap();
        }

        assert_eq!(tracker.samples().len(), 25);
        assert_eq!(tracker.samples()[1].elapsed_seconds, 0.04);
        assert_eq!(tracker.samples()[24].elapsed_seconds, 0.96);
    }

    #[test]
    fn test_elapsed_is_non_decreasing() {
        let start = Utc::now();
        let mut tracker = PointerTracker::new(start, 1_000);
        let _listener = tracker.attach().unwrap();

        tracker
            .record(1.0, 1.0, start + Duration::milliseconds(500))
            .unwrap();
        tracker
            .record(2.0, 2.0, start + Duration::milliseconds(100))
            .unwrap();
        tracker
            .record(3.0, 3.0, start - Duration::milliseconds(100))
            .unwrap();

        let elapsed: Vec<f64> = tracker
            .samples()
            .iter()
            .map(|s| s.elapsed_seconds)
            .collect();
        assert_eq!(elapsed, vec![0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_listener_scope_controls_recording() {
        let start = Utc::now();
        let mut tracker = PointerTracker::new(start, 10);

        assert_eq!(
            tracker.record(0.0, 0.0, start),
            Err(PointerError::ListenerDetached)
        );

        {
            let listener = tracker.attach().unwrap();
            assert!(listener.is_attached());
            assert_eq!(tracker.record(5.0, 6.0, start), Ok(Recorded::Appended));
        }

        assert!(!tracker.is_listening());
        assert_eq!(
            tracker.record(7.0, 8.0, start),
            Err(PointerError::ListenerDetached)
        );
        assert_eq!(tracker.attach().unwrap_err(), PointerError::AlreadyAttached);
        assert_eq!(tracker.samples().len(), 1);
    }

    #[test]
    fn test_cap_drops_overflow() {
        let start = Utc::now();
        let mut tracker = PointerTracker::new(start, 2);
        let _listener = tracker.attach().unwrap();

        assert_eq!(tracker.record(0.0, 0.0, start), Ok(Recorded::Appended));
        assert_eq!(tracker.record(1.0, 1.0, start), Ok(Recorded::Appended));
        assert_eq!(tracker.record(2.0, 2.0, start), Ok(Recorded::Dropped));
        assert_eq!(tracker.record(3.0, 3.0, start), Ok(Recorded::Dropped));

        assert_eq!(tracker.samples().len(), 2);
        assert_eq!(tracker.dropped(), 2);
    }
}
