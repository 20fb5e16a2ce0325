//! Seam to the hand / face / object models.
//!
//! The models themselves are opaque. The session only relies on the trait
//! below and on feeding it strictly increasing timestamps.

mod replay;
mod simulated;
pub mod synthetic;

pub use replay::ReplayPerception;
pub use simulated::{SimulatedPerception, SimulatedPhase};

use crate::types::{Detection, FacePose, Frame, HandPose};
use anyhow::Result;
use futures::future::BoxFuture;

pub trait PerceptionProvider: Send {
    fn name(&self) -> String;

    /// One-time model initialisation, awaited before the first frame.
    fn load(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Called once per processed frame before the three model calls.
    fn next_frame(&mut self) {}

    fn detect_hands(&mut self, frame: &Frame, timestamp_ms: u64) -> Result<Vec<HandPose>>;
    fn detect_faces(&mut self, frame: &Frame, timestamp_ms: u64) -> Result<Vec<FacePose>>;
    fn detect_objects(&mut self, frame: &Frame, timestamp_ms: u64) -> Result<Vec<Detection>>;

    /// Release model resources. Must tolerate repeated calls.
    fn close(&mut self);
}

/// Hands out timestamps that never repeat or go backwards, even when the
/// host clock stalls or several model calls happen in the same millisecond.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampClock {
    last: Option<u64>,
}

impl TimestampClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, now_ms: u64) -> u64 {
        let ts = match self.last {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last = Some(ts);
        ts
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }
}

/// Keep only phone detections above the confidence floor.
pub fn retain_phones(detections: Vec<Detection>, label: &str, min_score: f32) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.label.eq_ignore_ascii_case(label) && d.score >= min_score)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rect;

    #[test]
    fn clock_is_strictly_increasing() {
        let mut clock = TimestampClock::new();
        assert_eq!(clock.next(100), 100);
        assert_eq!(clock.next(100), 101);
        assert_eq!(clock.next(100), 102);
        assert_eq!(clock.next(50), 103);
        assert_eq!(clock.next(500), 500);
        assert_eq!(clock.last(), Some(500));
    }

    #[test]
    fn clock_accepts_zero_first() {
        let mut clock = TimestampClock::new();
        assert_eq!(clock.next(0), 0);
        assert_eq!(clock.next(0), 1);
    }

    #[test]
    fn only_confident_phones_survive() {
        let det = |label: &str, score: f32| Detection {
            bbox: Rect::default(),
            score,
            label: label.to_string(),
        };
        let kept = retain_phones(
            vec![det("cell phone", 0.9), det("cup", 0.99), det("cell phone", 0.2), det("Cell Phone", 0.5)],
            "cell phone",
            0.5,
        );
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|d| d.score >= 0.5));
    }
}
