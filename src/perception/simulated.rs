use super::synthetic;
use super::PerceptionProvider;
use crate::types::{Detection, FacePose, Frame, HandPose};
use anyhow::Result;
use futures::future::BoxFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedPhase {
    /// Face to camera, hands out of view.
    Attentive,
    /// Phone held low: grip, head tilted down, eyes down.
    Scrolling,
    /// Phone held up in front of the face.
    Occluded,
}

/// Provider used when no model is available. Cycles through a fixed schedule
/// of phases by frame count.
pub struct SimulatedPerception {
    schedule: Vec<(SimulatedPhase, u32)>,
    frame_count: u64,
}

impl SimulatedPerception {
    pub fn new() -> Self {
        // ~30fps: 5s attentive, 10s scrolling, 5s occluded, 10s attentive
        Self::with_schedule(vec![
            (SimulatedPhase::Attentive, 150),
            (SimulatedPhase::Scrolling, 300),
            (SimulatedPhase::Occluded, 150),
            (SimulatedPhase::Attentive, 300),
        ])
    }

    pub fn with_schedule(schedule: Vec<(SimulatedPhase, u32)>) -> Self {
        Self {
            schedule,
            frame_count: 0,
        }
    }

    /// Phase of the current frame.
    pub fn phase(&self) -> SimulatedPhase {
        let cycle: u64 = self.schedule.iter().map(|(_, n)| u64::from(*n)).sum();
        if cycle == 0 {
            return SimulatedPhase::Attentive;
        }
        let mut pos = self.frame_count.saturating_sub(1) % cycle;
        for (phase, frames) in &self.schedule {
            let frames = u64::from(*frames);
            if pos < frames {
                return *phase;
            }
            pos -= frames;
        }
        SimulatedPhase::Attentive
    }
}

impl Default for SimulatedPerception {
    fn default() -> Self {
        Self::new()
    }
}

impl PerceptionProvider for SimulatedPerception {
    fn name(&self) -> String {
        "Simulated (no model)".to_string()
    }

    fn load(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn next_frame(&mut self) {
        self.frame_count += 1;
    }

    fn detect_hands(&mut self, _frame: &Frame, _timestamp_ms: u64) -> Result<Vec<HandPose>> {
        Ok(match self.phase() {
            SimulatedPhase::Attentive => Vec::new(),
            SimulatedPhase::Scrolling | SimulatedPhase::Occluded => vec![synthetic::gripping_hand()],
        })
    }

    fn detect_faces(&mut self, _frame: &Frame, _timestamp_ms: u64) -> Result<Vec<FacePose>> {
        // Small wobble so the pitch readout is not frozen.
        let t = self.frame_count as f32 * 0.05;
        Ok(match self.phase() {
            SimulatedPhase::Attentive => vec![synthetic::face(-2.0 + t.sin() * 2.0, 0.35)],
            SimulatedPhase::Scrolling => vec![synthetic::face(18.0 + t.sin() * 3.0, 0.7)],
            SimulatedPhase::Occluded => Vec::new(),
        })
    }

    fn detect_objects(&mut self, _frame: &Frame, _timestamp_ms: u64) -> Result<Vec<Detection>> {
        Ok(match self.phase() {
            SimulatedPhase::Attentive => Vec::new(),
            SimulatedPhase::Scrolling => vec![synthetic::phone(0.62)],
            SimulatedPhase::Occluded => vec![synthetic::phone(0.91)],
        })
    }

    fn close(&mut self) {
        self.frame_count = 0;
    }
}
