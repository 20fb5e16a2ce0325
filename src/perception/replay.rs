use super::PerceptionProvider;
use crate::types::{Detection, FacePose, Frame, HandPose, PerceptionFrame};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Replays recorded provider output from a JSON-lines file, one
/// `PerceptionFrame` per line. Blank lines are skipped.
pub struct ReplayPerception {
    path: PathBuf,
    frames: Vec<PerceptionFrame>,
    cursor: Option<usize>,
    looping: bool,
}

impl ReplayPerception {
    pub fn new(path: impl Into<PathBuf>, looping: bool) -> Self {
        Self {
            path: path.into(),
            frames: Vec::new(),
            cursor: None,
            looping,
        }
    }

    pub fn parse(content: &str) -> Result<Vec<PerceptionFrame>> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str::<PerceptionFrame>(line)
                    .with_context(|| format!("Malformed recording at line {}", i + 1))
            })
            .collect()
    }

    fn current(&self) -> Option<&PerceptionFrame> {
        self.cursor.and_then(|i| self.frames.get(i))
    }
}

impl PerceptionProvider for ReplayPerception {
    fn name(&self) -> String {
        format!("Replay ({})", self.path.display())
    }

    fn load(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let content = fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read recording {}", self.path.display()))?;
            self.frames = Self::parse(&content)?;
            self.cursor = None;
            info!("Loaded {} recorded frames from {}", self.frames.len(), self.path.display());
            Ok(())
        })
    }

    fn next_frame(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        let next = self.cursor.map_or(0, |i| i + 1);
        self.cursor = if next < self.frames.len() {
            Some(next)
        } else if self.looping {
            Some(0)
        } else {
            // Past the end: every call reports nothing.
            Some(self.frames.len())
        };
    }

    fn detect_hands(&mut self, _frame: &Frame, _timestamp_ms: u64) -> Result<Vec<HandPose>> {
        Ok(self.current().map(|f| f.hands.clone()).unwrap_or_default())
    }

    fn detect_faces(&mut self, _frame: &Frame, _timestamp_ms: u64) -> Result<Vec<FacePose>> {
        Ok(self.current().map(|f| f.faces.clone()).unwrap_or_default())
    }

    fn detect_objects(&mut self, _frame: &Frame, _timestamp_ms: u64) -> Result<Vec<Detection>> {
        Ok(self.current().map(|f| f.detections.clone()).unwrap_or_default())
    }

    fn close(&mut self) {
        self.frames.clear();
        self.cursor = None;
    }
}
