use image::{ImageBuffer, Rgb};
use serde::{Deserialize, Serialize};

/// A single captured video frame.
pub type Frame = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Represents a single 3D landmark in frame-normalized coordinates.
/// `x`/`y` are 0..1 with `y` growing downward, `z` is relative depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Point3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Point3D) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }
}

/// 21 hand landmarks in the usual anatomical order (0 = wrist, 4 = thumb tip,
/// 5/9/13/17 = finger bases, 8/12/16/20 = finger tips).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandPose {
    #[serde(alias = "landmarks")]
    pub points: Vec<Point3D>,
}

impl HandPose {
    pub const LANDMARKS: usize = 21;

    pub fn new(points: Vec<Point3D>) -> Self {
        Self { points }
    }

    /// Axis-aligned bounds of all landmarks, or None for an empty hand.
    pub fn bounds(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// Face mesh (478 points with iris refinement, 468 without) plus an optional
/// column-major 4x4 head orientation matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacePose {
    #[serde(alias = "landmarks")]
    pub points: Vec<Point3D>,
    #[serde(default)]
    pub orientation: Option<[f32; 16]>,
}

impl FacePose {
    pub const LANDMARKS_WITH_IRIS: usize = 478;

    pub fn has_iris(&self) -> bool {
        self.points.len() >= Self::LANDMARKS_WITH_IRIS
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Labeled object detection from the object model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: Rect,
    pub score: f32,
    pub label: String,
}

/// Everything the perception models reported for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerceptionFrame {
    #[serde(default)]
    pub hands: Vec<HandPose>,
    #[serde(default)]
    pub faces: Vec<FacePose>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// Per-frame booleans derived from a `PerceptionFrame`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSet {
    pub grip: bool,
    pub gaze_down: bool,
    pub iris_down: bool,
    pub phone_in_frame: bool,
    pub face_visible: bool,
}

impl SignalSet {
    /// Number of the four voting signals that are set. Face visibility does not vote.
    pub fn votes(&self) -> usize {
        [self.grip, self.gaze_down, self.iris_down, self.phone_in_frame]
            .iter()
            .filter(|v| **v)
            .count()
    }
}
