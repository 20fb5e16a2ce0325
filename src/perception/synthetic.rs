//! Hand-built landmark sets for simulation and tests.

use crate::types::{Detection, FacePose, HandPose, Point3D, Rect};

/// A hand wrapped around a phone: fingers curled, thumb tucked against the
/// middle finger base, bounds 0.2 wide by 0.3 tall.
pub fn gripping_hand() -> HandPose {
    let mut points = vec![Point3D::new(0.5, 0.5, 0.0); HandPose::LANDMARKS];
    points[0] = Point3D::new(0.5, 0.8, 0.0); // wrist
    points[1] = Point3D::new(0.4, 0.7, 0.0);
    points[2] = Point3D::new(0.42, 0.65, 0.0);
    points[3] = Point3D::new(0.44, 0.62, 0.0);
    points[4] = Point3D::new(0.45, 0.6, 0.0); // thumb tip
    for (base, dip, x) in [(5, 7, 0.4), (9, 11, 0.45), (13, 15, 0.5), (17, 19, 0.6)] {
        points[base] = Point3D::new(x, 0.55, 0.0);
        points[dip] = Point3D::new(x, 0.55, 0.0);
    }
    // tip below proximal joint
    for (pip, tip, x) in [(6, 8, 0.4), (10, 12, 0.45), (14, 16, 0.5), (18, 20, 0.55)] {
        points[pip] = Point3D::new(x, 0.5, 0.0);
        points[tip] = Point3D::new(x, 0.6, 0.0);
    }
    HandPose::new(points)
}

/// An open hand: fingers extended upward, thumb out to the side.
pub fn open_hand() -> HandPose {
    let mut hand = gripping_hand();
    for (pip, tip) in [(6, 8), (10, 12), (14, 16), (18, 20)] {
        hand.points[tip].y = hand.points[pip].y - 0.1;
    }
    hand.points[4] = Point3D::new(0.1, 0.6, 0.0);
    hand
}

/// Face mesh with iris refinement; both irises sit at `ratio` between the lids
/// (0 = upper lid, 1 = lower lid).
pub fn face_with_iris(ratio: f32) -> FacePose {
    let mut points = vec![Point3D::new(0.5, 0.5, 0.0); FacePose::LANDMARKS_WITH_IRIS];
    for (iris, upper, lower) in [(468, 159, 145), (473, 386, 374)] {
        points[upper] = Point3D::new(0.4, 0.40, 0.0);
        points[lower] = Point3D::new(0.4, 0.42, 0.0);
        points[iris] = Point3D::new(0.4, 0.40 + 0.02 * ratio, 0.0);
    }
    FacePose {
        points,
        orientation: None,
    }
}

/// Rotation about the x axis by `deg`, column-major. Positive tilts the head down.
pub fn pitch_matrix(deg: f32) -> [f32; 16] {
    let (s, c) = deg.to_radians().sin_cos();
    [
        1.0, 0.0, 0.0, 0.0, //
        0.0, c, s, 0.0, //
        0.0, -s, c, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]
}

/// Face looking `pitch_deg` down with irises at `iris_ratio`.
pub fn face(pitch_deg: f32, iris_ratio: f32) -> FacePose {
    FacePose {
        orientation: Some(pitch_matrix(pitch_deg)),
        ..face_with_iris(iris_ratio)
    }
}

pub fn phone(score: f32) -> Detection {
    Detection {
        bbox: Rect::new(0.35, 0.45, 0.15, 0.3),
        score,
        label: "cell phone".to_string(),
    }
}
