use crate::config::DetectionConfig;
use crate::types::{FacePose, HandPose, PerceptionFrame, SignalSet};

// =========================================================================
// Landmark indices
// =========================================================================
const THUMB_TIP: usize = 4;
const MIDDLE_BASE: usize = 9;
/// (tip, proximal joint) for index, middle, ring and pinky.
const FINGERS: [(usize, usize); 4] = [(8, 6), (12, 10), (16, 14), (20, 18)];

const LEFT_IRIS: usize = 468;
const LEFT_UPPER_LID: usize = 159;
const LEFT_LOWER_LID: usize = 145;
const RIGHT_IRIS: usize = 473;
const RIGHT_UPPER_LID: usize = 386;
const RIGHT_LOWER_LID: usize = 374;

/// Signals for one frame plus the raw pitch reading they were derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Extraction {
    pub signals: SignalSet,
    pub pitch: Option<f32>,
}

/// Number of non-thumb fingers whose tip sits below its proximal joint.
pub fn curled_fingers(hand: &HandPose) -> usize {
    if hand.points.len() < HandPose::LANDMARKS {
        return 0;
    }
    FINGERS
        .iter()
        .filter(|(tip, pip)| hand.points[*tip].y > hand.points[*pip].y)
        .count()
}

/// A hand holding a phone: fingers wrapped around the back, thumb pulled in
/// toward the palm and a taller-than-wide silhouette.
pub fn is_phone_grip(hand: &HandPose, config: &DetectionConfig) -> bool {
    if hand.points.len() < HandPose::LANDMARKS {
        return false;
    }

    if curled_fingers(hand) < config.curled_fingers_min {
        return false;
    }

    let thumb_gap = hand.points[THUMB_TIP].distance(&hand.points[MIDDLE_BASE]);
    if thumb_gap >= config.thumb_tuck_max_distance {
        return false;
    }

    match hand.bounds() {
        Some(b) => b.height > config.portrait_ratio * b.width,
        None => false,
    }
}

/// Head pitch in degrees from a column-major 4x4 orientation matrix.
/// Positive means the head is tilted down.
pub fn get_pitch(matrix: &[f32; 16]) -> f32 {
    matrix[6].atan2(matrix[10]).to_degrees()
}

/// Mean vertical iris position between the lids for both eyes (0 = upper lid,
/// 1 = lower lid). None without iris refinement.
pub fn iris_down_ratio(face: &FacePose, min_gap: f32) -> Option<f32> {
    if !face.has_iris() {
        return None;
    }
    let p = &face.points;
    let ratio = |iris: usize, upper: usize, lower: usize| -> f32 {
        let gap = (p[lower].y - p[upper].y).abs().max(min_gap);
        (p[iris].y - p[upper].y) / gap
    };

    let left = ratio(LEFT_IRIS, LEFT_UPPER_LID, LEFT_LOWER_LID);
    let right = ratio(RIGHT_IRIS, RIGHT_UPPER_LID, RIGHT_LOWER_LID);
    Some((left + right) / 2.0)
}

/// Reduce one frame of perception output to the fuser's input.
/// Detections are expected to be filtered to phones already.
pub fn extract_signals(frame: &PerceptionFrame, config: &DetectionConfig) -> Extraction {
    let grip = frame.hands.iter().any(|h| is_phone_grip(h, config));

    let face = frame.faces.first();
    let pitch = face.and_then(|f| f.orientation.as_ref()).map(get_pitch);
    let gaze_down = pitch.map_or(false, |p| p > config.pitch_down_deg);

    let iris_down = face
        .and_then(|f| iris_down_ratio(f, config.iris_lid_min_gap))
        .map_or(false, |r| r > config.iris_down_ratio);

    Extraction {
        signals: SignalSet {
            grip,
            gaze_down,
            iris_down,
            phone_in_frame: !frame.detections.is_empty(),
            face_visible: !frame.faces.is_empty(),
        },
        pitch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::synthetic::{face_with_iris, gripping_hand, open_hand, pitch_matrix};
    use crate::types::{Detection, Point3D, Rect};

    fn cfg() -> DetectionConfig {
        DetectionConfig::default()
    }

    #[test]
    fn grip_fixture_is_a_grip() {
        let hand = gripping_hand();
        assert_eq!(curled_fingers(&hand), 4);
        assert!(is_phone_grip(&hand, &cfg()));
    }

    #[test]
    fn three_curled_fingers_are_enough() {
        let mut hand = gripping_hand();
        hand.points[20].y = 0.45; // pinky extended
        assert_eq!(curled_fingers(&hand), 3);
        assert!(is_phone_grip(&hand, &cfg()));
    }

    #[test]
    fn two_curled_fingers_are_not_a_grip() {
        let mut hand = gripping_hand();
        hand.points[20].y = 0.45;
        hand.points[16].y = 0.45;
        assert_eq!(curled_fingers(&hand), 2);
        assert!(!is_phone_grip(&hand, &cfg()));
    }

    #[test]
    fn splayed_thumb_is_not_a_grip() {
        let mut hand = gripping_hand();
        // 0.4 away from the middle finger base but still inside the bounds
        hand.points[4] = Point3D::new(0.45, 0.55 + 0.4, 0.0);
        // Keep the silhouette portrait so only the thumb condition fails.
        assert!(hand.bounds().map(|b| b.height > 0.8 * b.width).unwrap());
        assert!(!is_phone_grip(&hand, &cfg()));
    }

    #[test]
    fn landscape_hand_is_not_a_grip() {
        let mut hand = gripping_hand();
        // Stretch to 0.6 wide while still 0.3 tall.
        hand.points[17].x = 0.2;
        hand.points[18].x = 0.8;
        assert!(curled_fingers(&hand) >= 3);
        assert!(hand.points[4].distance(&hand.points[9]) < 0.35);
        assert!(!is_phone_grip(&hand, &cfg()));
    }

    #[test]
    fn open_hand_is_not_a_grip() {
        let hand = open_hand();
        assert_eq!(curled_fingers(&hand), 0);
        assert!(!is_phone_grip(&hand, &cfg()));

        let frame = PerceptionFrame {
            hands: vec![hand],
            ..Default::default()
        };
        assert!(!extract_signals(&frame, &cfg()).signals.grip);
    }

    #[test]
    fn truncated_hand_is_ignored() {
        let mut hand = gripping_hand();
        hand.points.truncate(10);
        assert!(!is_phone_grip(&hand, &cfg()));
    }

    #[test]
    fn pitch_of_identity_is_zero() {
        let mut m = [0.0f32; 16];
        m[10] = 1.0;
        assert_eq!(get_pitch(&m), 0.0);
    }

    #[test]
    fn downward_rotation_has_positive_pitch() {
        let pitch = get_pitch(&pitch_matrix(20.0));
        assert!((pitch - 20.0).abs() < 1e-3, "pitch was {}", pitch);
        assert!(get_pitch(&pitch_matrix(-10.0)) < 0.0);
    }

    #[test]
    fn iris_ratio_needs_refined_mesh() {
        let mut face = face_with_iris(0.9);
        face.points.truncate(468);
        assert_eq!(iris_down_ratio(&face, 0.001), None);
    }

    #[test]
    fn iris_ratio_averages_both_eyes() {
        let ratio = iris_down_ratio(&face_with_iris(0.75), 0.001).unwrap();
        assert!((ratio - 0.75).abs() < 1e-3);
    }

    #[test]
    fn closed_lids_do_not_divide_by_zero() {
        let mut face = face_with_iris(0.5);
        for lower in [145, 374] {
            face.points[lower].y = 0.40;
        }
        let ratio = iris_down_ratio(&face, 0.001).unwrap();
        assert!(ratio.is_finite());
    }

    #[test]
    fn extraction_reads_every_signal() {
        let mut face = face_with_iris(0.8);
        face.orientation = Some(pitch_matrix(12.0));
        let frame = PerceptionFrame {
            hands: vec![HandPose::default(), gripping_hand()],
            faces: vec![face],
            detections: vec![Detection {
                bbox: Rect::new(0.3, 0.4, 0.2, 0.3),
                score: 0.9,
                label: "cell phone".into(),
            }],
        };
        let out = extract_signals(&frame, &cfg());
        assert_eq!(
            out.signals,
            SignalSet {
                grip: true,
                gaze_down: true,
                iris_down: true,
                phone_in_frame: true,
                face_visible: true,
            }
        );
        assert!(out.pitch.unwrap() > 11.0);
    }

    #[test]
    fn empty_frame_has_no_signals() {
        let out = extract_signals(&PerceptionFrame::default(), &cfg());
        assert_eq!(out.signals, SignalSet::default());
        assert_eq!(out.pitch, None);
    }

    #[test]
    fn face_without_matrix_has_no_pitch() {
        let frame = PerceptionFrame {
            faces: vec![face_with_iris(0.2)],
            ..Default::default()
        };
        let out = extract_signals(&frame, &cfg());
        assert!(out.signals.face_visible);
        assert!(!out.signals.gaze_down);
        assert!(!out.signals.iris_down);
        assert_eq!(out.pitch, None);
    }
}
