use crate::config::DetectionConfig;
use crate::types::SignalSet;

/// Raw per-frame verdict. A phone with no face in view counts on its own
/// (the phone is covering the face); otherwise at least
/// `fusion_min_signals` of grip / gaze-down / iris-down / phone must agree.
pub fn looks_like_doomscrolling(signals: &SignalSet, config: &DetectionConfig) -> bool {
    if config.occlusion_shortcut && signals.phone_in_frame && !signals.face_visible {
        return true;
    }
    signals.votes() >= config.fusion_min_signals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fuse(s: SignalSet) -> bool {
        looks_like_doomscrolling(&s, &DetectionConfig::default())
    }

    #[test]
    fn phone_hiding_face_is_enough() {
        assert!(fuse(SignalSet {
            phone_in_frame: true,
            face_visible: false,
            ..Default::default()
        }));
    }

    #[test]
    fn phone_with_face_visible_needs_a_second_signal() {
        let alone = SignalSet {
            phone_in_frame: true,
            face_visible: true,
            ..Default::default()
        };
        assert!(!fuse(alone));
        assert!(fuse(SignalSet { iris_down: true, ..alone }));
    }

    #[test]
    fn no_single_signal_is_enough() {
        let base = SignalSet {
            face_visible: true,
            ..Default::default()
        };
        for s in [
            SignalSet { grip: true, ..base },
            SignalSet { gaze_down: true, ..base },
            SignalSet { iris_down: true, ..base },
        ] {
            assert!(!fuse(s), "{:?}", s);
        }
    }

    #[test]
    fn any_two_signals_agree() {
        assert!(fuse(SignalSet {
            grip: true,
            gaze_down: true,
            face_visible: true,
            ..Default::default()
        }));
        assert!(fuse(SignalSet {
            gaze_down: true,
            iris_down: true,
            face_visible: true,
            ..Default::default()
        }));
    }

    #[test]
    fn occlusion_shortcut_can_be_disabled() {
        let config = DetectionConfig {
            occlusion_shortcut: false,
            ..Default::default()
        };
        let s = SignalSet {
            phone_in_frame: true,
            ..Default::default()
        };
        assert!(!looks_like_doomscrolling(&s, &config));
    }
}
