use crate::types::SignalSet;
use serde::Serialize;
use std::fmt;

/// Coarse phase of a detection session, shown to the user as one line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "detail", rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Initializing,
    RequestingCamera,
    LoadingModels,
    Running,
    Stopped,
    Error(String),
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Stopped | SessionStatus::Error(_))
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Initializing => write!(f, "Initializing..."),
            SessionStatus::RequestingCamera => write!(f, "Requesting camera..."),
            SessionStatus::LoadingModels => write!(f, "Loading models..."),
            SessionStatus::Running => write!(f, "Running"),
            SessionStatus::Stopped => write!(f, "Stopped"),
            SessionStatus::Error(detail) => write!(f, "Error: {}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
}

/// Short-lived donation acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub expires_at_ms: u64,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            kind,
            message: message.into(),
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Render state published after every processed frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feedback {
    pub status: SessionStatus,
    pub signals: SignalSet,
    /// Fused verdict for the last frame, before debouncing.
    pub raw: bool,
    pub confirmed: bool,
    pub counter: u32,
    /// Successful donations this session.
    pub donation_count: u32,
    pub cooldown_secs_remaining: u64,
    /// Last head pitch in degrees, if a face with orientation was seen.
    pub pitch: Option<f32>,
    pub toast: Option<Toast>,
}

/// Whole seconds, rounded up, so the display reaches 0 only when the cooldown has.
pub fn ceil_secs(ms: u64) -> u64 {
    ms.div_ceil(1_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines() {
        assert_eq!(SessionStatus::LoadingModels.to_string(), "Loading models...");
        assert_eq!(
            SessionStatus::Error("camera permission denied".into()).to_string(),
            "Error: camera permission denied"
        );
        assert!(SessionStatus::Stopped.is_terminal());
        assert!(!SessionStatus::Running.is_terminal());
    }

    #[test]
    fn toast_expires_after_ttl() {
        let toast = Toast::new(ToastKind::Success, "Donated $1.00", 1_000, 4_000);
        assert!(!toast.is_expired(4_999));
        assert!(toast.is_expired(5_000));
    }

    #[test]
    fn seconds_round_up() {
        assert_eq!(ceil_secs(0), 0);
        assert_eq!(ceil_secs(1), 1);
        assert_eq!(ceil_secs(29_001), 30);
        assert_eq!(ceil_secs(30_000), 30);
    }

    #[test]
    fn status_serializes_with_detail() {
        let json = serde_json::to_string(&SessionStatus::Error("boom".into())).unwrap();
        assert_eq!(json, r#"{"phase":"error","detail":"boom"}"#);
    }
}
